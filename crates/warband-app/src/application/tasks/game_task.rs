use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::application::config::Settings;
use crate::application::services::{FollowUp, Next, Plan, Settlement, TaskAction};
use warband_domain::account::AccountRepository;
use warband_domain::collaborator::{ActionParams, Collaborator, Outcome, PageData};
use warband_domain::escalation::{assess, mitigation_deadline, Assessment, ThreatScan};
use warband_domain::task::{FailurePolicy, Trigger};
use warband_domain::{DomainError, TaskKey, TaskKind};

/// Everything a game task needs besides its key.
#[derive(Clone)]
pub struct TaskContext {
    pub session: Arc<dyn Collaborator>,
    pub accounts: Arc<dyn AccountRepository>,
    pub settings: Arc<Settings>,
}

/// One account's game action, plus the rules for what its outcome means
/// for the schedule.
pub struct GameTask {
    key: TaskKey,
    ctx: TaskContext,
}

impl GameTask {
    pub fn new(key: TaskKey, ctx: TaskContext) -> Self {
        Self { key, ctx }
    }

    pub fn key(&self) -> &TaskKey {
        &self.key
    }

    fn sibling(&self, kind: TaskKind) -> (TaskKey, Arc<dyn TaskAction>) {
        let key = self.key.sibling(kind);
        let action: Arc<dyn TaskAction> = Arc::new(GameTask::new(key.clone(), self.ctx.clone()));
        (key, action)
    }

    fn settle_fatal(&self, reason: String) -> Settlement {
        let next = match self.key.kind().failure_policy() {
            FailurePolicy::Dormant => Next::Dormant,
            FailurePolicy::Pause => Next::Pause,
        };
        Settlement::new(reason, Plan::with_next(next))
    }

    fn settle_attack_check(&self, scan: &ThreatScan, now: DateTime<Utc>) -> Settlement {
        let assessment = assess(scan);
        let mut plan = Plan::repeat();

        if let Assessment::Incoming { time_to_impact } = assessment {
            let at = mitigation_deadline(now, time_to_impact, self.ctx.settings.mitigation_margin);
            let (key, action) = self.sibling(TaskKind::AttackMitigation);
            warn!(
                task = %self.key,
                time_to_impact_secs = time_to_impact.as_secs(),
                mitigation_at = %at.format("%Y-%m-%d %H:%M:%S"),
                "Incoming attack detected"
            );
            plan = plan.and(FollowUp::Once { key, at, action });
        }

        Settlement::new(assessment.describe(), plan)
    }

    async fn settle_gold_club(&self, message: String, active: bool) -> Settlement {
        let wants_raids = match self.record_gold_club(active).await {
            Ok(wants_raids) => wants_raids,
            Err(e) => return Settlement::new(e.to_string(), Plan::repeat()),
        };

        if !active {
            let raids = self.key.sibling(TaskKind::RaidSend);
            return Settlement::new(
                message.clone(),
                Plan::repeat().and(FollowUp::Note { key: raids, message }),
            );
        }

        let mut plan = Plan::dormant().and(FollowUp::Cancel {
            key: self.key.clone(),
        });
        if wants_raids {
            if let Some(range) = self.ctx.settings.jitter_for(TaskKind::RaidSend) {
                let (key, action) = self.sibling(TaskKind::RaidSend);
                plan = plan.and(FollowUp::Start {
                    key,
                    trigger: Trigger::Interval(range),
                    first_delay: Some(TaskKind::RaidSend.initial_delay()),
                    action,
                });
            }
        }

        Settlement::new(message, plan)
    }

    /// Persist membership; returns whether the account wants raids.
    async fn record_gold_club(&self, active: bool) -> Result<bool, DomainError> {
        let mut account = self
            .ctx
            .accounts
            .find_by_id(self.key.account())
            .await?
            .ok_or_else(|| DomainError::AccountNotFound(self.key.account().to_string()))?;

        account.record_gold_club(active);
        self.ctx.accounts.save(&account).await?;
        Ok(account.wants_raids())
    }
}

#[async_trait]
impl TaskAction for GameTask {
    async fn attempt(&self) -> Outcome {
        let kind = self.key.kind();
        let account = match self.ctx.accounts.find_by_id(self.key.account()).await {
            Ok(Some(account)) => account,
            Ok(None) => {
                return Outcome::from_error(&DomainError::AccountNotFound(
                    self.key.account().to_string(),
                ))
            }
            Err(e) => return Outcome::from_error(&e),
        };

        let params = ActionParams::for_task(kind, &account);
        debug!(task = %self.key, action = %kind.action(), "Performing action");
        self.ctx.session.perform(&account, kind.action(), &params).await
    }

    async fn settle(&self, outcome: Outcome, now: DateTime<Utc>) -> Settlement {
        let kind = self.key.kind();

        // One-shot: whatever happened, it does not fire again on its own.
        if kind == TaskKind::AttackMitigation {
            return Settlement::new(outcome.message(), Plan::dormant());
        }

        match outcome {
            Outcome::Fatal { reason } => self.settle_fatal(reason),
            Outcome::Transient { reason } => Settlement::new(reason, Plan::repeat()),
            Outcome::Success { message, data } => match (kind, data) {
                (TaskKind::AttackCheck, PageData::Movements(scan)) => {
                    self.settle_attack_check(&scan, now)
                }
                (TaskKind::GoldClubCheck, PageData::GoldClub { active }) => {
                    self.settle_gold_club(message, active).await
                }
                (TaskKind::TroopTraining, PageData::Insufficient) => {
                    let next = kind
                        .starved_range()
                        .map(Next::RepeatWithin)
                        .unwrap_or(Next::Repeat);
                    Settlement::new(message, Plan::with_next(next))
                }
                _ => Settlement::new(message, Plan::repeat()),
            },
        }
    }
}
