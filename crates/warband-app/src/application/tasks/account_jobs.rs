use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::game_task::{GameTask, TaskContext};
use crate::application::config::Settings;
use crate::application::services::TaskScheduler;
use warband_domain::account::AccountRepository;
use warband_domain::collaborator::{ActionName, ActionParams, Collaborator, Outcome, PageData};
use warband_domain::task::Trigger;
use warband_domain::{AccountId, DomainError, TaskKey, TaskKind};

/// Registers each account's recurring jobs.
pub struct AccountJobs {
    scheduler: TaskScheduler,
    accounts: Arc<dyn AccountRepository>,
    settings: Arc<Settings>,
}

impl AccountJobs {
    pub fn new(
        scheduler: TaskScheduler,
        accounts: Arc<dyn AccountRepository>,
        settings: Arc<Settings>,
    ) -> Self {
        Self {
            scheduler,
            accounts,
            settings,
        }
    }

    /// Check gold-club membership once, then register every recurring kind
    /// the account qualifies for, staggered by kind. Returns how many jobs
    /// were registered.
    #[instrument(skip(self, account_id, session), fields(account = %account_id))]
    pub async fn schedule(
        &self,
        account_id: &AccountId,
        session: Arc<dyn Collaborator>,
    ) -> Result<usize, DomainError> {
        let mut account = self
            .accounts
            .find_by_id(account_id)
            .await?
            .ok_or_else(|| DomainError::AccountNotFound(account_id.to_string()))?;

        let outcome = session
            .perform(&account, ActionName::CheckGoldClub, &ActionParams::default())
            .await;
        let gold_club = match &outcome {
            Outcome::Success {
                data: PageData::GoldClub { active },
                ..
            } => *active,
            other => {
                warn!("Gold club check inconclusive: {}", other.message());
                false
            }
        };
        if !gold_club {
            let log = self.scheduler.task_log();
            let message = outcome.message();
            log.record(&TaskKey::new(account_id.clone(), TaskKind::GoldClubCheck), message);
            log.record(&TaskKey::new(account_id.clone(), TaskKind::RaidSend), message);
        }

        account.record_gold_club(gold_club);
        self.accounts.save(&account).await?;

        let ctx = TaskContext {
            session,
            accounts: Arc::clone(&self.accounts),
            settings: Arc::clone(&self.settings),
        };

        let mut scheduled_count = 0;
        for kind in account.recurring_kinds() {
            let Some(range) = self.settings.jitter_for(kind) else {
                continue;
            };
            let key = TaskKey::new(account_id.clone(), kind);
            let action = Arc::new(GameTask::new(key.clone(), ctx.clone()));
            self.scheduler
                .register_after(key, Trigger::Interval(range), action, kind.initial_delay())
                .await?;
            scheduled_count += 1;
        }

        info!(
            gold_club,
            "✅ Scheduled {} jobs for {}", scheduled_count, account_id
        );
        Ok(scheduled_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::{SchedulerConfig, TaskLog};
    use warband_domain::account::{Account, AccountType, FeatureToggles};
    use warband_infrastructure::persistence::repositories::InMemoryAccountRepository;
    use warband_infrastructure::session::DryRunCollaborator;

    fn repo() -> Arc<InMemoryAccountRepository> {
        let account = Account::new(
            "alice",
            AccountType::Enforcer,
            "Barracks".to_string(),
            "Clubswinger".to_string(),
            FeatureToggles {
                upgrade_fields: true,
                train_troops: true,
                raid: true,
            },
        )
        .unwrap();
        Arc::new(InMemoryAccountRepository::seeded(vec![account]))
    }

    #[tokio::test(start_paused = true)]
    async fn test_without_gold_club_raids_wait_for_membership() {
        let scheduler = TaskScheduler::new(SchedulerConfig::default(), Arc::new(TaskLog::new()));
        let jobs = AccountJobs::new(scheduler.clone(), repo(), Arc::new(Settings::default()));
        let alice = AccountId::from_string("alice");

        let count = jobs
            .schedule(&alice, Arc::new(DryRunCollaborator::new("alice", false)))
            .await
            .unwrap();

        let keys: Vec<String> = scheduler
            .list()
            .await
            .iter()
            .map(|s| s.key.to_string())
            .collect();
        assert_eq!(count, keys.len());
        assert!(keys.contains(&"alice_gold_club_check".to_string()));
        assert!(keys.contains(&"alice_train_troops".to_string()));
        assert!(!keys.contains(&"alice_raids".to_string()));

        let raid_note = scheduler
            .task_log()
            .latest(&TaskKey::new(alice, TaskKind::RaidSend))
            .unwrap();
        assert!(raid_note.message.contains("Gold Club"));
        scheduler.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_gold_club_raids_start_immediately() {
        let scheduler = TaskScheduler::new(SchedulerConfig::default(), Arc::new(TaskLog::new()));
        let jobs = AccountJobs::new(scheduler.clone(), repo(), Arc::new(Settings::default()));
        let alice = AccountId::from_string("alice");

        jobs.schedule(&alice, Arc::new(DryRunCollaborator::new("alice", true)))
            .await
            .unwrap();

        let raids = scheduler
            .get(&TaskKey::new(alice.clone(), TaskKind::RaidSend))
            .await
            .unwrap();
        let refresh = scheduler
            .get(&TaskKey::new(alice.clone(), TaskKind::PageRefresh))
            .await
            .unwrap();
        assert!(raids.next_fire_at.unwrap() < refresh.next_fire_at.unwrap());
        assert!(scheduler
            .get(&TaskKey::new(alice, TaskKind::GoldClubCheck))
            .await
            .is_none());
        scheduler.shutdown().await;
    }

    #[tokio::test]
    async fn test_unknown_account_rejected() {
        let scheduler = TaskScheduler::new(SchedulerConfig::default(), Arc::new(TaskLog::new()));
        let jobs = AccountJobs::new(scheduler, repo(), Arc::new(Settings::default()));

        let result = jobs
            .schedule(
                &AccountId::from_string("mallory"),
                Arc::new(DryRunCollaborator::new("mallory", false)),
            )
            .await;
        assert!(matches!(result, Err(DomainError::AccountNotFound(_))));
    }
}
