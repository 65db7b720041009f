#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::mock;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use warband_app::application::config::Settings;
use warband_app::application::services::{
    Next, Plan, SchedulerConfig, Settlement, TaskAction, TaskLog, TaskScheduler,
};
use warband_app::application::tasks::TaskContext;
use warband_domain::account::{Account, AccountRepository, AccountType, FeatureToggles};
use warband_domain::collaborator::{ActionName, ActionParams, Collaborator, Outcome};
use warband_domain::{AccountId, TaskKey, TaskKind};
use warband_infrastructure::persistence::repositories::InMemoryAccountRepository;

mock! {
    pub Session {}

    #[async_trait]
    impl Collaborator for Session {
        async fn perform(
            &self,
            account: &Account,
            action: ActionName,
            params: &ActionParams,
        ) -> Outcome;

        async fn release(&self);
    }
}

pub fn key(account: &str, kind: TaskKind) -> TaskKey {
    TaskKey::new(AccountId::from_string(account), kind)
}

pub fn scheduler() -> TaskScheduler {
    scheduler_with(SchedulerConfig::default())
}

pub fn scheduler_with(config: SchedulerConfig) -> TaskScheduler {
    TaskScheduler::new(config, Arc::new(TaskLog::new()))
}

pub fn latest_log(scheduler: &TaskScheduler, key: &TaskKey) -> Option<String> {
    scheduler.task_log().latest(key).map(|entry| entry.message)
}

pub fn account(name: &str, features: FeatureToggles) -> Account {
    Account::new(
        name,
        AccountType::Enforcer,
        "Barracks".to_string(),
        "Clubswinger".to_string(),
        features,
    )
    .unwrap()
}

pub fn context(session: MockSession, accounts: Vec<Account>, settings: Settings) -> TaskContext {
    TaskContext {
        session: Arc::new(session),
        accounts: Arc::new(InMemoryAccountRepository::seeded(accounts))
            as Arc<dyn AccountRepository>,
        settings: Arc::new(settings),
    }
}

/// Counts attempts and answers with a configurable outcome.
pub struct ScriptedAction {
    pub attempts: Arc<AtomicUsize>,
    pub completed: Arc<AtomicUsize>,
    pub work: Duration,
    pub outcome: fn(usize) -> Outcome,
    pub next: Next,
    pub panics: bool,
}

impl ScriptedAction {
    pub fn succeeding() -> Self {
        Self {
            attempts: Arc::new(AtomicUsize::new(0)),
            completed: Arc::new(AtomicUsize::new(0)),
            work: Duration::ZERO,
            outcome: |n| Outcome::success(format!("fired {n}")),
            next: Next::Repeat,
            panics: false,
        }
    }

    pub fn taking(mut self, work: Duration) -> Self {
        self.work = work;
        self
    }

    pub fn answering(mut self, outcome: fn(usize) -> Outcome) -> Self {
        self.outcome = outcome;
        self
    }

    pub fn then(mut self, next: Next) -> Self {
        self.next = next;
        self
    }

    pub fn panicking(mut self) -> Self {
        self.panics = true;
        self
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TaskAction for ScriptedAction {
    async fn attempt(&self) -> Outcome {
        let n = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if !self.work.is_zero() {
            tokio::time::sleep(self.work).await;
        }
        if self.panics {
            panic!("boom");
        }
        self.completed.fetch_add(1, Ordering::SeqCst);
        (self.outcome)(n)
    }

    async fn settle(&self, outcome: Outcome, _now: DateTime<Utc>) -> Settlement {
        let next = if outcome.is_fatal() { Next::Dormant } else { self.next };
        Settlement::new(outcome.message(), Plan::with_next(next))
    }
}

/// Let spawned timer tasks run without advancing the paused clock much.
pub async fn settle_tasks() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}
