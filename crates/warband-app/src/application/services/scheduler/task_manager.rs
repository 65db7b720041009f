use chrono::{DateTime, Utc};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use super::action::TaskAction;
use super::types::{EntryState, TaskSnapshot, TaskState};
use warband_domain::task::Trigger;
use warband_domain::{DomainError, TaskKey};

impl super::TaskScheduler {
    /// Register `key`, replacing any existing entry. The first firing is
    /// drawn from the trigger.
    pub async fn register(
        &self,
        key: TaskKey,
        trigger: Trigger,
        action: Arc<dyn TaskAction>,
    ) -> Result<(), DomainError> {
        self.insert(key, trigger, action, None, true).await.map(|_| ())
    }

    /// Like [`register`](Self::register), but the first firing happens after
    /// `first_delay` instead of a draw from the trigger.
    pub async fn register_after(
        &self,
        key: TaskKey,
        trigger: Trigger,
        action: Arc<dyn TaskAction>,
        first_delay: Duration,
    ) -> Result<(), DomainError> {
        self.insert(key, trigger, action, Some(first_delay), true)
            .await
            .map(|_| ())
    }

    /// One firing at `at`; instants in the past fire immediately.
    pub async fn register_once(
        &self,
        key: TaskKey,
        at: DateTime<Utc>,
        action: Arc<dyn TaskAction>,
    ) -> Result<(), DomainError> {
        self.insert(key, Trigger::At(at), action, None, true)
            .await
            .map(|_| ())
    }

    /// Register only when `key` has no entry yet. Returns whether it did.
    pub async fn register_if_absent(
        &self,
        key: TaskKey,
        trigger: Trigger,
        action: Arc<dyn TaskAction>,
    ) -> Result<bool, DomainError> {
        self.insert(key, trigger, action, None, false).await
    }

    #[instrument(skip(self, trigger, action, first_delay), fields(task = %key))]
    async fn insert(
        &self,
        key: TaskKey,
        trigger: Trigger,
        action: Arc<dyn TaskAction>,
        first_delay: Option<Duration>,
        replace: bool,
    ) -> Result<bool, DomainError> {
        self.ensure_accepting()?;

        let mut entries = self.inner.entries.lock().await;
        if !replace && entries.contains_key(&key) {
            debug!("Already registered; keeping existing entry");
            return Ok(false);
        }

        self.inner
            .install(&mut entries, key.clone(), trigger, action, first_delay);
        info!("➕ Task registered: {}", key);
        Ok(true)
    }

    /// Remove `key`'s entry. A firing already in progress finishes, but its
    /// plan is discarded. Returns whether an entry existed.
    pub async fn cancel(&self, key: &TaskKey) -> bool {
        let mut entries = self.inner.entries.lock().await;
        match entries.remove(key) {
            Some(mut entry) => {
                entry.disarm();
                info!("⏹️  Task cancelled: {}", key);
                true
            }
            None => false,
        }
    }

    /// Stop `key` from firing until [`resume`](Self::resume). A firing in
    /// progress completes and the entry pauses afterwards.
    pub async fn pause(&self, key: &TaskKey) -> Result<(), DomainError> {
        let mut entries = self.inner.entries.lock().await;
        let entry = entries
            .get_mut(key)
            .ok_or_else(|| DomainError::TaskNotFound(key.to_string()))?;

        if let EntryState::Running { pause_requested } = &mut entry.state {
            *pause_requested = true;
            return Ok(());
        }

        match entry.state.public() {
            TaskState::Scheduled => {
                entry.disarm();
                entry.state = EntryState::Paused;
                info!("⏸️  Task paused: {}", key);
                Ok(())
            }
            TaskState::Paused | TaskState::Running => Ok(()),
            TaskState::Dormant => Err(DomainError::Validation(format!(
                "{key} is dormant and cannot be paused"
            ))),
        }
    }

    /// Re-arm a paused entry from its trigger.
    pub async fn resume(&self, key: &TaskKey) -> Result<(), DomainError> {
        self.ensure_accepting()?;

        let mut entries = self.inner.entries.lock().await;
        let entry = entries
            .get_mut(key)
            .ok_or_else(|| DomainError::TaskNotFound(key.to_string()))?;

        if let EntryState::Running { pause_requested } = &mut entry.state {
            *pause_requested = false;
            return Ok(());
        }

        match entry.state.public() {
            TaskState::Paused => {
                self.inner.arm(key, entry, None);
                info!("▶️  Task resumed: {}", key);
                Ok(())
            }
            TaskState::Scheduled | TaskState::Running => Ok(()),
            TaskState::Dormant => Err(DomainError::Validation(format!(
                "{key} is dormant; register it again to revive it"
            ))),
        }
    }

    pub async fn get(&self, key: &TaskKey) -> Option<TaskSnapshot> {
        let entries = self.inner.entries.lock().await;
        entries.get(key).map(|entry| entry.snapshot(key))
    }

    /// Snapshot of every entry, ordered by key. Each call takes a fresh
    /// snapshot, so iterating never blocks firings.
    pub async fn list(&self) -> Vec<TaskSnapshot> {
        let entries = self.inner.entries.lock().await;
        let mut snapshots: Vec<TaskSnapshot> = entries
            .iter()
            .map(|(key, entry)| entry.snapshot(key))
            .collect();
        drop(entries);

        snapshots.sort_by(|a, b| a.key.cmp(&b.key));
        snapshots
    }

    /// Entries that are armed or firing.
    pub async fn active_task_count(&self) -> usize {
        let entries = self.inner.entries.lock().await;
        entries
            .values()
            .filter(|entry| {
                matches!(
                    entry.state,
                    EntryState::Scheduled { .. } | EntryState::Running { .. }
                )
            })
            .count()
    }

    pub fn is_accepting(&self) -> bool {
        self.inner.accepting.load(Ordering::SeqCst)
    }

    fn ensure_accepting(&self) -> Result<(), DomainError> {
        if self.is_accepting() {
            Ok(())
        } else {
            Err(DomainError::SchedulerStopped(
                "scheduler is shutting down".to_string(),
            ))
        }
    }

    /// Stop accepting work, disarm every sleeping timer and give firings in
    /// progress up to the grace period before aborting them. Idempotent.
    pub async fn shutdown(&self) {
        if !self.inner.accepting.swap(false, Ordering::SeqCst) {
            debug!("Scheduler already shut down");
            return;
        }

        info!("🛑 Shutting down task scheduler");

        let mut health_check = self.inner.health_check_handle.lock().await;
        if let Some(handle) = health_check.take() {
            handle.abort();
            info!("🛑 Health check task stopped");
        }
        drop(health_check);

        let running = {
            let mut entries = self.inner.entries.lock().await;
            info!("🛑 Stopping {} scheduled tasks...", entries.len());
            let mut running = 0;
            for entry in entries.values_mut() {
                match entry.state {
                    EntryState::Scheduled { .. } => {
                        entry.disarm();
                        entry.state = EntryState::Dormant;
                    }
                    EntryState::Running { .. } => running += 1,
                    EntryState::Dormant | EntryState::Paused => {}
                }
            }
            running
        };

        if running > 0 {
            info!(
                "Waiting up to {:?} for {} firing(s) in progress",
                self.inner.config.shutdown_grace, running
            );
        }

        let mut in_flight = self.inner.in_flight.subscribe();
        let drained = tokio::time::timeout(
            self.inner.config.shutdown_grace,
            in_flight.wait_for(|count| *count == 0),
        )
        .await
        .is_ok();

        if !drained {
            let mut entries = self.inner.entries.lock().await;
            for (key, entry) in entries.iter_mut() {
                if matches!(entry.state, EntryState::Running { .. }) {
                    warn!(
                        "⚠️  Aborting firing still running after grace period: {}",
                        key
                    );
                    if let Some(handle) = entry.handle.take() {
                        handle.abort();
                    }
                    entry.state = EntryState::Dormant;
                }
            }
        }

        info!("✅ Task scheduler stopped");
    }
}
