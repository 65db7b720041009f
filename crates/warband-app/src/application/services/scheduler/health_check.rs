use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::types::EntryState;
use super::SchedulerInner;
use warband_domain::task::Trigger;

impl super::TaskScheduler {
    /// Start health check background task to monitor armed timers
    pub(super) async fn start_health_check_task(&self) {
        let inner = Arc::downgrade(&self.inner);
        let period = self.inner.config.health_check_interval;

        let handle = tokio::spawn(async move {
            let mut check_interval = tokio::time::interval(period);
            // The first tick completes immediately
            check_interval.tick().await;

            loop {
                check_interval.tick().await;
                let Some(inner) = inner.upgrade() else {
                    break;
                };
                inner.check_health().await;
            }
        });

        let mut health_check = self.inner.health_check_handle.lock().await;
        *health_check = Some(handle);

        info!(
            "✅ Health check task started (checking every {} seconds)",
            period.as_secs()
        );
    }
}

impl SchedulerInner {
    /// Mark entries whose timer died as dormant and warn about recurring
    /// entries that stopped firing. Returns how many dead timers were found.
    pub(super) async fn check_health(&self) -> usize {
        let now = Utc::now();
        let mut entries = self.entries.lock().await;
        let mut dead = 0;

        for (key, entry) in entries.iter_mut() {
            let EntryState::Scheduled { .. } = entry.state else {
                continue;
            };

            let finished = entry
                .handle
                .as_ref()
                .map_or(true, |handle| handle.is_finished());
            if finished {
                error!(
                    "🔴 Health Check: Timer for {} has terminated unexpectedly; marking dormant",
                    key
                );
                entry.state = EntryState::Dormant;
                entry.handle = None;
                dead += 1;
                continue;
            }

            if let (Trigger::Interval(range), Some(last)) = (entry.trigger, entry.last_fired_at) {
                let expected = range.max_duration() * 2 + self.config.firing_timeout;
                let elapsed = now - last;
                if elapsed.to_std().map_or(false, |elapsed| elapsed > expected) {
                    warn!(
                        "⚠️  Health Check: {} hasn't fired in {} minutes",
                        key,
                        elapsed.num_minutes()
                    );
                }
            }
        }

        dead
    }
}

#[cfg(test)]
mod tests {
    use super::super::{Plan, Settlement, TaskAction};
    use super::*;
    use crate::application::services::{SchedulerConfig, TaskLog, TaskScheduler, TaskState};
    use async_trait::async_trait;
    use chrono::DateTime;
    use warband_domain::collaborator::Outcome;
    use warband_domain::task::JitterRange;
    use warband_domain::{AccountId, TaskKey, TaskKind};

    struct Idle;

    #[async_trait]
    impl TaskAction for Idle {
        async fn attempt(&self) -> Outcome {
            Outcome::success("idle")
        }

        async fn settle(&self, outcome: Outcome, _now: DateTime<Utc>) -> Settlement {
            Settlement::new(outcome.message(), Plan::repeat())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_dead_timer_marked_dormant() {
        let scheduler = TaskScheduler::new(SchedulerConfig::default(), Arc::new(TaskLog::new()));
        let key = TaskKey::new(AccountId::from_string("alice"), TaskKind::Adventure);
        scheduler
            .register(
                key.clone(),
                Trigger::Interval(JitterRange::fixed(600.0)),
                Arc::new(Idle),
            )
            .await
            .unwrap();

        assert_eq!(scheduler.inner.check_health().await, 0);

        {
            let entries = scheduler.inner.entries.lock().await;
            if let Some(handle) = entries.get(&key).and_then(|entry| entry.handle.as_ref()) {
                handle.abort();
            }
        }
        tokio::time::sleep(std::time::Duration::from_millis(1)).await;

        assert_eq!(scheduler.inner.check_health().await, 1);
        assert_eq!(scheduler.get(&key).await.unwrap().state, TaskState::Dormant);
    }
}
