use chrono::{DateTime, Utc};
use futures::FutureExt;
use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::Ordering;
use std::sync::{Arc, PoisonError};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use super::action::{FollowUp, Next, Plan, Settlement, TaskAction};
use super::types::{EntryState, FiringGuard, TaskEntry};
use super::SchedulerInner;
use warband_domain::collaborator::Outcome;
use warband_domain::task::Trigger;
use warband_domain::{RunId, TaskKey};

#[derive(Clone, Copy)]
enum OutcomeClass {
    Success,
    Transient,
    Fatal,
}

impl OutcomeClass {
    fn of(outcome: &Outcome) -> Self {
        if outcome.is_fatal() {
            OutcomeClass::Fatal
        } else if outcome.is_transient() {
            OutcomeClass::Transient
        } else {
            OutcomeClass::Success
        }
    }
}

impl SchedulerInner {
    /// Put a fresh entry under `key`, disarming whatever was there.
    /// Caller holds the entries lock.
    pub(super) fn install(
        self: &Arc<Self>,
        entries: &mut HashMap<TaskKey, TaskEntry>,
        key: TaskKey,
        trigger: Trigger,
        action: Arc<dyn TaskAction>,
        first_delay: Option<Duration>,
    ) {
        let mut last_fired_at = None;
        if let Some(mut old) = entries.remove(&key) {
            debug!(task = %key, "Replacing existing entry");
            old.disarm();
            last_fired_at = old.last_fired_at;
        }

        let mut entry = TaskEntry {
            trigger,
            action,
            state: EntryState::Dormant,
            run_id: RunId::new(),
            handle: None,
            last_fired_at,
        };
        self.arm(&key, &mut entry, first_delay);
        entries.insert(key, entry);
    }

    /// Arm a new timer for `entry`. Without an explicit delay the next
    /// instant comes from the entry's trigger. Caller holds the entries lock.
    pub(super) fn arm(
        self: &Arc<Self>,
        key: &TaskKey,
        entry: &mut TaskEntry,
        delay: Option<Duration>,
    ) {
        let now = Utc::now();
        let (next_fire_at, delay) = match delay {
            Some(delay) => {
                let at = chrono::Duration::from_std(delay)
                    .ok()
                    .and_then(|delay| now.checked_add_signed(delay))
                    .unwrap_or(DateTime::<Utc>::MAX_UTC);
                (at, delay)
            }
            None => {
                let at = entry.trigger.next_fire_at(now);
                (at, (at - now).to_std().unwrap_or(Duration::ZERO))
            }
        };

        let run_id = RunId::new();
        entry.run_id = run_id.clone();
        entry.state = EntryState::Scheduled { next_fire_at };
        entry.handle = Some(tokio::spawn(run_timer(
            Arc::clone(self),
            key.clone(),
            run_id,
            delay,
        )));

        debug!(
            task = %key,
            next_fire_at = %next_fire_at.format("%Y-%m-%d %H:%M:%S"),
            delay_secs = delay.as_secs(),
            "Timer armed"
        );
    }

    fn firing_lock(&self, key: &TaskKey) -> Arc<Mutex<()>> {
        let mut locks = self
            .firing_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(key.clone()).or_default())
    }

    async fn fire(self: Arc<Self>, key: TaskKey, run_id: RunId) {
        if !self.accepting.load(Ordering::SeqCst) {
            return;
        }

        let (action, _guard) = {
            let mut entries = self.entries.lock().await;
            let Some(entry) = entries.get_mut(&key) else {
                return;
            };
            if entry.run_id != run_id || !matches!(entry.state, EntryState::Scheduled { .. }) {
                debug!(task = %key, "Stale timer woke up; ignoring");
                return;
            }
            entry.state = EntryState::Running {
                pause_requested: false,
            };
            entry.last_fired_at = Some(Utc::now());
            (Arc::clone(&entry.action), FiringGuard::enter(&self.in_flight))
        };

        let lock = self.firing_lock(&key);
        let _serial = lock.lock().await;

        info!(task = %key, "⏰ Firing");

        let outcome = self.attempt_with_retry(&key, action.as_ref()).await;
        let class = OutcomeClass::of(&outcome);

        let settlement = match AssertUnwindSafe(action.settle(outcome, Utc::now()))
            .catch_unwind()
            .await
        {
            Ok(settlement) => settlement,
            Err(panic) => {
                let reason = panic_message(panic.as_ref());
                error!(task = %key, reason = %reason, "❌ Settling the firing panicked");
                Settlement::new(format!("Unexpected error: {reason}"), Plan::repeat())
            }
        };

        self.record(&key, &settlement.message, class);
        self.apply(&key, &run_id, settlement.plan).await;
    }

    async fn attempt_with_retry(&self, key: &TaskKey, action: &dyn TaskAction) -> Outcome {
        let policy = key.kind().retry_policy();
        let mut attempt = 1;

        loop {
            let outcome = self.guarded_attempt(key, action).await;
            if !outcome.is_transient() || !policy.allows(attempt + 1) {
                return outcome;
            }

            attempt += 1;
            let backoff = policy.delay_before(attempt);
            warn!(
                task = %key,
                attempt,
                backoff_secs = backoff.as_secs(),
                reason = outcome.message(),
                "⚠️  Transient failure, retrying"
            );
            tokio::time::sleep(backoff).await;
        }
    }

    /// One attempt under the watchdog. Panics and timeouts become transient
    /// outcomes so the entry keeps its schedule.
    async fn guarded_attempt(&self, key: &TaskKey, action: &dyn TaskAction) -> Outcome {
        let timeout = self.config.firing_timeout;
        let attempt = AssertUnwindSafe(action.attempt()).catch_unwind();
        match tokio::time::timeout(timeout, attempt).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(panic)) => {
                let reason = panic_message(panic.as_ref());
                error!(task = %key, reason = %reason, "❌ Action panicked");
                Outcome::transient(format!("Unexpected error: {reason}"))
            }
            Err(_) => {
                warn!(task = %key, timeout_secs = timeout.as_secs(), "⚠️  Watchdog expired");
                Outcome::transient(format!("Watchdog expired after {}s", timeout.as_secs()))
            }
        }
    }

    fn record(&self, key: &TaskKey, message: &str, class: OutcomeClass) {
        match class {
            OutcomeClass::Success => info!(task = %key, "{}", message),
            OutcomeClass::Transient => warn!(task = %key, "{}", message),
            OutcomeClass::Fatal => error!(task = %key, "{}", message),
        }
        self.task_log.record(key, message);
    }

    async fn apply(self: &Arc<Self>, key: &TaskKey, run_id: &RunId, plan: Plan) {
        let accepting = self.accepting.load(Ordering::SeqCst);
        let mut entries = self.entries.lock().await;

        match entries.get_mut(key) {
            Some(entry) if &entry.run_id == run_id => {
                let next = match entry.state {
                    EntryState::Running {
                        pause_requested: true,
                    } => Next::Pause,
                    _ => plan.next,
                };
                let recurring = entry.trigger.is_recurring();

                match next {
                    _ if !accepting => go_dormant(entry),
                    Next::Repeat if recurring => self.arm(key, entry, None),
                    Next::RepeatWithin(range) if recurring => {
                        self.arm(key, entry, Some(range.next_delay()))
                    }
                    Next::Repeat | Next::RepeatWithin(_) | Next::Dormant => go_dormant(entry),
                    Next::Pause => {
                        entry.state = EntryState::Paused;
                        entry.handle = None;
                        info!(task = %key, "⏸️  Paused");
                    }
                }
            }
            _ => {
                debug!(
                    task = %key,
                    dropped = plan.follow_ups.len(),
                    "Entry replaced or cancelled while firing; plan discarded"
                );
                return;
            }
        }

        if !accepting {
            if !plan.follow_ups.is_empty() {
                debug!(
                    task = %key,
                    dropped = plan.follow_ups.len(),
                    "Shutting down; follow-ups dropped"
                );
            }
            return;
        }

        for follow_up in plan.follow_ups {
            self.apply_follow_up(&mut entries, follow_up);
        }
    }

    fn apply_follow_up(
        self: &Arc<Self>,
        entries: &mut HashMap<TaskKey, TaskEntry>,
        follow_up: FollowUp,
    ) {
        match follow_up {
            FollowUp::Once { key, at, action } => {
                info!(
                    task = %key,
                    at = %at.format("%Y-%m-%d %H:%M:%S"),
                    "➕ One-shot registered"
                );
                self.install(entries, key, Trigger::At(at), action, None);
            }
            FollowUp::Start {
                key,
                trigger,
                first_delay,
                action,
            } => {
                info!(task = %key, "➕ Task registered");
                self.install(entries, key, trigger, action, first_delay);
            }
            FollowUp::Cancel { key } => {
                if let Some(mut entry) = entries.remove(&key) {
                    entry.disarm();
                    info!(task = %key, "⏹️  Task cancelled");
                }
            }
            FollowUp::Note { key, message } => self.task_log.record(&key, &message),
        }
    }
}

fn go_dormant(entry: &mut TaskEntry) {
    entry.state = EntryState::Dormant;
    entry.handle = None;
}

async fn run_timer(inner: Arc<SchedulerInner>, key: TaskKey, run_id: RunId, delay: Duration) {
    tokio::time::sleep(delay).await;
    inner.fire(key, run_id).await;
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic".to_string()
    }
}
