use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::action::TaskAction;
use warband_domain::task::Trigger;
use warband_domain::{RunId, TaskKey};

/// Scheduler tunables.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Watchdog applied to every attempt of a firing.
    pub firing_timeout: Duration,
    /// How long shutdown waits for firings already in progress.
    pub shutdown_grace: Duration,
    pub health_check_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            firing_timeout: Duration::from_secs(180),
            shutdown_grace: Duration::from_secs(30),
            health_check_interval: Duration::from_secs(300),
        }
    }
}

/// Observable state of a registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Scheduled,
    Running,
    /// Will not fire again until registered anew.
    Dormant,
    /// Will not fire again until resumed.
    Paused,
}

/// Point-in-time view of one entry, as returned by `list`.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskSnapshot {
    pub key: TaskKey,
    pub state: TaskState,
    /// `None` unless the entry is waiting on an armed timer.
    pub next_fire_at: Option<DateTime<Utc>>,
    pub recurring: bool,
    pub last_fired_at: Option<DateTime<Utc>>,
}

pub(super) enum EntryState {
    Scheduled { next_fire_at: DateTime<Utc> },
    Running { pause_requested: bool },
    Dormant,
    Paused,
}

impl EntryState {
    pub(super) fn public(&self) -> TaskState {
        match self {
            EntryState::Scheduled { .. } => TaskState::Scheduled,
            EntryState::Running { .. } => TaskState::Running,
            EntryState::Dormant => TaskState::Dormant,
            EntryState::Paused => TaskState::Paused,
        }
    }
}

pub(super) struct TaskEntry {
    pub trigger: Trigger,
    pub action: Arc<dyn TaskAction>,
    pub state: EntryState,
    /// Identifies the armed timer; a firing whose run id no longer matches
    /// belongs to a replaced or cancelled entry and must not touch it.
    pub run_id: RunId,
    pub handle: Option<JoinHandle<()>>,
    pub last_fired_at: Option<DateTime<Utc>>,
}

impl TaskEntry {
    pub(super) fn snapshot(&self, key: &TaskKey) -> TaskSnapshot {
        TaskSnapshot {
            key: key.clone(),
            state: self.state.public(),
            next_fire_at: match self.state {
                EntryState::Scheduled { next_fire_at } => Some(next_fire_at),
                _ => None,
            },
            recurring: self.trigger.is_recurring(),
            last_fired_at: self.last_fired_at,
        }
    }

    /// Abort the timer if it is still sleeping. A running firing is left alone.
    pub(super) fn disarm(&mut self) {
        if matches!(self.state, EntryState::Scheduled { .. }) {
            if let Some(handle) = self.handle.take() {
                handle.abort();
            }
        }
    }
}

/// Counts firings in progress; dropping the guard decrements.
pub(super) struct FiringGuard {
    in_flight: Arc<watch::Sender<usize>>,
}

impl FiringGuard {
    pub(super) fn enter(in_flight: &Arc<watch::Sender<usize>>) -> Self {
        in_flight.send_modify(|count| *count += 1);
        Self {
            in_flight: Arc::clone(in_flight),
        }
    }
}

impl Drop for FiringGuard {
    fn drop(&mut self) {
        self.in_flight
            .send_modify(|count| *count = count.saturating_sub(1));
    }
}
