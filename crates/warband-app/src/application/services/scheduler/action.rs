use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

use warband_domain::collaborator::Outcome;
use warband_domain::task::{JitterRange, Trigger};
use warband_domain::TaskKey;

/// Work bound to one registry entry.
///
/// The scheduler calls [`attempt`](TaskAction::attempt) once per try (retries
/// included) and then hands the final outcome to
/// [`settle`](TaskAction::settle), which decides what the entry does next.
#[async_trait]
pub trait TaskAction: Send + Sync {
    async fn attempt(&self) -> Outcome;

    async fn settle(&self, outcome: Outcome, now: DateTime<Utc>) -> Settlement;
}

/// Log line for the firing plus the plan the scheduler applies.
#[derive(Clone)]
pub struct Settlement {
    pub message: String,
    pub plan: Plan,
}

impl Settlement {
    pub fn new(message: impl Into<String>, plan: Plan) -> Self {
        Self {
            message: message.into(),
            plan,
        }
    }
}

#[derive(Clone)]
pub struct Plan {
    pub next: Next,
    pub follow_ups: Vec<FollowUp>,
}

impl Plan {
    pub fn repeat() -> Self {
        Self::with_next(Next::Repeat)
    }

    pub fn dormant() -> Self {
        Self::with_next(Next::Dormant)
    }

    pub fn with_next(next: Next) -> Self {
        Self {
            next,
            follow_ups: Vec::new(),
        }
    }

    pub fn and(mut self, follow_up: FollowUp) -> Self {
        self.follow_ups.push(follow_up);
        self
    }
}

/// What happens to the entry that just fired.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Next {
    /// Re-arm from the entry's own trigger. One-shot entries go dormant.
    Repeat,
    /// Re-arm once with a delay drawn from this range; the trigger is kept.
    RepeatWithin(JitterRange),
    Dormant,
    Pause,
}

/// Registry changes requested by a firing, applied after its own entry.
#[derive(Clone)]
pub enum FollowUp {
    Once {
        key: TaskKey,
        at: DateTime<Utc>,
        action: Arc<dyn TaskAction>,
    },
    Start {
        key: TaskKey,
        trigger: Trigger,
        first_delay: Option<Duration>,
        action: Arc<dyn TaskAction>,
    },
    Cancel {
        key: TaskKey,
    },
    /// Record a message under another key without touching its entry.
    Note {
        key: TaskKey,
        message: String,
    },
}

impl std::fmt::Debug for FollowUp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FollowUp::Once { key, at, .. } => write!(f, "Once({key} at {at})"),
            FollowUp::Start { key, trigger, .. } => write!(f, "Start({key}, {trigger:?})"),
            FollowUp::Cancel { key } => write!(f, "Cancel({key})"),
            FollowUp::Note { key, .. } => write!(f, "Note({key})"),
        }
    }
}

impl std::fmt::Debug for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Plan")
            .field("next", &self.next)
            .field("follow_ups", &self.follow_ups)
            .finish()
    }
}

impl std::fmt::Debug for Settlement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settlement")
            .field("message", &self.message)
            .field("plan", &self.plan)
            .finish()
    }
}
