mod jitter;
mod key;
mod kind;
mod policy;
mod trigger;

pub use jitter::{JitterRange, MAX_JITTER_SECS};
pub use key::TaskKey;
pub use kind::TaskKind;
pub use policy::{FailurePolicy, RetryPolicy};
pub use trigger::Trigger;
