// Domain layer - scheduling rules and account state
// No dependencies on infrastructure or the application shell

pub mod account;
pub mod collaborator;
pub mod escalation;
pub mod shared;
pub mod task;

// Re-exports for convenience
pub use shared::{AccountId, DomainError, RunId};
pub use task::{TaskKey, TaskKind};
