use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            pub fn from_string(s: &str) -> Self {
                Self(s.to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// Accounts are keyed by their in-game username.
define_id!(AccountId);
define_id!(RunId);

impl RunId {
    /// Fresh identifier for one armed timer of a registry entry.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

/// Error codes for structured error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Configuration (1xxx)
    InvalidConfig = 1001,

    // Resource Not Found (2xxx)
    AccountNotFound = 2001,
    TaskNotFound = 2002,

    // Lifecycle (3xxx)
    SchedulerStopped = 3001,
    SessionError = 3002,

    // Data (4xxx)
    SerializationError = 4001,

    // Infrastructure (5xxx)
    InfrastructureError = 5001,
    TimeoutError = 5002,

    // Validation (6xxx)
    ValidationError = 6001,
}

impl ErrorCode {
    /// Get error code as integer
    pub fn code(&self) -> u16 {
        *self as u16
    }

    /// Get error severity
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ErrorCode::SessionError | ErrorCode::TimeoutError => ErrorSeverity::Warning,

            ErrorCode::AccountNotFound
            | ErrorCode::TaskNotFound
            | ErrorCode::ValidationError => ErrorSeverity::Info,

            ErrorCode::InvalidConfig
            | ErrorCode::SerializationError
            | ErrorCode::InfrastructureError => ErrorSeverity::Error,

            ErrorCode::SchedulerStopped => ErrorSeverity::Warning,
        }
    }

    /// Whether the next scheduled attempt can reasonably succeed
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ErrorCode::SessionError | ErrorCode::TimeoutError | ErrorCode::InfrastructureError
        )
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Scheduler stopped: {0}")]
    SchedulerStopped(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Infrastructure error: {0}")]
    Infrastructure(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl DomainError {
    /// Get error code
    pub fn code(&self) -> ErrorCode {
        match self {
            DomainError::InvalidConfig(_) => ErrorCode::InvalidConfig,
            DomainError::AccountNotFound(_) => ErrorCode::AccountNotFound,
            DomainError::TaskNotFound(_) => ErrorCode::TaskNotFound,
            DomainError::SchedulerStopped(_) => ErrorCode::SchedulerStopped,
            DomainError::Session(_) => ErrorCode::SessionError,
            DomainError::Timeout(_) => ErrorCode::TimeoutError,
            DomainError::Serialization(_) => ErrorCode::SerializationError,
            DomainError::Infrastructure(_) => ErrorCode::InfrastructureError,
            DomainError::Validation(_) => ErrorCode::ValidationError,
        }
    }

    /// Get error message
    pub fn message(&self) -> &str {
        match self {
            DomainError::InvalidConfig(msg)
            | DomainError::AccountNotFound(msg)
            | DomainError::TaskNotFound(msg)
            | DomainError::SchedulerStopped(msg)
            | DomainError::Session(msg)
            | DomainError::Timeout(msg)
            | DomainError::Serialization(msg)
            | DomainError::Infrastructure(msg)
            | DomainError::Validation(msg) => msg,
        }
    }

    /// Get error severity
    pub fn severity(&self) -> ErrorSeverity {
        self.code().severity()
    }

    /// Check if error is recoverable
    pub fn is_recoverable(&self) -> bool {
        self.code().is_recoverable()
    }

    /// Format error with code
    pub fn format_with_code(&self) -> String {
        format!("[{}] {}", self.code().code(), self)
    }
}
