use serde::{Deserialize, Serialize};

use crate::escalation::ThreatScan;
use crate::shared::DomainError;

/// Structured page state some actions extract.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum PageData {
    #[default]
    None,
    /// The action ran but a game precondition (resources, queue slots) was not met.
    Insufficient,
    GoldClub { active: bool },
    Movements(ThreatScan),
}

/// Result of one collaborator action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Outcome {
    Success { message: String, data: PageData },
    /// Page not ready, stale element, bounded wait expired. The next firing retries.
    Transient { reason: String },
    /// A precondition that retrying cannot fix, such as a missing gold club.
    Fatal { reason: String },
}

impl Outcome {
    pub fn success(message: impl Into<String>) -> Self {
        Outcome::Success {
            message: message.into(),
            data: PageData::None,
        }
    }

    pub fn with_data(message: impl Into<String>, data: PageData) -> Self {
        Outcome::Success {
            message: message.into(),
            data,
        }
    }

    pub fn insufficient(message: impl Into<String>) -> Self {
        Self::with_data(message, PageData::Insufficient)
    }

    pub fn transient(reason: impl Into<String>) -> Self {
        Outcome::Transient {
            reason: reason.into(),
        }
    }

    pub fn fatal(reason: impl Into<String>) -> Self {
        Outcome::Fatal {
            reason: reason.into(),
        }
    }

    /// Recoverable errors become transient, everything else fatal.
    pub fn from_error(error: &DomainError) -> Self {
        if error.is_recoverable() {
            Self::transient(error.to_string())
        } else {
            Self::fatal(error.to_string())
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, Outcome::Transient { .. })
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, Outcome::Fatal { .. })
    }

    pub fn message(&self) -> &str {
        match self {
            Outcome::Success { message, .. } => message,
            Outcome::Transient { reason } | Outcome::Fatal { reason } => reason,
        }
    }

    pub fn data(&self) -> Option<&PageData> {
        match self {
            Outcome::Success { data, .. } => Some(data),
            _ => None,
        }
    }
}
