use serde::{Deserialize, Serialize};

use super::TaskKind;
use crate::shared::AccountId;

/// Identity of a scheduled task: one live registry entry per (account, kind).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TaskKey {
    account: AccountId,
    kind: TaskKind,
}

impl TaskKey {
    pub fn new(account: AccountId, kind: TaskKind) -> Self {
        Self { account, kind }
    }

    pub fn account(&self) -> &AccountId {
        &self.account
    }

    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    /// Same account, different kind.
    pub fn sibling(&self, kind: TaskKind) -> Self {
        Self::new(self.account.clone(), kind)
    }
}

impl std::fmt::Display for TaskKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}", self.account, self.kind.slug())
    }
}
