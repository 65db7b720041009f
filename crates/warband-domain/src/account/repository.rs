use async_trait::async_trait;

use super::Account;
use crate::shared::{AccountId, DomainError};

/// Per-account runtime state store.
///
/// Accounts are loaded once at startup and only their runtime flags change
/// afterwards, so there is no delete operation.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    async fn save(&self, account: &Account) -> Result<(), DomainError>;
    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, DomainError>;
    async fn find_all(&self) -> Result<Vec<Account>, DomainError>;
}
