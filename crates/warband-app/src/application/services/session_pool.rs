use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{info, warn};

use warband_domain::account::Account;
use warband_domain::collaborator::{Collaborator, SessionConnector};
use warband_domain::{AccountId, DomainError};

/// One open collaborator session per account.
pub struct SessionPool {
    sessions: Mutex<HashMap<AccountId, Arc<dyn Collaborator>>>,
    released: AtomicBool,
    open_timeout: Duration,
}

impl SessionPool {
    pub fn new(open_timeout: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            released: AtomicBool::new(false),
            open_timeout,
        }
    }

    /// Open a session for `account`, replacing any previous one.
    pub async fn open(
        &self,
        connector: &dyn SessionConnector,
        account: &Account,
    ) -> Result<Arc<dyn Collaborator>, DomainError> {
        if self.released.load(Ordering::SeqCst) {
            return Err(DomainError::SchedulerStopped(
                "session pool already released".to_string(),
            ));
        }

        info!("Opening session for {}", account.username());
        let session = tokio::time::timeout(self.open_timeout, connector.open(account))
            .await
            .map_err(|_| {
                DomainError::Timeout(format!("opening session for {}", account.username()))
            })??;

        let previous = self
            .sessions
            .lock()
            .await
            .insert(account.id().clone(), Arc::clone(&session));
        if let Some(previous) = previous {
            warn!("Replacing open session for {}", account.username());
            previous.release().await;
        }

        Ok(session)
    }

    pub async fn get(&self, account: &AccountId) -> Option<Arc<dyn Collaborator>> {
        self.sessions.lock().await.get(account).cloned()
    }

    pub async fn size(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Release every session exactly once. Later calls do nothing.
    pub async fn release_all(&self) {
        if self.released.swap(true, Ordering::SeqCst) {
            return;
        }

        let sessions: Vec<_> = self.sessions.lock().await.drain().collect();
        info!("Releasing {} session(s)", sessions.len());

        for (account, session) in sessions {
            session.release().await;
            info!("Session released for {}", account);
        }
    }
}

impl Drop for SessionPool {
    fn drop(&mut self) {
        if !self.released.load(Ordering::SeqCst) {
            let open = self.sessions.get_mut().len();
            if open > 0 {
                warn!("Session pool dropped with {} session(s) never released", open);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warband_domain::account::{AccountType, FeatureToggles};
    use warband_infrastructure::session::{DryRunCollaborator, DryRunConnector};

    fn account(name: &str) -> Account {
        Account::new(
            name,
            AccountType::Leader,
            String::new(),
            String::new(),
            FeatureToggles::default(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_release_all_is_idempotent() {
        let pool = SessionPool::new(Duration::from_secs(5));
        let connector = DryRunConnector::new(false);

        pool.open(&connector, &account("alice")).await.unwrap();
        pool.open(&connector, &account("bob")).await.unwrap();
        assert_eq!(pool.size().await, 2);

        pool.release_all().await;
        pool.release_all().await;

        assert_eq!(pool.size().await, 0);
        assert!(pool.open(&connector, &account("carol")).await.is_err());
    }

    #[tokio::test]
    async fn test_get_returns_open_session() {
        let pool = SessionPool::new(Duration::from_secs(5));
        let connector = DryRunConnector::new(true);
        let alice = account("alice");

        pool.open(&connector, &alice).await.unwrap();

        assert!(pool.get(alice.id()).await.is_some());
        assert!(pool.get(&AccountId::from_string("bob")).await.is_none());
        pool.release_all().await;
    }

    #[tokio::test]
    async fn test_dry_run_session_released_once() {
        let session = Arc::new(DryRunCollaborator::new("alice", false));
        let pool = SessionPool::new(Duration::from_secs(5));
        pool.sessions
            .lock()
            .await
            .insert(AccountId::from_string("alice"), session.clone());

        pool.release_all().await;
        assert!(session.is_released());
    }
}
