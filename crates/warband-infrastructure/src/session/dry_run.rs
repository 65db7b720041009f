use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

use warband_domain::account::Account;
use warband_domain::collaborator::{
    ActionName, ActionParams, Collaborator, Outcome, PageData, SessionConnector,
};
use warband_domain::escalation::ThreatScan;
use warband_domain::shared::DomainError;

/// Session that performs no page interaction. Every action is logged and
/// answered with a neutral success, which lets the scheduler, task log and
/// status table run end to end without a browser.
pub struct DryRunCollaborator {
    username: String,
    gold_club: bool,
    performed: AtomicUsize,
    released: AtomicBool,
}

impl DryRunCollaborator {
    pub fn new(username: &str, gold_club: bool) -> Self {
        Self {
            username: username.to_string(),
            gold_club,
            performed: AtomicUsize::new(0),
            released: AtomicBool::new(false),
        }
    }

    pub fn performed(&self) -> usize {
        self.performed.load(Ordering::SeqCst)
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Collaborator for DryRunCollaborator {
    async fn perform(
        &self,
        _account: &Account,
        action: ActionName,
        params: &ActionParams,
    ) -> Outcome {
        if self.is_released() {
            return Outcome::fatal(format!("session for {} already released", self.username));
        }

        self.performed.fetch_add(1, Ordering::SeqCst);
        info!(
            account = %self.username,
            action = %action,
            params = ?params,
            "Dry run action"
        );

        match action {
            ActionName::CheckGoldClub => Outcome::with_data(
                if self.gold_club {
                    "Gold club active."
                } else {
                    "Please activate Gold Club to gain access to farm lists."
                },
                PageData::GoldClub {
                    active: self.gold_club,
                },
            ),
            ActionName::CheckIncomingAttacks => {
                Outcome::with_data("dry run", PageData::Movements(ThreatScan::quiet()))
            }
            other => Outcome::success(format!("dry run: {}", other)),
        }
    }

    async fn release(&self) {
        if self.released.swap(true, Ordering::SeqCst) {
            warn!(account = %self.username, "Session released twice");
        } else {
            info!(account = %self.username, "Session released");
        }
    }
}

/// Opens a [`DryRunCollaborator`] per account.
#[derive(Debug, Clone, Default)]
pub struct DryRunConnector {
    gold_club: bool,
}

impl DryRunConnector {
    pub fn new(gold_club: bool) -> Self {
        Self { gold_club }
    }
}

#[async_trait]
impl SessionConnector for DryRunConnector {
    async fn open(&self, account: &Account) -> Result<Arc<dyn Collaborator>, DomainError> {
        info!(
            account = %account.id(),
            proxy_port = ?account.proxy_port(),
            "Opening dry run session"
        );
        Ok(Arc::new(DryRunCollaborator::new(
            account.username(),
            self.gold_club,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warband_domain::account::{AccountType, FeatureToggles};

    fn account() -> Account {
        Account::new(
            "alice",
            AccountType::Leader,
            String::new(),
            String::new(),
            FeatureToggles::default(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_gold_club_answer_follows_config() {
        let session = DryRunCollaborator::new("alice", true);
        let outcome = session
            .perform(&account(), ActionName::CheckGoldClub, &ActionParams::default())
            .await;
        assert_eq!(outcome.data(), Some(&PageData::GoldClub { active: true }));
        assert_eq!(session.performed(), 1);
    }

    #[tokio::test]
    async fn test_released_session_refuses_work() {
        let session = DryRunCollaborator::new("alice", false);
        session.release().await;
        assert!(session.is_released());

        let outcome = session
            .perform(&account(), ActionName::RefreshPage, &ActionParams::default())
            .await;
        assert!(outcome.is_fatal());
        assert_eq!(session.performed(), 0);
    }
}
