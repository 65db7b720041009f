//! Contract with the page-automation layer.
//!
//! The scheduler never looks at a page itself. It asks a [`Collaborator`]
//! to perform a named action for an account and interprets the three-way
//! [`Outcome`] it gets back.

mod outcome;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::account::Account;
use crate::shared::DomainError;
use crate::task::TaskKind;

pub use outcome::{Outcome, PageData};

/// Named page actions the collaborator can perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionName {
    CheckAdventure,
    UpgradeHero,
    CollectMissionRewards,
    CollectDailyRewards,
    CheckIncomingAttacks,
    UpgradeResourceField,
    TrainTroops,
    SendRaids,
    RefreshPage,
    SpendResourcesOnTroops,
    CheckGoldClub,
}

impl ActionName {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionName::CheckAdventure => "check-adventure",
            ActionName::UpgradeHero => "upgrade-hero",
            ActionName::CollectMissionRewards => "collect-mission-rewards",
            ActionName::CollectDailyRewards => "collect-daily-rewards",
            ActionName::CheckIncomingAttacks => "check-incoming-attacks",
            ActionName::UpgradeResourceField => "upgrade-resource-field",
            ActionName::TrainTroops => "train-troops",
            ActionName::SendRaids => "send-raids",
            ActionName::RefreshPage => "refresh-page",
            ActionName::SpendResourcesOnTroops => "spend-resources-on-troops",
            ActionName::CheckGoldClub => "check-gold-club",
        }
    }
}

impl std::fmt::Display for ActionName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional per-action parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionParams {
    pub troop_building: Option<String>,
    pub troop_name: Option<String>,
    pub hero_attribute: Option<String>,
}

impl ActionParams {
    pub const DEFAULT_HERO_ATTRIBUTE: &'static str = "resourceProduction";

    /// Parameters a task of `kind` passes for `account`.
    pub fn for_task(kind: TaskKind, account: &Account) -> Self {
        match kind {
            TaskKind::TroopTraining | TaskKind::AttackMitigation => Self {
                troop_building: Some(account.troop_building().to_string()),
                troop_name: Some(account.troop_name().to_string()),
                ..Default::default()
            },
            TaskKind::HeroUpgrade => Self {
                hero_attribute: Some(Self::DEFAULT_HERO_ATTRIBUTE.to_string()),
                ..Default::default()
            },
            _ => Self::default(),
        }
    }
}

/// One account's handle onto the page-automation layer.
///
/// Implementations bound their own waits and must report every problem as
/// an [`Outcome`]; nothing is allowed to escape as a panic or error.
#[async_trait]
pub trait Collaborator: Send + Sync {
    async fn perform(&self, account: &Account, action: ActionName, params: &ActionParams)
        -> Outcome;

    /// Releases the underlying session. Called exactly once at shutdown.
    async fn release(&self);
}

/// Opens the per-account session at startup.
#[async_trait]
pub trait SessionConnector: Send + Sync {
    async fn open(&self, account: &Account) -> Result<Arc<dyn Collaborator>, DomainError>;
}
