use serde::{Deserialize, Serialize};

use super::value_objects::{AccountType, FeatureToggles};
use crate::shared::{AccountId, DomainError};
use crate::task::TaskKind;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    id: AccountId,
    account_type: AccountType,
    proxy_port: Option<u16>,
    troop_building: String,
    troop_name: String,
    gold_club: bool,
    features: FeatureToggles,
}

impl Account {
    pub fn new(
        username: &str,
        account_type: AccountType,
        troop_building: String,
        troop_name: String,
        features: FeatureToggles,
    ) -> Result<Self, DomainError> {
        if username.trim().is_empty() {
            return Err(DomainError::Validation(
                "Username cannot be empty".to_string(),
            ));
        }

        if features.train_troops && account_type.trains_troops() && troop_name.trim().is_empty() {
            return Err(DomainError::Validation(format!(
                "Account {} trains troops but has no troop name",
                username.trim()
            )));
        }

        Ok(Self {
            id: AccountId::from_string(username.trim()),
            account_type,
            proxy_port: None,
            troop_building: troop_building.trim().to_string(),
            troop_name: troop_name.trim().to_string(),
            gold_club: false,
            features,
        })
    }

    pub fn with_proxy_port(mut self, port: Option<u16>) -> Self {
        self.proxy_port = port;
        self
    }

    pub fn id(&self) -> &AccountId {
        &self.id
    }

    pub fn username(&self) -> &str {
        self.id.as_str()
    }

    pub fn account_type(&self) -> &AccountType {
        &self.account_type
    }

    pub fn proxy_port(&self) -> Option<u16> {
        self.proxy_port
    }

    pub fn troop_building(&self) -> &str {
        &self.troop_building
    }

    pub fn troop_name(&self) -> &str {
        &self.troop_name
    }

    pub fn features(&self) -> FeatureToggles {
        self.features
    }

    pub fn has_gold_club(&self) -> bool {
        self.gold_club
    }

    pub fn record_gold_club(&mut self, active: bool) {
        self.gold_club = active;
    }

    pub fn wants_raids(&self) -> bool {
        self.features.raid
    }

    pub fn can_raid(&self) -> bool {
        self.gold_club && self.features.raid
    }

    /// Recurring task kinds this account should run, given its role,
    /// toggles and gold-club membership.
    pub fn recurring_kinds(&self) -> Vec<TaskKind> {
        let mut kinds = vec![
            TaskKind::Adventure,
            TaskKind::HeroUpgrade,
            TaskKind::MissionCollect,
            TaskKind::DailyQuestCollect,
            TaskKind::AttackCheck,
        ];

        if self.features.upgrade_fields {
            kinds.push(TaskKind::ResourceFieldUpgrade);
        }
        if self.account_type.trains_troops() && self.features.train_troops {
            kinds.push(TaskKind::TroopTraining);
        }
        if self.can_raid() {
            kinds.push(TaskKind::RaidSend);
        }
        if !self.gold_club {
            kinds.push(TaskKind::GoldClubCheck);
        }

        kinds.push(TaskKind::PageRefresh);
        kinds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enforcer(features: FeatureToggles) -> Account {
        Account::new(
            "alice",
            AccountType::Enforcer,
            "Barracks".to_string(),
            "Clubswinger".to_string(),
            features,
        )
        .unwrap()
    }

    #[test]
    fn test_blank_username_rejected() {
        let result = Account::new(
            "   ",
            AccountType::Leader,
            String::new(),
            String::new(),
            FeatureToggles::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_trainer_needs_troop_name() {
        let result = Account::new(
            "bob",
            AccountType::Enforcer,
            "Barracks".to_string(),
            " ".to_string(),
            FeatureToggles {
                train_troops: true,
                ..Default::default()
            },
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_username_is_trimmed_into_id() {
        let account = Account::new(
            " carol ",
            AccountType::Sourcer,
            String::new(),
            String::new(),
            FeatureToggles::default(),
        )
        .unwrap();
        assert_eq!(account.id().as_str(), "carol");
    }

    #[test]
    fn test_recurring_kinds_without_gold_club() {
        let account = enforcer(FeatureToggles {
            upgrade_fields: true,
            train_troops: true,
            raid: true,
        });

        let kinds = account.recurring_kinds();
        assert!(kinds.contains(&TaskKind::TroopTraining));
        assert!(kinds.contains(&TaskKind::ResourceFieldUpgrade));
        assert!(kinds.contains(&TaskKind::GoldClubCheck));
        assert!(!kinds.contains(&TaskKind::RaidSend));
        assert_eq!(kinds.last(), Some(&TaskKind::PageRefresh));
    }

    #[test]
    fn test_recurring_kinds_with_gold_club() {
        let mut account = enforcer(FeatureToggles {
            upgrade_fields: false,
            train_troops: false,
            raid: true,
        });
        account.record_gold_club(true);

        let kinds = account.recurring_kinds();
        assert!(kinds.contains(&TaskKind::RaidSend));
        assert!(!kinds.contains(&TaskKind::GoldClubCheck));
        assert!(!kinds.contains(&TaskKind::TroopTraining));
        assert!(!kinds.contains(&TaskKind::ResourceFieldUpgrade));
    }

    #[test]
    fn test_non_enforcer_never_trains() {
        let account = Account::new(
            "dave",
            AccountType::Defender,
            "Barracks".to_string(),
            "Phalanx".to_string(),
            FeatureToggles {
                train_troops: true,
                ..Default::default()
            },
        )
        .unwrap();
        assert!(!account.recurring_kinds().contains(&TaskKind::TroopTraining));
    }
}
