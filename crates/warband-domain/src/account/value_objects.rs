use serde::{Deserialize, Serialize};

/// Role tag of an account in the alliance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AccountType {
    Enforcer,
    Leader,
    Sourcer,
    Defender,
    Other(String),
}

impl AccountType {
    pub fn as_str(&self) -> &str {
        match self {
            AccountType::Enforcer => "enforcer",
            AccountType::Leader => "leader",
            AccountType::Sourcer => "sourcer",
            AccountType::Defender => "defender",
            AccountType::Other(tag) => tag,
        }
    }

    /// Only enforcers keep their barracks busy.
    pub fn trains_troops(&self) -> bool {
        matches!(self, AccountType::Enforcer)
    }
}

impl From<String> for AccountType {
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().as_str() {
            "enforcer" => AccountType::Enforcer,
            "leader" => AccountType::Leader,
            "sourcer" => AccountType::Sourcer,
            "defender" => AccountType::Defender,
            _ => AccountType::Other(value.trim().to_string()),
        }
    }
}

impl From<AccountType> for String {
    fn from(value: AccountType) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-feature switches from the roster.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureToggles {
    pub upgrade_fields: bool,
    pub train_troops: bool,
    pub raid: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_type_is_case_insensitive() {
        assert_eq!(AccountType::from("Enforcer".to_string()), AccountType::Enforcer);
        assert_eq!(AccountType::from(" LEADER ".to_string()), AccountType::Leader);
        assert_eq!(
            AccountType::from("scout".to_string()),
            AccountType::Other("scout".to_string())
        );
    }

    #[test]
    fn test_account_type_serde() {
        let parsed: AccountType = serde_json::from_str("\"defender\"").unwrap();
        assert_eq!(parsed, AccountType::Defender);
        assert_eq!(serde_json::to_string(&AccountType::Sourcer).unwrap(), "\"sourcer\"");
    }
}
