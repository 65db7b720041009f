use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};

use warband_domain::account::{Account, AccountType, FeatureToggles};
use warband_domain::shared::DomainError;

/// One row of the account roster, column names as exported from the
/// spreadsheet. Unknown columns (including `Password`) are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct RosterRow {
    #[serde(rename = "Username")]
    pub username: String,
    #[serde(rename = "Port", default, deserialize_with = "flexible_port")]
    pub port: Option<u16>,
    #[serde(rename = "Type", default)]
    pub account_type: String,
    #[serde(rename = "Troop Building", default)]
    pub troop_building: String,
    #[serde(rename = "Troop Name", default)]
    pub troop_name: String,
    #[serde(rename = "Upgrade Fields", default, deserialize_with = "flexible_bool")]
    pub upgrade_fields: bool,
    #[serde(rename = "Train Troops", default, deserialize_with = "flexible_bool")]
    pub train_troops: bool,
    #[serde(rename = "Raid", default, deserialize_with = "flexible_bool")]
    pub raid: bool,
}

impl RosterRow {
    pub fn into_account(self) -> Result<Account, DomainError> {
        let account = Account::new(
            &self.username,
            AccountType::from(self.account_type),
            self.troop_building,
            self.troop_name,
            FeatureToggles {
                upgrade_fields: self.upgrade_fields,
                train_troops: self.train_troops,
                raid: self.raid,
            },
        )?;
        Ok(account.with_proxy_port(self.port))
    }
}

/// Reads a JSON array of roster rows.
pub fn load_roster(path: &Path) -> Result<Vec<Account>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("read roster {}", path.display()))?;
    let accounts = parse_roster(&raw).with_context(|| format!("parse roster {}", path.display()))?;
    info!(
        path = %path.display(),
        accounts = accounts.len(),
        "Roster loaded"
    );
    Ok(accounts)
}

pub fn parse_roster(raw: &str) -> Result<Vec<Account>, DomainError> {
    let rows: Vec<RosterRow> =
        serde_json::from_str(raw).map_err(|e| DomainError::Serialization(e.to_string()))?;

    if rows.is_empty() {
        warn!("Roster has no accounts");
    }

    let mut seen = HashSet::new();
    let mut accounts = Vec::with_capacity(rows.len());
    for (index, row) in rows.into_iter().enumerate() {
        let account = row.into_account().map_err(|e| {
            DomainError::InvalidConfig(format!("row {}: {}", index + 1, e.message()))
        })?;
        if !seen.insert(account.id().clone()) {
            return Err(DomainError::InvalidConfig(format!(
                "row {}: duplicate username {}",
                index + 1,
                account.id()
            )));
        }
        accounts.push(account);
    }
    Ok(accounts)
}

fn flexible_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => matches!(
            s.trim().to_lowercase().as_str(),
            "true" | "yes" | "y" | "x" | "1"
        ),
        _ => false,
    })
}

fn flexible_port<'de, D>(deserializer: D) -> Result<Option<u16>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let port = match value {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()).map(|f| f as u64),
        Value::String(s) if !s.trim().is_empty() => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    port.map(|p| u16::try_from(p).map_err(serde::de::Error::custom))
        .transpose()
}
