use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use warband_domain::task::TaskKind;

/// On-disk settings. Every field is optional; missing ones keep their defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SettingsFile {
    pub mitigation_margin_secs: Option<u64>,
    pub firing_timeout_secs: Option<u64>,
    pub shutdown_grace_secs: Option<u64>,
    pub render_interval_ms: Option<u64>,
    pub health_check_interval_secs: Option<u64>,
    pub log_dir: Option<PathBuf>,
    pub log_filter: Option<String>,
    /// `{"adventure": [300, 900]}` replaces that kind's reschedule window.
    pub jitter: HashMap<TaskKind, [f64; 2]>,
}

pub fn load_settings(path: &Path) -> Result<SettingsFile> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("read settings {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parse settings {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_settings() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"mitigation_margin_secs": 90, "jitter": {{"attack-check": [60, 120]}}}}"#
        )
        .unwrap();

        let settings = load_settings(file.path()).unwrap();
        assert_eq!(settings.mitigation_margin_secs, Some(90));
        assert_eq!(settings.firing_timeout_secs, None);
        assert_eq!(settings.jitter.get(&TaskKind::AttackCheck), Some(&[60.0, 120.0]));
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"mitigation_margin": 90}}"#).unwrap();
        assert!(load_settings(file.path()).is_err());
    }
}
