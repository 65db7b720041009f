use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use warband_domain::TaskKey;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub message: String,
    pub written_at: DateTime<Utc>,
}

/// Latest message per task key. Writing a key overwrites its previous
/// message; there is no history.
#[derive(Debug, Default)]
pub struct TaskLog {
    entries: RwLock<HashMap<TaskKey, LogEntry>>,
}

impl TaskLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, key: &TaskKey, message: &str) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(
            key.clone(),
            LogEntry {
                message: message.to_string(),
                written_at: Utc::now(),
            },
        );
    }

    pub fn latest(&self, key: &TaskKey) -> Option<LogEntry> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(key).cloned()
    }

    pub fn snapshot(&self) -> HashMap<TaskKey, LogEntry> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warband_domain::{AccountId, TaskKind};

    fn key(account: &str, kind: TaskKind) -> TaskKey {
        TaskKey::new(AccountId::from_string(account), kind)
    }

    #[test]
    fn test_second_write_overwrites_first() {
        let log = TaskLog::new();
        let raids = key("alice", TaskKind::RaidSend);

        log.record(&raids, "X");
        log.record(&raids, "Y");

        assert_eq!(log.latest(&raids).unwrap().message, "Y");
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_keys_are_independent() {
        let log = TaskLog::new();
        log.record(&key("alice", TaskKind::RaidSend), "alice raided");
        log.record(&key("bob", TaskKind::RaidSend), "bob raided");

        assert_eq!(
            log.latest(&key("alice", TaskKind::RaidSend)).unwrap().message,
            "alice raided"
        );
        assert!(log.latest(&key("alice", TaskKind::Adventure)).is_none());
        assert_eq!(log.snapshot().len(), 2);
    }
}
