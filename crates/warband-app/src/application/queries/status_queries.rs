use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::application::dtos::{AccountStatusDto, Countdown, StatusRowDto};
use crate::application::services::{LogEntry, TaskLog, TaskScheduler, TaskSnapshot};
use warband_domain::account::AccountRepository;
use warband_domain::{AccountId, DomainError, TaskKey};

/// Read side for the status table
pub struct StatusQueryService {
    scheduler: TaskScheduler,
    task_log: Arc<TaskLog>,
    account_repo: Arc<dyn AccountRepository>,
}

impl StatusQueryService {
    pub fn new(
        scheduler: TaskScheduler,
        task_log: Arc<TaskLog>,
        account_repo: Arc<dyn AccountRepository>,
    ) -> Self {
        Self {
            scheduler,
            task_log,
            account_repo,
        }
    }

    /// Snapshot of every account's jobs as of now
    pub async fn current(&self) -> Result<Vec<AccountStatusDto>, DomainError> {
        let accounts: Vec<AccountId> = self
            .account_repo
            .find_all()
            .await?
            .into_iter()
            .map(|account| account.id().clone())
            .collect();
        let tasks = self.scheduler.list().await;
        let logs = self.task_log.snapshot();

        Ok(build_status_view(&accounts, &tasks, &logs, Utc::now()))
    }
}

/// Group registry entries per account, in the order `accounts` lists them.
/// Rows are sorted by job id, then countdown; jobs without a next firing
/// show `unknown`. Accounts with no entries get an empty table. Entries of
/// unlisted accounts follow, by name.
pub fn build_status_view(
    accounts: &[AccountId],
    tasks: &[TaskSnapshot],
    logs: &HashMap<TaskKey, LogEntry>,
    now: DateTime<Utc>,
) -> Vec<AccountStatusDto> {
    let mut by_account: BTreeMap<&AccountId, Vec<StatusRowDto>> = BTreeMap::new();
    for task in tasks {
        by_account
            .entry(task.key.account())
            .or_default()
            .push(row(task, logs.get(&task.key), now));
    }

    let mut view: Vec<AccountStatusDto> = accounts
        .iter()
        .map(|account| AccountStatusDto {
            username: account.to_string(),
            rows: by_account.remove(account).unwrap_or_default(),
        })
        .collect();
    view.extend(by_account.into_iter().map(|(account, rows)| AccountStatusDto {
        username: account.to_string(),
        rows,
    }));

    for table in &mut view {
        table.rows.sort_by(|a, b| {
            a.job_id
                .cmp(&b.job_id)
                .then_with(|| a.countdown.cmp(&b.countdown))
        });
    }
    view
}

fn row(task: &TaskSnapshot, log: Option<&LogEntry>, now: DateTime<Utc>) -> StatusRowDto {
    let countdown = match task.next_fire_at {
        Some(at) => Countdown::Seconds((at - now).num_seconds().max(0) as u64),
        None => Countdown::Unknown,
    };

    StatusRowDto {
        job_id: task.key.to_string(),
        next_run_at: task.next_fire_at,
        countdown,
        log: log.map(|entry| entry.message.clone()).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::TaskState;
    use warband_domain::TaskKind;

    fn snapshot(account: &str, kind: TaskKind, at: Option<DateTime<Utc>>) -> TaskSnapshot {
        TaskSnapshot {
            key: TaskKey::new(AccountId::from_string(account), kind),
            state: if at.is_some() {
                TaskState::Scheduled
            } else {
                TaskState::Dormant
            },
            next_fire_at: at,
            recurring: true,
            last_fired_at: None,
        }
    }

    #[test]
    fn test_rows_grouped_per_account_in_roster_order() {
        let now = Utc::now();
        let tasks = vec![
            snapshot("alice", TaskKind::RaidSend, Some(now + chrono::Duration::seconds(30))),
            snapshot("bob", TaskKind::Adventure, Some(now + chrono::Duration::seconds(5))),
            snapshot("alice", TaskKind::Adventure, Some(now + chrono::Duration::seconds(60))),
        ];
        let accounts = vec![AccountId::from_string("bob"), AccountId::from_string("alice")];

        let view = build_status_view(&accounts, &tasks, &HashMap::new(), now);

        assert_eq!(view.len(), 2);
        assert_eq!(view[0].username, "bob");
        assert_eq!(view[1].username, "alice");
        let ids: Vec<&str> = view[1].rows.iter().map(|r| r.job_id.as_str()).collect();
        assert_eq!(ids, vec!["alice_adventures", "alice_raids"]);
        assert_eq!(view[1].rows[0].countdown, Countdown::Seconds(60));
    }

    #[test]
    fn test_entry_without_next_fire_shows_unknown() {
        let now = Utc::now();
        let tasks = vec![snapshot("alice", TaskKind::AttackMitigation, None)];
        let accounts = vec![AccountId::from_string("alice")];

        let view = build_status_view(&accounts, &tasks, &HashMap::new(), now);

        let row = &view[0].rows[0];
        assert_eq!(row.countdown, Countdown::Unknown);
        assert_eq!(row.countdown.to_string(), "unknown");
        assert_eq!(row.next_run_at, None);
    }

    #[test]
    fn test_overdue_countdown_clamps_to_zero() {
        let now = Utc::now();
        let tasks = vec![snapshot(
            "alice",
            TaskKind::PageRefresh,
            Some(now - chrono::Duration::seconds(3)),
        )];

        let view = build_status_view(
            &[AccountId::from_string("alice")],
            &tasks,
            &HashMap::new(),
            now,
        );
        assert_eq!(view[0].rows[0].countdown, Countdown::Seconds(0));
    }

    #[test]
    fn test_latest_log_attached_to_row() {
        let now = Utc::now();
        let raids = TaskKey::new(AccountId::from_string("alice"), TaskKind::RaidSend);
        let mut logs = HashMap::new();
        logs.insert(
            raids.clone(),
            LogEntry {
                message: "Sent 3 farm lists".to_string(),
                written_at: now,
            },
        );
        let tasks = vec![snapshot("alice", TaskKind::RaidSend, Some(now))];

        let view = build_status_view(&[AccountId::from_string("alice")], &tasks, &logs, now);
        assert_eq!(view[0].rows[0].log, "Sent 3 farm lists");
    }

    #[test]
    fn test_account_without_jobs_gets_empty_table() {
        let view = build_status_view(
            &[AccountId::from_string("carol")],
            &[],
            &HashMap::new(),
            Utc::now(),
        );
        assert_eq!(view.len(), 1);
        assert!(view[0].rows.is_empty());
    }

    #[test]
    fn test_rows_sort_by_job_id_even_when_unscheduled() {
        let now = Utc::now();
        let tasks = vec![
            snapshot(
                "alice",
                TaskKind::RaidSend,
                Some(now + chrono::Duration::seconds(30)),
            ),
            snapshot("alice", TaskKind::Adventure, None),
        ];

        let view = build_status_view(
            &[AccountId::from_string("alice")],
            &tasks,
            &HashMap::new(),
            now,
        );
        let ids: Vec<&str> = view[0].rows.iter().map(|r| r.job_id.as_str()).collect();
        assert_eq!(ids, vec!["alice_adventures", "alice_raids"]);
        assert_eq!(view[0].rows[0].countdown, Countdown::Unknown);
    }
}
