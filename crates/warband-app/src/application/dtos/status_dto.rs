use chrono::{DateTime, Utc};
use serde::Serialize;

/// Seconds until a job's next firing, or `Unknown` when it has none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Countdown {
    // Variant order makes every known countdown sort before `Unknown`.
    Seconds(u64),
    Unknown,
}

impl std::fmt::Display for Countdown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Countdown::Seconds(secs) => write!(f, "{secs}"),
            Countdown::Unknown => f.write_str("unknown"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusRowDto {
    pub job_id: String,
    pub next_run_at: Option<DateTime<Utc>>,
    pub countdown: Countdown,
    pub log: String,
}

/// One account's table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountStatusDto {
    pub username: String,
    pub rows: Vec<StatusRowDto>,
}
