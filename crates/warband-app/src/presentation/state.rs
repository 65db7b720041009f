use std::sync::Arc;
use tracing::info;

use crate::application::config::Settings;
use crate::application::queries::StatusQueryService;
use crate::application::services::{SessionPool, TaskLog, TaskScheduler};
use warband_domain::account::AccountRepository;

pub struct AppState {
    pub settings: Arc<Settings>,
    pub account_repo: Arc<dyn AccountRepository>,
    pub task_log: Arc<TaskLog>,
    pub scheduler: TaskScheduler,
    pub sessions: Arc<SessionPool>,
    pub status: StatusQueryService,
}

impl AppState {
    /// Stop the scheduler, then release every session. Safe to call more
    /// than once.
    pub async fn shutdown(&self) {
        self.scheduler.shutdown().await;
        self.sessions.release_all().await;
        info!("👋 Shutdown complete");
    }
}
