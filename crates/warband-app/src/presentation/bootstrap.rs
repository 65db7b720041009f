use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

use crate::application::config::Settings;
use crate::application::queries::StatusQueryService;
use crate::application::services::{SessionPool, TaskLog, TaskScheduler};
use crate::application::tasks::AccountJobs;
use crate::presentation::state::AppState;
use warband_domain::account::{Account, AccountRepository};
use warband_domain::collaborator::SessionConnector;
use warband_infrastructure::persistence::repositories::InMemoryAccountRepository;

/// Wire repositories and services. Nothing is scheduled yet.
pub async fn build_app_state(accounts: Vec<Account>, settings: Settings) -> AppState {
    let settings = Arc::new(settings);
    let account_repo =
        Arc::new(InMemoryAccountRepository::seeded(accounts)) as Arc<dyn AccountRepository>;
    let task_log = Arc::new(TaskLog::new());

    let scheduler = TaskScheduler::new(settings.scheduler_config(), Arc::clone(&task_log));
    scheduler.start().await;

    let sessions = Arc::new(SessionPool::new(settings.session_open_timeout));
    let status = StatusQueryService::new(
        scheduler.clone(),
        Arc::clone(&task_log),
        Arc::clone(&account_repo),
    );

    AppState {
        settings,
        account_repo,
        task_log,
        scheduler,
        sessions,
        status,
    }
}

/// Open a session per account and register its jobs. An account whose
/// session cannot be opened is skipped; the others still run. Returns how
/// many accounts were scheduled.
pub async fn schedule_accounts(
    state: &AppState,
    connector: &dyn SessionConnector,
) -> anyhow::Result<usize> {
    let started_at = Instant::now();
    let jobs = AccountJobs::new(
        state.scheduler.clone(),
        Arc::clone(&state.account_repo),
        Arc::clone(&state.settings),
    );

    let accounts = state.account_repo.find_all().await?;
    let mut scheduled = 0;

    for account in &accounts {
        let session = match state.sessions.open(connector, account).await {
            Ok(session) => session,
            Err(e) => {
                error!("❌ Skipping {}: {}", account.username(), e.format_with_code());
                continue;
            }
        };
        jobs.schedule(account.id(), session).await?;
        scheduled += 1;
    }

    if scheduled == 0 && !accounts.is_empty() {
        anyhow::bail!("no account session could be opened");
    }

    info!(
        "✓ Scheduled {}/{} accounts ({}ms)",
        scheduled,
        accounts.len(),
        started_at.elapsed().as_millis()
    );
    Ok(scheduled)
}
