use std::future::Future;
use std::io::Write;
use tracing::{info, warn};

use super::bootstrap;
use super::state::AppState;
use super::status_table;
use warband_domain::collaborator::SessionConnector;

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// Open sessions, schedule every account, then render until `interrupt`
/// resolves. The interrupt is honoured while sessions are still opening,
/// and the state is shut down on every path.
pub async fn run<F>(
    state: &AppState,
    connector: &dyn SessionConnector,
    interrupt: F,
) -> anyhow::Result<()>
where
    F: Future<Output = ()>,
{
    tokio::pin!(interrupt);

    let result = tokio::select! {
        _ = &mut interrupt => {
            info!("🛑 Interrupt received during startup");
            Ok(())
        }
        scheduled = bootstrap::schedule_accounts(state, connector) => match scheduled {
            Ok(_) => run_until(state, &mut interrupt).await,
            Err(e) => Err(e),
        },
    };

    state.shutdown().await;
    result
}

/// Redraw the status tables every `render_interval` until `interrupt`
/// resolves.
pub async fn run_until<F>(state: &AppState, interrupt: F) -> anyhow::Result<()>
where
    F: Future<Output = ()>,
{
    tokio::pin!(interrupt);
    let mut ticker = tokio::time::interval(state.settings.render_interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = &mut interrupt => {
                info!("🛑 Interrupt received");
                return Ok(());
            }
            _ = ticker.tick() => {
                // Snapshot first; rendering never holds a registry lock.
                let view = match state.status.current().await {
                    Ok(view) => view,
                    Err(e) => {
                        warn!("Status snapshot failed: {}", e);
                        continue;
                    }
                };
                let table = status_table::render(&view);

                let mut stdout = std::io::stdout().lock();
                write!(stdout, "{CLEAR_SCREEN}{table}")?;
                stdout.flush()?;
            }
        }
    }
}
