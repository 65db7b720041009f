use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use warband_app::application::config::Settings;
use warband_app::presentation::{bootstrap, runner};
use warband_infrastructure::config::{load_roster, load_settings};
use warband_infrastructure::logging::{default_log_dir, init_logger};
use warband_infrastructure::session::DryRunConnector;

#[derive(Parser, Debug)]
#[command(name = "warband")]
#[command(about = "Jittered per-account job scheduler for browser game automation")]
struct Cli {
    /// Account roster (JSON array of rows)
    #[arg(env = "WARBAND_ROSTER")]
    roster: PathBuf,

    /// Optional settings file (JSON)
    #[arg(env = "WARBAND_SETTINGS")]
    settings: Option<PathBuf>,

    /// Dry-run sessions report an active gold club
    #[arg(long)]
    gold_club: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("❌ {:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = match &cli.settings {
        Some(path) => Settings::from_file(load_settings(path)?)?,
        None => Settings::default(),
    };

    let log_dir = settings.log_dir.clone().unwrap_or_else(default_log_dir);
    match init_logger(log_dir.clone(), settings.log_filter.as_deref()) {
        Ok(_) => {
            tracing::info!("🚀 warband starting...");
            tracing::info!("📝 File logging initialized at: {}", log_dir.display());
        }
        Err(e) => {
            eprintln!("⚠️  Failed to initialize file logging: {}", e);
            eprintln!("   Falling back to console logging only");

            let _ = tracing_subscriber::fmt()
                .with_env_filter(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
                )
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(true)
                .with_line_number(true)
                .try_init();
        }
    }

    let accounts = load_roster(&cli.roster)?;
    tracing::info!("Loaded {} accounts from {}", accounts.len(), cli.roster.display());

    let state = bootstrap::build_app_state(accounts, settings).await;
    let connector = DryRunConnector::new(cli.gold_club);

    runner::run(&state, &connector, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    })
    .await
}
