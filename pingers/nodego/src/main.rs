use anyhow::{Context, Result};
use clap::Parser;
use core_logic::{setup_logger, AccountSource, ShutdownController, STATUS_TARGET};
use dotenv::dotenv;
use nodego_pinger::{AccountScheduler, ConsoleReporter, PingerConfig, Reporter, RunMode};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "pingers/nodego/config.toml")]
    config: String,
    /// Overrides `mode` from the config file
    #[arg(short, long, value_enum)]
    mode: Option<RunMode>,
    /// Run a single cycle and exit
    #[arg(long)]
    once: bool,
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let _log_guard = setup_logger(args.verbose);
    dotenv().ok();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    info!("Loading config from: {}", args.config);
    let mut config = PingerConfig::load(&args.config).context("Failed to load config")?;
    if let Some(mode) = args.mode {
        config.mode = mode;
    }

    let entries = config
        .account_source()
        .load_accounts()
        .await
        .context("Error reading accounts")?;
    info!(target: STATUS_TARGET, "Loaded {} account entries", entries.len());

    let shutdown = ShutdownController::new(Duration::from_millis(config.shutdown_grace_ms));
    shutdown.listen();

    let reporter: Arc<dyn Reporter> = Arc::new(ConsoleReporter);
    let mut scheduler = AccountScheduler::new(
        entries,
        config.client_settings(),
        config.scheduler_settings(),
        reporter,
        shutdown.token(),
    )?;

    scheduler.run_supervised(args.once, &shutdown).await;

    Ok(())
}
