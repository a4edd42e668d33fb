//! pug-room service binary
//!
//! Loads configuration, wires the coordinator with in-memory stores, runs
//! the idle sweeper and reports queue activity until Ctrl+C or SIGTERM.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use pug_room::config::{validate_config, AppConfig};
use pug_room::service::Coordinator;
use std::path::PathBuf;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Pick-up game coordinator: queues, balanced teams, captain drafts
#[derive(Parser)]
#[command(
    name = "pug-room",
    version,
    about = "Queue players, balance 5v5 teams and run captain drafts",
    long_about = "Queues players for casual and competitive pick-up games. Full casual \
                 queues are split into the most even teams by TrueSkill match quality; \
                 the competitive queue gets a captain draft. Finished games feed \
                 ratings, history and monthly leaderboards."
)]
struct Args {
    /// TOML file with coordinator settings
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Tracing filter, e.g. `info` or `pug_room=debug`
    #[arg(short, long, value_name = "FILTER")]
    log_level: Option<String>,

    /// Seconds between idle queue sweeps
    #[arg(long, value_name = "SECONDS")]
    sweep_interval: Option<u64>,

    /// Seconds a player waits after a game before queueing again
    #[arg(long, value_name = "SECONDS")]
    requeue_delay: Option<u64>,

    /// Seconds between queue status reports, 0 to disable
    #[arg(long, value_name = "SECONDS", default_value = "300")]
    report_interval: u64,

    /// Shorthand for `--log-level debug`
    #[arg(short, long)]
    debug: bool,

    /// Check the configuration and exit
    #[arg(long)]
    check: bool,
}

impl Args {
    fn resolve_config(&self) -> Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::from_file(path)
                .with_context(|| format!("reading {}", path.display()))?,
            None => AppConfig::from_env()?,
        };

        if let Some(filter) = &self.log_level {
            config.service.log_level = filter.clone();
        }
        if self.debug {
            config.service.log_level = "debug".to_string();
        }
        if let Some(interval) = self.sweep_interval {
            config.service.sweep_interval_seconds = interval;
        }
        if let Some(delay) = self.requeue_delay {
            config.queue.requeue_delay_seconds = delay;
        }

        validate_config(&config)?;
        Ok(config)
    }
}

fn install_tracing(filter: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with_target(false)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow!("tracing subscriber already set: {}", e))
}

/// Resolves on SIGINT or, on unix, SIGTERM
async fn shutdown_requested() {
    let interrupt = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Cannot listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Cannot install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = interrupt => info!("Interrupted"),
        _ = terminate => info!("Terminated"),
    }
}

fn log_settings(config: &AppConfig) {
    info!(
        "{}: {}v{} from {} players, {} maps in pool",
        config.service.name,
        config.game.team_size,
        config.game.team_size,
        config.queue.capacity,
        config.maps.maps.len()
    );
    info!(
        "Shuffles per game: {}, re-queue delay: {}s, idle removal after {}s",
        config.game.shuffle_limit,
        config.queue.requeue_delay_seconds,
        config.queue.idle_timeout_seconds
    );
}

/// Log queue sizes and live games until shutdown is requested
async fn report_until_shutdown(coordinator: &Coordinator, every: Option<Duration>) {
    let Some(every) = every else {
        shutdown_requested().await;
        return;
    };

    let shutdown = shutdown_requested();
    tokio::pin!(shutdown);
    let mut ticker = tokio::time::interval(every);
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = &mut shutdown => return,
            _ = ticker.tick() => {
                let queued = coordinator.queues().counts();
                let live = coordinator.games().active_games(None);
                match (queued, live) {
                    (Ok(queued), Ok(live)) => {
                        info!("Queued: {:?}, live games: {}", queued, live.len())
                    }
                    (Err(e), _) | (_, Err(e)) => warn!("Status report failed: {}", e),
                }
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match args.resolve_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {:#}", e);
            std::process::exit(1);
        }
    };
    install_tracing(&config.service.log_level)?;
    log_settings(&config);

    if args.check {
        info!("Configuration is valid");
        return Ok(());
    }

    let mut coordinator = Coordinator::new(config).context("building coordinator")?;
    coordinator.start();
    info!("Coordinator running, Ctrl+C to stop");

    let every = (args.report_interval > 0).then(|| Duration::from_secs(args.report_interval));
    report_until_shutdown(&coordinator, every).await;

    if tokio::time::timeout(SHUTDOWN_GRACE, coordinator.shutdown())
        .await
        .is_err()
    {
        warn!("Shutdown took longer than {:?}, exiting anyway", SHUTDOWN_GRACE);
    }
    info!("Coordinator stopped");
    Ok(())
}
