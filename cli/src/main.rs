//! The process/CLI wrapper: argument parsing, config loading, logging
//! setup, and the two external entry points, `daemon` and `sync`.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::{Parser, Subcommand};
use tracing::error;

use tsdb_core::{AdvisoryLock, TsdbConfig};
use tsdb_ingest::{ExitOutcome, IngestDaemon, IngestDaemonConfig};
use tsdb_rollup::RollupEngine;
use tsdb_storage::Store;

#[derive(Parser, Debug)]
#[command(name = "tsdb", version, about = "Ingest-and-rollup time-series engine")]
struct Cli {
    /// Path to the TOML config file. A missing file falls back to built-in
    /// defaults.
    #[arg(long, env = "TSDB_CONFIG", default_value = "tsdb.toml")]
    config: PathBuf,

    /// Path to the SQLite database file. Overrides the config file.
    #[arg(long)]
    db_path: Option<String>,

    /// UDP/TCP listen address, e.g. "127.0.0.1:1111". Overrides the config file.
    #[arg(long)]
    listen_addr: Option<String>,

    /// Rollup tick cadence in seconds. Overrides the config file.
    #[arg(long)]
    tick_interval_secs: Option<u64>,

    /// Tail safety margin in seconds. Overrides the config file.
    #[arg(long)]
    tail_secs: Option<i64>,

    /// Prefix for self-metrics; pass an empty string to disable them.
    /// Overrides the config file.
    #[arg(long)]
    self_metric_prefix: Option<String>,

    /// Bound on the in-process ingest queue. Overrides the config file.
    #[arg(long)]
    queue_bound: Option<usize>,

    /// Bound on the consumer's accumulator buffer. Overrides the config file.
    #[arg(long)]
    accumulator_bound: Option<usize>,

    /// Wall-clock budget for graceful shutdown, in seconds. Overrides the
    /// config file.
    #[arg(long)]
    shutdown_timeout_secs: Option<u64>,

    /// Cap on concurrently handled TCP connections. Overrides the config file.
    #[arg(long)]
    tcp_connection_cap: Option<usize>,

    /// Attach `incoming` as a second database file. Overrides the config file.
    #[arg(long)]
    attach_incoming: Option<bool>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the Ingest Daemon against the configured database path.
    Daemon,
    /// Run one pass of the Rollup Engine.
    Sync {
        /// Cross-process advisory lock file; exits non-zero if already held.
        #[arg(long)]
        lock_file: Option<PathBuf>,
    },
}

fn load_config(path: &std::path::Path) -> TsdbConfig {
    match TsdbConfig::load_from_file(path) {
        Ok(cfg) => cfg,
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "using built-in defaults");
            TsdbConfig::default()
        }
    }
}

/// Layers explicit CLI flags over a loaded config: any flag the user passed
/// wins over the value from the config file (which itself already won over
/// the built-in default inside `TsdbConfig`'s `effective_*()` accessors).
fn apply_overrides(mut config: TsdbConfig, cli: &Cli) -> TsdbConfig {
    if cli.db_path.is_some() {
        config.db_path = cli.db_path.clone();
    }
    if cli.listen_addr.is_some() {
        config.listen_addr = cli.listen_addr.clone();
    }
    if cli.tick_interval_secs.is_some() {
        config.tick_interval_secs = cli.tick_interval_secs;
    }
    if cli.tail_secs.is_some() {
        config.tail_secs = cli.tail_secs;
    }
    if cli.self_metric_prefix.is_some() {
        config.self_metric_prefix = cli.self_metric_prefix.clone();
    }
    if cli.queue_bound.is_some() {
        config.queue_bound = cli.queue_bound;
    }
    if cli.accumulator_bound.is_some() {
        config.accumulator_bound = cli.accumulator_bound;
    }
    if cli.shutdown_timeout_secs.is_some() {
        config.shutdown_timeout_secs = cli.shutdown_timeout_secs;
    }
    if cli.tcp_connection_cap.is_some() {
        config.tcp_connection_cap = cli.tcp_connection_cap;
    }
    if cli.attach_incoming.is_some() {
        config.attach_incoming = cli.attach_incoming;
    }
    config
}

fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

#[tokio::main]
async fn main() -> ExitCode {
    tsdb_core::tracing_init::init_tracing();

    let cli = Cli::parse();
    let config = apply_overrides(load_config(&cli.config), &cli);

    match cli.command {
        Command::Daemon => run_daemon(&config).await,
        Command::Sync { lock_file } => run_sync(&config, lock_file),
    }
}

async fn run_daemon(config: &TsdbConfig) -> ExitCode {
    let store = match Store::open(
        std::path::Path::new(&config.effective_db_path()),
        config.effective_attach_incoming(),
    ) {
        Ok(store) => Arc::new(store),
        Err(err) => {
            error!(error = %err, "cannot open database");
            return ExitCode::FAILURE;
        }
    };

    let daemon = IngestDaemon::new(store, IngestDaemonConfig::from(config));
    match daemon.run().await {
        Ok(ExitOutcome::CleanShutdown) => ExitCode::SUCCESS,
        Ok(ExitOutcome::ShutdownDeadlineExceeded) => {
            error!("shutdown deadline exceeded");
            ExitCode::FAILURE
        }
        Err(err) => {
            error!(error = %err, "fatal error starting daemon");
            ExitCode::FAILURE
        }
    }
}

fn run_sync(config: &TsdbConfig, lock_file: Option<PathBuf>) -> ExitCode {
    let mut lock = match &lock_file {
        Some(path) => match AdvisoryLock::open(path) {
            Ok(lock) => Some(lock),
            Err(err) => {
                error!(error = %err, "cannot open lock file");
                return ExitCode::FAILURE;
            }
        },
        None => None,
    };

    let _guard = match &mut lock {
        Some(lock) => match lock.try_acquire() {
            Ok(guard) => Some(guard),
            Err(err) => {
                error!(error = %err, "sync already running, exiting");
                return ExitCode::FAILURE;
            }
        },
        None => None,
    };

    let store = match Store::open(
        std::path::Path::new(&config.effective_db_path()),
        config.effective_attach_incoming(),
    ) {
        Ok(store) => store,
        Err(err) => {
            error!(error = %err, "cannot open database");
            return ExitCode::FAILURE;
        }
    };

    let engine = RollupEngine::new(config.effective_tail_secs(), config.effective_self_metric_prefix());
    engine.sync(&store, now_secs());

    if let Err(err) = store.close() {
        error!(error = %err, "failed to checkpoint database on close");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
