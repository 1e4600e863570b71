//! The Ingest Daemon: wires together the UDP/TCP listeners, the timer, and
//! the consumer around one bounded FIFO channel, and drives cooperative
//! shutdown within a bounded wall-clock budget.

use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::{TcpListener, UdpSocket};
use tokio::sync::{mpsc, watch};
use tokio::time;
use tracing::info;

use tsdb_core::{FatalError, TsdbConfig};
use tsdb_storage::Store;

use crate::consumer::run_consumer;
use crate::listeners::{run_tcp_listener, run_udp_listener};
use crate::message::Message;

/// How the daemon's `run()` concluded: maps to the process exit code, 0 for
/// clean shutdown and non-zero when the shutdown deadline was exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    CleanShutdown,
    ShutdownDeadlineExceeded,
}

pub struct IngestDaemonConfig {
    pub listen_addr: String,
    pub tick_interval: Duration,
    pub shutdown_timeout: Duration,
    pub queue_bound: usize,
    pub accumulator_bound: usize,
    pub tcp_connection_cap: usize,
    pub self_metric_prefix: Option<String>,
}

impl From<&TsdbConfig> for IngestDaemonConfig {
    fn from(cfg: &TsdbConfig) -> Self {
        IngestDaemonConfig {
            listen_addr: cfg.effective_listen_addr(),
            tick_interval: Duration::from_secs(cfg.effective_tick_interval_secs()),
            shutdown_timeout: Duration::from_secs(cfg.effective_shutdown_timeout_secs()),
            queue_bound: cfg.effective_queue_bound(),
            accumulator_bound: cfg.effective_accumulator_bound(),
            tcp_connection_cap: cfg.effective_tcp_connection_cap(),
            self_metric_prefix: cfg.effective_self_metric_prefix(),
        }
    }
}

pub struct IngestDaemon {
    store: Arc<Store>,
    config: IngestDaemonConfig,
}

impl IngestDaemon {
    pub fn new(store: Arc<Store>, config: IngestDaemonConfig) -> Self {
        IngestDaemon { store, config }
    }

    /// Binds both listeners, spawns every task, and blocks until a shutdown
    /// signal arrives and is handled (or the shutdown budget is exceeded).
    pub async fn run(&self) -> Result<ExitOutcome, FatalError> {
        let udp_socket =
            UdpSocket::bind(&self.config.listen_addr)
                .await
                .map_err(|source| FatalError::BindFailed {
                    transport: "udp",
                    addr: self.config.listen_addr.clone(),
                    source,
                })?;
        let tcp_listener =
            TcpListener::bind(&self.config.listen_addr)
                .await
                .map_err(|source| FatalError::BindFailed {
                    transport: "tcp",
                    addr: self.config.listen_addr.clone(),
                    source,
                })?;

        let (tx, rx) = mpsc::channel::<Message>(self.config.queue_bound);
        let overflow = Arc::new(AtomicU64::new(0));
        let (stop_tx, stop_rx) = watch::channel(false);

        let udp_task = tokio::spawn(run_udp_listener(
            udp_socket,
            tx.clone(),
            overflow.clone(),
            stop_rx.clone(),
        ));
        let tcp_task = tokio::spawn(run_tcp_listener(
            tcp_listener,
            tx.clone(),
            overflow.clone(),
            stop_rx.clone(),
            self.config.tcp_connection_cap,
        ));

        let timer_task = {
            let timer_tx = tx.clone();
            let tick_interval = self.config.tick_interval;
            tokio::spawn(async move {
                let mut interval = time::interval(tick_interval);
                interval.tick().await; // first tick fires immediately; consumed here
                loop {
                    interval.tick().await;
                    if timer_tx.send(Message::Tick).await.is_err() {
                        break;
                    }
                }
            })
        };

        let consumer_task = tokio::spawn(run_consumer(
            rx,
            self.store.clone(),
            overflow.clone(),
            self.config.self_metric_prefix.clone(),
            self.config.accumulator_bound,
        ));

        wait_for_shutdown_signal().await;
        info!("shutdown signal received, draining");

        let _ = stop_tx.send(true);
        let _ = tx.send(Message::Shutdown).await;
        timer_task.abort();

        let drained = time::timeout(self.config.shutdown_timeout, async {
            let _ = udp_task.await;
            let _ = tcp_task.await;
            let _ = consumer_task.await;
        })
        .await;

        match drained {
            Ok(()) => Ok(ExitOutcome::CleanShutdown),
            Err(_) => Ok(ExitOutcome::ShutdownDeadlineExceeded),
        }
    }
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};
    let mut term = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
    let mut int = signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");
    tokio::select! {
        _ = term.recv() => {}
        _ = int.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
