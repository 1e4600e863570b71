//! The consumer task: the only task that ever calls into the Store.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::sync::mpsc;
use tracing::warn;
use tsdb_core::{OverflowError, Sample};
use tsdb_storage::Store;

use crate::message::Message;

fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

/// Runs until the channel is closed or a `Shutdown` message is received,
/// then performs one final drain before returning.
pub async fn run_consumer(
    mut rx: mpsc::Receiver<Message>,
    store: Arc<Store>,
    overflow: Arc<AtomicU64>,
    self_metric_prefix: Option<String>,
    accumulator_bound: usize,
) {
    let mut buffer: Vec<Sample> = Vec::new();
    // Self-metric samples describing the *previous* tick's outcome; flushed
    // on the *next* tick so they roll up like any other metric rather than
    // recursing into the count they are describing.
    let mut pending_self_metrics: Vec<Sample> = Vec::new();

    loop {
        match rx.recv().await {
            Some(Message::SampleBatch(mut samples)) => {
                if buffer.len() + samples.len() > accumulator_bound {
                    overflow.fetch_add(1, Ordering::Relaxed);
                    warn!(error = %OverflowError::AccumulatorFull, "dropping batch");
                    continue;
                }
                buffer.append(&mut samples);
            }
            Some(Message::Tick) => {
                flush(
                    &store,
                    &overflow,
                    &self_metric_prefix,
                    &mut buffer,
                    &mut pending_self_metrics,
                )
                .await;
            }
            Some(Message::Shutdown) | None => {
                flush(
                    &store,
                    &overflow,
                    &self_metric_prefix,
                    &mut buffer,
                    &mut pending_self_metrics,
                )
                .await;
                break;
            }
        }
    }
}

async fn flush(
    store: &Arc<Store>,
    overflow: &Arc<AtomicU64>,
    self_metric_prefix: &Option<String>,
    buffer: &mut Vec<Sample>,
    pending_self_metrics: &mut Vec<Sample>,
) {
    let now = now_secs();
    let overflow_count = overflow.swap(0, Ordering::Relaxed);

    if let Some(prefix) = self_metric_prefix {
        if overflow_count > 0 {
            pending_self_metrics.push(Sample::new(format!("{prefix}.overflow"), now, overflow_count as f64));
        }
    }

    if buffer.is_empty() && pending_self_metrics.is_empty() {
        return;
    }

    let non_self_count = buffer.len();
    let mut batch = std::mem::take(buffer);
    batch.append(pending_self_metrics);

    let store = store.clone();
    let result = tokio::task::spawn_blocking(move || {
        let result = store.insert(&batch);
        (batch, result)
    })
    .await;

    match result {
        Ok((_batch, Ok(()))) => {
            if let Some(prefix) = self_metric_prefix {
                pending_self_metrics.push(Sample::new(format!("{prefix}.insert"), now, non_self_count as f64));
            }
        }
        Ok((mut batch, Err(err))) => {
            warn!(error = %err, "insert failed, keeping buffer for retry");
            // `batch` is `buffer`'s samples followed by the self-metric samples
            // appended above; split them back apart so the next flush's
            // non-self count doesn't count leftover self-metrics as ordinary
            // samples.
            *pending_self_metrics = batch.split_off(non_self_count);
            *buffer = batch;
            if let Some(prefix) = self_metric_prefix {
                pending_self_metrics.push(Sample::new(format!("{prefix}.error"), now, 1.0));
            }
        }
        Err(join_err) => {
            warn!(error = %join_err, "insert task panicked, buffer lost for this tick");
        }
    }
}
