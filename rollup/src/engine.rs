//! The periodic `sync` procedure. The engine owns no persistent state of
//! its own — every step is a function of what is already in the `Store`
//! plus the clock.

use tracing::warn;

use tsdb_core::{Period, Sample, Timing, PERIODS};
use tsdb_storage::Store;

use crate::interval::{final_is_nonempty, intervals};

/// `tail_seconds` delays finalization so that still-arriving samples for a
/// bucket don't get rolled up as if the bucket were closed. A
/// `self_metric_prefix` of `None` disables the engine's own timing samples;
/// `Some(prefix)` writes them back through `Store::insert` as ordinary
/// samples under `"{prefix}.*"`, which is why it never recurses into
/// `sync` itself — these timings are collected locally and only inserted
/// once, after the sync pass they describe has already finished.
pub struct RollupEngine {
    tail_seconds: i64,
    self_metric_prefix: Option<String>,
}

impl RollupEngine {
    pub fn new(tail_seconds: i64, self_metric_prefix: Option<String>) -> Self {
        RollupEngine {
            tail_seconds,
            self_metric_prefix,
        }
    }

    /// Runs the full sync procedure once, for every period in ladder order,
    /// then prunes `incoming`. A failure in one period's pass is logged and
    /// skipped; it does not prevent the remaining periods or the prune step
    /// from running.
    pub fn sync(&self, store: &Store, now: f64) {
        let mut timings: Vec<(String, f64)> = Vec::new();

        {
            let _all = Timing::start("sync.all", &mut timings);
            for period in PERIODS {
                if let Err(err) = self.sync_period(store, period, now, &mut timings) {
                    warn!(period = %period, error = %err, "rollup pass failed for period, skipping");
                }
            }

            let cutoff = now - self.tail_seconds as f64 - Period::max_seconds() as f64;
            let _prune = Timing::start("sync.delete_incoming_query", &mut timings);
            if let Err(err) = store.prune_incoming_older_than(cutoff) {
                warn!(error = %err, "pruning incoming failed");
            }
        }

        if let Some(prefix) = &self.self_metric_prefix {
            let samples: Vec<Sample> = timings
                .into_iter()
                .map(|(name, elapsed)| Sample::new(format!("{prefix}.{name}"), now, elapsed))
                .collect();
            if let Err(err) = store.insert(&samples) {
                warn!(error = %err, "failed to record rollup self-metrics");
            }
        }
    }

    /// For a single period: find every path's last final bucket, compute
    /// which new buckets are now final, aggregate and upsert them. Empty
    /// final intervals are skipped without touching the rollup table.
    fn sync_period(
        &self,
        store: &Store,
        period: Period,
        now: f64,
        timings: &mut Vec<(String, f64)>,
    ) -> Result<(), tsdb_core::StorageError> {
        let _period_all = Timing::start(format!("sync.{period}.all"), timings);

        let pairs = {
            let _t = Timing::start(format!("sync.{period}.finals_query"), timings);
            store.paths_with_last_final(period)?
        };

        let mut rows = Vec::new();
        for (path, last_final) in pairs {
            let ((final_start, final_end), _partial) =
                intervals(period.seconds(), self.tail_seconds, now, last_final);
            if !final_is_nonempty(final_start, final_end) {
                continue;
            }
            let mut bucket_rows = store.aggregate_buckets(period, &path, final_start, final_end)?;
            rows.append(&mut bucket_rows);
        }

        let _t = Timing::start(format!("sync.{period}.sync_query"), timings);
        store.upsert_rollup_rows(period, &rows)?;
        Ok(())
    }
}
