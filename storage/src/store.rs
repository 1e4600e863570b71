//! The Store: schema bootstrap, the `quantile` UDF, single-writer
//! discipline, and the Query API. Owns a connection manager and exposes
//! `open`/`open_in_memory`/`close`/`path` plus the read and write paths.

use std::path::Path;

use tsdb_core::{ArgumentError, Period, Sample, Stat, StorageError};

use crate::connection::DatabaseManager;
use crate::queries::rollup::RollupRow;
use crate::queries::{incoming, rollup};

pub struct Store {
    db: DatabaseManager,
}

impl Store {
    pub fn open(path: &Path, attach_incoming: bool) -> Result<Self, StorageError> {
        Ok(Store {
            db: DatabaseManager::open(path, attach_incoming)?,
        })
    }

    /// Opening the store twice against the same path succeeds; schema
    /// creation is a no-op the second time (`bootstrap` is all
    /// `CREATE ... IF NOT EXISTS`).
    pub fn open_in_memory() -> Result<Self, StorageError> {
        Ok(Store {
            db: DatabaseManager::open_in_memory()?,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.db.path()
    }

    /// Transactional append, all-or-none. The Ingest Daemon's consumer task
    /// is the only caller; this is a plain blocking call, not a backgrounded
    /// write — there is no writer thread sitting between this and the caller.
    pub fn insert(&self, samples: &[Sample]) -> Result<(), StorageError> {
        if samples.is_empty() {
            return Ok(());
        }
        self.db.with_writer(|conn| {
            let tx = conn.unchecked_transaction()?;
            incoming::insert(&tx, samples)?;
            tx.commit()?;
            Ok(())
        })
    }

    /// `start`/`end` are epoch seconds; callers converting from date-times
    /// do so before calling this.
    pub fn get_metric(
        &self,
        path: &str,
        period: Period,
        stat: Stat,
        start: f64,
        end: f64,
    ) -> Result<Vec<(f64, f64)>, StorageError> {
        if start > end {
            return Err(StorageError::NotSupported {
                operation: "get_metric".to_string(),
                reason: ArgumentError::InvertedInterval { start, end }.to_string(),
            });
        }
        self.db
            .with_reader(|conn| rollup::select_range(conn, period, stat.column(), path, start, end))
    }

    /// Union of distinct `path` across all rollup tables.
    pub fn list_metrics(&self) -> Result<Vec<String>, StorageError> {
        self.db.with_reader(rollup::list_metrics)
    }

    /// Idempotent: safe to call more than once.
    pub fn close(&self) -> Result<(), StorageError> {
        self.db.checkpoint()
    }

    // ── Rollup Engine entry points. The Rollup Engine owns no persistent
    // state; every step below is a function of Store contents. ──

    pub fn paths_with_last_final(
        &self,
        period: Period,
    ) -> Result<Vec<(String, Option<f64>)>, StorageError> {
        self.db
            .with_reader(|conn| rollup::paths_with_last_final(conn, period))
    }

    pub fn aggregate_buckets(
        &self,
        period: Period,
        path: &str,
        start: f64,
        end: f64,
    ) -> Result<Vec<RollupRow>, StorageError> {
        self.db
            .with_reader(|conn| rollup::aggregate_buckets(conn, period, path, start, end))
    }

    /// One transaction per period pass: all rows for this period upsert
    /// atomically, or none do.
    pub fn upsert_rollup_rows(&self, period: Period, rows: &[RollupRow]) -> Result<(), StorageError> {
        if rows.is_empty() {
            return Ok(());
        }
        self.db.with_writer(|conn| {
            let tx = conn.unchecked_transaction()?;
            rollup::upsert(&tx, period, rows)?;
            tx.commit()?;
            Ok(())
        })
    }

    /// The sole retention mechanism: called once per sync pass after every
    /// period's buckets have been finalized.
    pub fn prune_incoming_older_than(&self, cutoff: f64) -> Result<usize, StorageError> {
        self.db.with_writer(|conn| incoming::delete_older_than(conn, cutoff))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s6_idempotent_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tsdb.db");
        {
            let store = Store::open(&path, false).unwrap();
            store.close().unwrap();
        }
        let store = Store::open(&path, false).unwrap();
        store.close().unwrap();
    }

    #[test]
    fn insert_then_get_metric_round_trips_through_upsert() {
        let store = Store::open_in_memory().unwrap();
        store
            .insert(&[Sample::new("one", 0.0, 1.0), Sample::new("one", 0.0, 5.0)])
            .unwrap();
        let rows = store
            .aggregate_buckets(Period::TenSecond, "one", 0.0, 10.0)
            .unwrap();
        store.upsert_rollup_rows(Period::TenSecond, &rows).unwrap();

        let n = store
            .get_metric("one", Period::TenSecond, Stat::N, 0.0, 10.0)
            .unwrap();
        assert_eq!(n, vec![(0.0, 2.0)]);
    }

    #[test]
    fn get_metric_rejects_inverted_interval() {
        let store = Store::open_in_memory().unwrap();
        let err = store.get_metric("one", Period::TenSecond, Stat::N, 10.0, 0.0);
        assert!(err.is_err());
    }

    #[test]
    fn empty_incoming_list_metrics_is_empty_not_error() {
        let store = Store::open_in_memory().unwrap();
        assert_eq!(store.list_metrics().unwrap(), Vec::<String>::new());
    }
}
