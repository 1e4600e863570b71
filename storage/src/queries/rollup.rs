//! Per-period rollup table queries.

use rusqlite::{params, Connection};
use tsdb_core::{Period, StorageError};

/// One finalized rollup row, ready to upsert.
#[derive(Debug, Clone, PartialEq)]
pub struct RollupRow {
    pub path: String,
    pub timestamp: f64,
    pub n: f64,
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    pub sum: f64,
    pub p50: f64,
    pub p90: f64,
    pub p99: f64,
}

/// `(path, last_final_timestamp)` pairs for every path currently present in
/// `incoming`, left-joined against this period's rollup table. `None` means
/// the path has no rollup row yet.
pub fn paths_with_last_final(
    conn: &Connection,
    period: Period,
) -> Result<Vec<(String, Option<f64>)>, StorageError> {
    let sql = format!(
        "SELECT i.path, MAX(r.timestamp)
         FROM (SELECT DISTINCT path FROM incoming) i
         LEFT JOIN {table} r ON r.path = i.path
         GROUP BY i.path",
        table = period.name(),
    );
    let mut stmt = conn.prepare_cached(&sql)?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, Option<f64>>(1)?))
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

/// Aggregate one path's incoming samples over `[start, end)` into one
/// `RollupRow` per bucket, using the `quantile` UDF for p50/p90/p99.
///
/// Table/column names interpolated here come only from `Period::name()`, a
/// fixed compile-time set, never from external input.
pub fn aggregate_buckets(
    conn: &Connection,
    period: Period,
    path: &str,
    start: f64,
    end: f64,
) -> Result<Vec<RollupRow>, StorageError> {
    let sql = format!(
        "SELECT
            CAST(timestamp AS INTEGER) / {seconds} * {seconds} AS bucket,
            COUNT(value), MIN(value), MAX(value), AVG(value), SUM(value),
            quantile(value, 0.5), quantile(value, 0.9), quantile(value, 0.99)
         FROM incoming
         WHERE path = ?1 AND timestamp >= ?2 AND timestamp < ?3
         GROUP BY bucket
         ORDER BY bucket",
        seconds = period.seconds(),
    );
    let mut stmt = conn.prepare_cached(&sql)?;
    let rows = stmt.query_map(params![path, start, end], |row| {
        Ok(RollupRow {
            path: path.to_string(),
            timestamp: row.get::<_, i64>(0)? as f64,
            n: row.get(1)?,
            min: row.get(2)?,
            max: row.get(3)?,
            avg: row.get(4)?,
            sum: row.get(5)?,
            p50: row.get(6)?,
            p90: row.get(7)?,
            p99: row.get(8)?,
        })
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row.map_err(|e| {
            if crate::quantile::is_quantile_group_changed(&e) {
                StorageError::QuantileGroupChanged
            } else {
                StorageError::from(e)
            }
        })?);
    }
    Ok(out)
}

/// Upsert keyed on `(path, timestamp)`.
pub fn upsert(conn: &Connection, period: Period, rows: &[RollupRow]) -> Result<(), StorageError> {
    let sql = format!(
        "INSERT INTO {table} (path, timestamp, n, min, max, avg, sum, p50, p90, p99)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
         ON CONFLICT (path, timestamp) DO UPDATE SET
            n = excluded.n, min = excluded.min, max = excluded.max,
            avg = excluded.avg, sum = excluded.sum,
            p50 = excluded.p50, p90 = excluded.p90, p99 = excluded.p99",
        table = period.name(),
    );
    let mut stmt = conn.prepare_cached(&sql)?;
    for r in rows {
        stmt.execute(params![
            r.path, r.timestamp, r.n, r.min, r.max, r.avg, r.sum, r.p50, r.p90, r.p99
        ])?;
    }
    Ok(())
}

/// Ordered `(timestamp, stat_value)` pairs in `[start, end]`.
pub fn select_range(
    conn: &Connection,
    period: Period,
    stat_column: &'static str,
    path: &str,
    start: f64,
    end: f64,
) -> Result<Vec<(f64, f64)>, StorageError> {
    let sql = format!(
        "SELECT timestamp, {stat} FROM {table}
         WHERE path = ?1 AND timestamp BETWEEN ?2 AND ?3
         ORDER BY timestamp",
        stat = stat_column,
        table = period.name(),
    );
    let mut stmt = conn.prepare_cached(&sql)?;
    let rows = stmt.query_map(params![path, start, end], |row| {
        Ok((row.get(0)?, row.get(1)?))
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

/// Every distinct path across every rollup table.
pub fn list_metrics(conn: &Connection) -> Result<Vec<String>, StorageError> {
    use tsdb_core::PERIODS;

    let union_sql = PERIODS
        .iter()
        .map(|p| format!("SELECT DISTINCT path FROM {}", p.name()))
        .collect::<Vec<_>>()
        .join(" UNION ");

    let mut stmt = conn.prepare_cached(&union_sql)?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}
