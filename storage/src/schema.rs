//! Idempotent schema bootstrap.

use rusqlite::Connection;
use tsdb_core::{StorageError, PERIODS};

pub fn bootstrap(conn: &Connection, attach_incoming: bool) -> Result<(), StorageError> {
    let incoming_schema = if attach_incoming { "aux" } else { "main" };

    conn.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS {incoming_schema}.incoming (
            path TEXT NOT NULL,
            timestamp REAL NOT NULL,
            value REAL NOT NULL
        );
        CREATE INDEX IF NOT EXISTS {incoming_schema}.idx_incoming_path_timestamp
            ON incoming (path, timestamp);"
    ))
    .map_err(|e| StorageError::SchemaError {
        message: e.to_string(),
    })?;

    for period in PERIODS {
        let name = period.name();
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS main.{name} (
                path TEXT NOT NULL,
                timestamp REAL NOT NULL,
                n REAL NOT NULL,
                min REAL NOT NULL,
                max REAL NOT NULL,
                avg REAL NOT NULL,
                sum REAL NOT NULL,
                p50 REAL NOT NULL,
                p90 REAL NOT NULL,
                p99 REAL NOT NULL,
                PRIMARY KEY (path, timestamp)
            ) WITHOUT ROWID;"
        ))
        .map_err(|e| StorageError::SchemaError {
            message: e.to_string(),
        })?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bootstrap_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        crate::quantile::register_quantile(&conn).unwrap();
        bootstrap(&conn, false).unwrap();
        bootstrap(&conn, false).unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='onesecond'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }
}
