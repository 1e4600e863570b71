//! `incoming` table queries.

use rusqlite::{params, Connection};
use tsdb_core::{Sample, StorageError};

/// Transactional append. Caller owns the transaction boundary.
pub fn insert(conn: &Connection, samples: &[Sample]) -> Result<(), StorageError> {
    let mut stmt = conn.prepare_cached("INSERT INTO incoming (path, timestamp, value) VALUES (?1, ?2, ?3)")?;
    for s in samples {
        stmt.execute(params![s.path, s.timestamp, s.value])?;
    }
    Ok(())
}

/// Delete rows older than `cutoff` — the sole retention mechanism.
/// Returns the number of rows removed.
pub fn delete_older_than(conn: &Connection, cutoff: f64) -> Result<usize, StorageError> {
    let n = conn.execute("DELETE FROM incoming WHERE timestamp < ?1", params![cutoff])?;
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema;

    fn open() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        crate::quantile::register_quantile(&conn).unwrap();
        schema::bootstrap(&conn, false).unwrap();
        conn
    }

    #[test]
    fn insert_accepts_multiple_samples_in_one_transaction() {
        let conn = open();
        insert(
            &conn,
            &[
                Sample::new("one", 1.0, 1.0),
                Sample::new("two", 5.0, 2.0),
                Sample::new("one", 2.0, 5.0),
            ],
        )
        .unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM incoming", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 3);
    }

    #[test]
    fn delete_older_than_prunes_correctly() {
        let conn = open();
        insert(
            &conn,
            &[Sample::new("one", 1.0, 1.0), Sample::new("one", 100.0, 1.0)],
        )
        .unwrap();
        let removed = delete_older_than(&conn, 50.0).unwrap();
        assert_eq!(removed, 1);

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM incoming", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }
}
