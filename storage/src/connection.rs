//! Connection management: single-writer discipline with per-call reader
//! connections.
//!
//! `DatabaseManager` owns the one write connection and mints fresh reader
//! connections on demand via `with_reader`/`with_writer`.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rusqlite::Connection;
use tsdb_core::StorageError;

use crate::quantile::register_quantile;
use crate::schema;

/// Owns the single write connection and knows how to mint reader
/// connections. File-backed databases use WAL so readers never block the
/// writer and vice versa; the in-memory variant (tests) has exactly one
/// connection, reused for both roles, since a second in-memory connection
/// would open an unrelated, empty database.
pub struct DatabaseManager {
    write: Mutex<Connection>,
    path: Option<PathBuf>,
    attach_incoming: bool,
}

impl DatabaseManager {
    pub fn open(path: &Path, attach_incoming: bool) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        Self::configure(&conn, attach_incoming, Some(path))?;
        schema::bootstrap(&conn, attach_incoming)?;
        Ok(DatabaseManager {
            write: Mutex::new(conn),
            path: Some(path.to_path_buf()),
            attach_incoming,
        })
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        Self::configure(&conn, false, None)?;
        schema::bootstrap(&conn, false)?;
        Ok(DatabaseManager {
            write: Mutex::new(conn),
            path: None,
            attach_incoming: false,
        })
    }

    fn configure(
        conn: &Connection,
        attach_incoming: bool,
        path: Option<&Path>,
    ) -> Result<(), StorageError> {
        register_quantile(conn)?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        if let Some(path) = path {
            conn.pragma_update(None, "journal_mode", "WAL")?;
            conn.pragma_update(None, "synchronous", "NORMAL")?;
            if attach_incoming {
                let incoming_path = format!("{}.incoming", path.display());
                conn.execute("ATTACH DATABASE ?1 AS aux", [incoming_path])?;
            }
        }
        Ok(())
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Run `f` against the single write connection.
    pub fn with_writer<F, T>(&self, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&Connection) -> Result<T, StorageError>,
    {
        let conn = self.write.lock().expect("write connection mutex poisoned");
        f(&conn)
    }

    /// Run `f` against a reader connection: a fresh connection for
    /// file-backed databases (WAL allows concurrent readers), or the
    /// shared connection for in-memory databases.
    pub fn with_reader<F, T>(&self, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&Connection) -> Result<T, StorageError>,
    {
        match &self.path {
            Some(path) => {
                let conn = Connection::open(path)?;
                Self::configure(&conn, self.attach_incoming, Some(path))?;
                f(&conn)
            }
            None => {
                let conn = self.write.lock().expect("write connection mutex poisoned");
                f(&conn)
            }
        }
    }

    pub fn checkpoint(&self) -> Result<(), StorageError> {
        self.with_writer(|conn| {
            conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
            Ok(())
        })
    }
}
