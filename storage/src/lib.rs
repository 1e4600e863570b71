//! # tsdb-storage
//!
//! SQLite persistence layer for the smalltsdb engine: single-writer
//! connection management, idempotent schema bootstrap, the `quantile`
//! user-defined aggregate, and the Query API.

pub mod connection;
pub mod quantile;
pub mod queries;
pub mod schema;
pub mod store;

pub use connection::DatabaseManager;
pub use queries::rollup::RollupRow;
pub use store::Store;
