//! # tsdb-core
//!
//! Foundation crate for the smalltsdb ingest-and-rollup engine.
//! Defines the sample type, the period ladder, the stat set, configuration,
//! errors, and the tracing/locking helpers every other crate builds on.

pub mod config;
pub mod errors;
pub mod lock;
pub mod period;
pub mod sample;
pub mod timing;
pub mod tracing_init;

pub use config::TsdbConfig;
pub use errors::{ArgumentError, FatalError, OverflowError, ParseError, StorageError};
pub use lock::{AdvisoryLock, LockError};
pub use period::{Period, Stat, PERIODS, STATS};
pub use sample::Sample;
pub use timing::Timing;
