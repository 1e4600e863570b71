//! Engine configuration.
//!
//! Every field is optional and resolved through an `effective_*()` accessor
//! so a config file, CLI flags, and built-in defaults can layer cleanly.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TsdbConfig {
    /// Path to the SQLite database file. Default: "tsdb.db".
    pub db_path: Option<String>,
    /// UDP/TCP listen address, e.g. "127.0.0.1:1111". Default: "127.0.0.1:1111".
    pub listen_addr: Option<String>,
    /// Rollup tick cadence in seconds. Default: 10.
    pub tick_interval_secs: Option<u64>,
    /// Tail safety margin in seconds: a bucket only finalizes once `now` has
    /// moved past it by at least this much. Default: 60.
    pub tail_secs: Option<i64>,
    /// Prefix for self-metrics, e.g. "tsdb" -> "tsdb.insert". Empty string
    /// disables self-metrics. Default: "tsdb".
    pub self_metric_prefix: Option<String>,
    /// Bound on the in-process ingest queue. Default: 100_000.
    pub queue_bound: Option<usize>,
    /// Bound on the consumer's accumulator buffer. Default: 100_000.
    pub accumulator_bound: Option<usize>,
    /// Wall-clock budget for graceful shutdown, in seconds. Default: 5.
    pub shutdown_timeout_secs: Option<u64>,
    /// Cap on concurrently handled TCP connections. Default: 64.
    pub tcp_connection_cap: Option<usize>,
    /// Attach `incoming` as a second database file. Default: false.
    pub attach_incoming: Option<bool>,
}

impl TsdbConfig {
    pub fn load_from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    pub fn effective_db_path(&self) -> String {
        self.db_path.clone().unwrap_or_else(|| "tsdb.db".to_string())
    }

    pub fn effective_listen_addr(&self) -> String {
        self.listen_addr
            .clone()
            .unwrap_or_else(|| "127.0.0.1:1111".to_string())
    }

    pub fn effective_tick_interval_secs(&self) -> u64 {
        self.tick_interval_secs.unwrap_or(10)
    }

    pub fn effective_tail_secs(&self) -> i64 {
        self.tail_secs.unwrap_or(60)
    }

    /// `None` when self-metrics are disabled (prefix explicitly set to "").
    pub fn effective_self_metric_prefix(&self) -> Option<String> {
        match &self.self_metric_prefix {
            None => Some("tsdb".to_string()),
            Some(p) if p.is_empty() => None,
            Some(p) => Some(p.clone()),
        }
    }

    pub fn effective_queue_bound(&self) -> usize {
        self.queue_bound.unwrap_or(100_000)
    }

    pub fn effective_accumulator_bound(&self) -> usize {
        self.accumulator_bound.unwrap_or(100_000)
    }

    pub fn effective_shutdown_timeout_secs(&self) -> u64 {
        self.shutdown_timeout_secs.unwrap_or(5)
    }

    pub fn effective_tcp_connection_cap(&self) -> usize {
        self.tcp_connection_cap.unwrap_or(64)
    }

    pub fn effective_attach_incoming(&self) -> bool {
        self.attach_incoming.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_documented() {
        let cfg = TsdbConfig::default();
        assert_eq!(cfg.effective_tick_interval_secs(), 10);
        assert_eq!(cfg.effective_tail_secs(), 60);
        assert_eq!(cfg.effective_queue_bound(), 100_000);
        assert_eq!(cfg.effective_accumulator_bound(), 100_000);
        assert_eq!(cfg.effective_shutdown_timeout_secs(), 5);
        assert_eq!(cfg.effective_tcp_connection_cap(), 64);
        assert!(!cfg.effective_attach_incoming());
        assert_eq!(cfg.effective_self_metric_prefix(), Some("tsdb".to_string()));
    }

    #[test]
    fn empty_prefix_disables_self_metrics() {
        let mut cfg = TsdbConfig::default();
        cfg.self_metric_prefix = Some(String::new());
        assert_eq!(cfg.effective_self_metric_prefix(), None);
    }
}
