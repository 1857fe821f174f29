//! Service configuration
//!
//! Loaded once from a JSON file and validated before any component is
//! built. Every field except the store and checkpoint locations has a
//! default.
//!
//! ```text
//! {
//!   "store": {"records_path": "./records.jsonl"},
//!   "checkpoint": {"dir": "./state"},
//!   "pagination": {"filter_page_size": 200},
//!   "filters_path": "./camera-info.json",
//!   "graph": {"excluded_cameras": ["garage", "crawlspace"]}
//! }
//! ```

mod errors;

pub use errors::{ConfigError, ConfigResult};

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::checkpoint::DEFAULT_CHECKPOINT_NAME;

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub store: StoreConfig,

    pub checkpoint: CheckpointConfig,

    #[serde(default)]
    pub ingest: IngestConfig,

    #[serde(default)]
    pub pagination: PaginationConfig,

    /// Camera metadata document holding named filters (optional)
    #[serde(default)]
    pub filters_path: Option<PathBuf>,

    #[serde(default)]
    pub graph: GraphConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Record store location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// JSON-lines record file
    pub records_path: PathBuf,
}

/// Checkpoint blob location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointConfig {
    /// Root directory of the checkpoint store
    pub dir: PathBuf,

    /// Blob name (default: "status/label_to_graph_checkpoint")
    #[serde(default = "default_object_name")]
    pub object_name: String,
}

/// Ingestion loop settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Records per store request (default: 100)
    #[serde(default = "default_items_per_batch")]
    pub items_per_batch: usize,

    /// Sleep between cycles (default: 300)
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Wait before a bootstrap starts, to allow an operator abort (default: 20)
    #[serde(default = "default_bootstrap_grace_secs")]
    pub bootstrap_grace_secs: u64,

    /// Attributes fetched from the store; all when absent
    #[serde(default)]
    pub projection: Option<Vec<String>>,
}

/// Pagination settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginationConfig {
    /// `num_results` when the caller gives none (default: 10)
    #[serde(default = "default_num_results")]
    pub default_num_results: usize,

    /// Largest accepted `num_results` (default: 1000)
    #[serde(default = "default_max_num_results")]
    pub max_num_results: usize,

    /// Raw page size per store query while a filter is active (default: 100)
    #[serde(default = "default_filter_page_size")]
    pub filter_page_size: usize,

    /// Store queries allowed per request (default: 25)
    #[serde(default = "default_max_store_requests")]
    pub max_store_requests: usize,

    /// Day rollovers allowed per request (default: 7)
    #[serde(default = "default_max_partition_walk")]
    pub max_partition_walk: usize,

    /// Oldest day that may hold data; older traversal is exhausted past it
    #[serde(default)]
    pub earliest_date: Option<NaiveDate>,
}

/// Graph sink settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Statement outbox file; statements are kept in memory when absent
    #[serde(default)]
    pub outbox_path: Option<PathBuf>,

    /// Cameras whose records are never written to the graph
    #[serde(default)]
    pub excluded_cameras: Vec<String>,

    /// Offset of capture timestamps in file names from UTC (default: 0)
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive (default: "info")
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,
}

fn default_object_name() -> String {
    DEFAULT_CHECKPOINT_NAME.to_string()
}
fn default_items_per_batch() -> usize {
    100
}
fn default_poll_interval_secs() -> u64 {
    300
}
fn default_bootstrap_grace_secs() -> u64 {
    20
}
fn default_num_results() -> usize {
    10
}
fn default_max_num_results() -> usize {
    1000
}
fn default_filter_page_size() -> usize {
    100
}
fn default_max_store_requests() -> usize {
    25
}
fn default_max_partition_walk() -> usize {
    7
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            items_per_batch: default_items_per_batch(),
            poll_interval_secs: default_poll_interval_secs(),
            bootstrap_grace_secs: default_bootstrap_grace_secs(),
            projection: None,
        }
    }
}

impl IngestConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn bootstrap_grace(&self) -> Duration {
        Duration::from_secs(self.bootstrap_grace_secs)
    }
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_num_results: default_num_results(),
            max_num_results: default_max_num_results(),
            filter_page_size: default_filter_page_size(),
            max_store_requests: default_max_store_requests(),
            max_partition_walk: default_max_partition_walk(),
            earliest_date: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

impl IngestConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.items_per_batch == 0 {
            return Err(ConfigError::invalid("ingest.items_per_batch", "must be at least 1"));
        }
        if self.poll_interval_secs == 0 {
            return Err(ConfigError::invalid("ingest.poll_interval_secs", "must be at least 1"));
        }
        if let Some(fields) = &self.projection {
            if fields.iter().any(|f| f.trim().is_empty()) {
                return Err(ConfigError::invalid("ingest.projection", "empty attribute name"));
            }
        }
        Ok(())
    }
}

impl PaginationConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_num_results == 0 {
            return Err(ConfigError::invalid("pagination.max_num_results", "must be at least 1"));
        }
        if self.default_num_results == 0 || self.default_num_results > self.max_num_results {
            return Err(ConfigError::invalid(
                "pagination.default_num_results",
                format!("must be between 1 and {}", self.max_num_results),
            ));
        }
        if self.filter_page_size == 0 {
            return Err(ConfigError::invalid("pagination.filter_page_size", "must be at least 1"));
        }
        if self.max_store_requests == 0 {
            return Err(ConfigError::invalid(
                "pagination.max_store_requests",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

impl GraphConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.utc_offset_minutes.abs() >= 24 * 60 {
            return Err(ConfigError::invalid(
                "graph.utc_offset_minutes",
                "must be less than one day",
            ));
        }
        Ok(())
    }
}

impl ServiceConfig {
    /// Load and validate a configuration file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&content)
    }

    /// Parse and validate a configuration document
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: ServiceConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.checkpoint.object_name.trim().is_empty() {
            return Err(ConfigError::invalid("checkpoint.object_name", "must not be empty"));
        }
        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::invalid("logging.level", "must not be empty"));
        }
        self.ingest.validate()?;
        self.pagination.validate()?;
        self.graph.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MINIMAL: &str = r#"{
        "store": {"records_path": "/data/records.jsonl"},
        "checkpoint": {"dir": "/data/state"}
    }"#;

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::from_json(MINIMAL).unwrap();

        assert_eq!(config.checkpoint.object_name, "status/label_to_graph_checkpoint");
        assert_eq!(config.ingest.items_per_batch, 100);
        assert_eq!(config.ingest.poll_interval(), Duration::from_secs(300));
        assert_eq!(config.ingest.bootstrap_grace(), Duration::from_secs(20));
        assert_eq!(config.pagination, PaginationConfig::default());
        assert_eq!(config.pagination.filter_page_size, 100);
        assert_eq!(config.logging.format, LogFormat::Text);
        assert!(config.filters_path.is_none());
    }

    #[test]
    fn test_overrides() {
        let json = r#"{
            "store": {"records_path": "r.jsonl"},
            "checkpoint": {"dir": "s", "object_name": "cp"},
            "pagination": {"earliest_date": "2024-01-01", "max_partition_walk": 30},
            "graph": {"excluded_cameras": ["garage"], "utc_offset_minutes": -300},
            "logging": {"level": "debug", "format": "json"}
        }"#;
        let config = ServiceConfig::from_json(json).unwrap();

        assert_eq!(
            config.pagination.earliest_date,
            NaiveDate::from_ymd_opt(2024, 1, 1)
        );
        assert_eq!(config.pagination.max_partition_walk, 30);
        assert_eq!(config.graph.excluded_cameras, vec!["garage"]);
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_missing_store_is_parse_error() {
        let err = ServiceConfig::from_json(r#"{"checkpoint": {"dir": "s"}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_out_of_range_values() {
        let cases = [
            (r#""ingest": {"items_per_batch": 0}"#, "ingest.items_per_batch"),
            (r#""pagination": {"default_num_results": 0}"#, "pagination.default_num_results"),
            (r#""pagination": {"max_num_results": 5, "default_num_results": 10}"#, "pagination.default_num_results"),
            (r#""pagination": {"max_store_requests": 0}"#, "pagination.max_store_requests"),
            (r#""graph": {"utc_offset_minutes": 1440}"#, "graph.utc_offset_minutes"),
        ];

        for (fragment, expected) in cases {
            let json = format!(
                r#"{{"store": {{"records_path": "r"}}, "checkpoint": {{"dir": "s"}}, {}}}"#,
                fragment
            );
            match ServiceConfig::from_json(&json) {
                Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, expected),
                other => panic!("expected invalid {}, got {:?}", expected, other),
            }
        }
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(MINIMAL.as_bytes()).unwrap();
        assert!(ServiceConfig::load(file.path()).is_ok());

        let err = ServiceConfig::load(Path::new("/nonexistent/captureline.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
