//! Observability subsystem
//!
//! - Structured logging through `tracing`, text or JSON
//! - Typed lifecycle event names
//! - Atomic operational counters
//!
//! # Usage
//!
//! ```ignore
//! use captureline::observability::{Event, MetricsRegistry};
//!
//! tracing::info!(event = %Event::CheckpointPersisted, max_timestamp = 1200, "checkpoint persisted");
//!
//! let metrics = MetricsRegistry::new();
//! metrics.increment_checkpoints_persisted();
//! ```

mod events;
mod metrics;

pub use events::Event;
pub use metrics::{MetricsRegistry, MetricsSnapshot};

use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingConfig};

/// Install the global subscriber.
///
/// `RUST_LOG` overrides the configured level. Output goes to stderr so
/// stdout stays reserved for command responses. Calling this twice is a
/// no-op; the first subscriber wins.
pub fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::builder().parse_lossy(&config.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    let result = match config.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.try_init(),
    };

    if result.is_err() {
        tracing::debug!("global subscriber already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_twice_does_not_panic() {
        let config = LoggingConfig::default();
        init_logging(&config);
        init_logging(&config);
        tracing::info!(event = %Event::ConfigLoaded, "logging ready");
    }
}
