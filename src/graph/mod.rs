//! Graph statement sink
//!
//! Ingested label records become idempotent MERGE statements with typed
//! parameters. The driver that talks to the graph database lives outside
//! this crate; statements reach it through a `StatementExecutor`.

mod errors;
mod label;
mod sink;
mod statement;

pub use errors::{GraphError, GraphResult};
pub use label::{parse_camera, parse_capture_time, LabelEvent};
pub use sink::{GraphSink, MemoryGraph, StatementExecutor, StatementOutbox};
pub use statement::{label_statement, Param, Statement, StatementBuilder};

use regex::Regex;

fn compile_pattern(pattern: &str) -> GraphResult<Regex> {
    Regex::new(pattern).map_err(|e| GraphError::InvalidPattern(format!("{}: {}", pattern, e)))
}

/// Compile every pattern record processing depends on
pub(crate) fn check_patterns() -> GraphResult<()> {
    label::capture_suffix()?;
    statement::placeholder()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_patterns_compile() {
        assert_eq!(check_patterns(), Ok(()));
    }

    #[test]
    fn test_bad_pattern_is_reported() {
        assert!(matches!(
            compile_pattern(r"_(\d{8}"),
            Err(GraphError::InvalidPattern(_))
        ));
    }
}
