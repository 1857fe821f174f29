//! Parameterized graph statements
//!
//! Statement text carries `$name` placeholders; values travel separately
//! as typed parameters, so record content never becomes statement text.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::errors::{GraphError, GraphResult};
use super::label::LabelEvent;

static PLACEHOLDER: OnceLock<GraphResult<Regex>> = OnceLock::new();

pub(crate) fn placeholder() -> GraphResult<&'static Regex> {
    PLACEHOLDER
        .get_or_init(|| super::compile_pattern(r"\$([A-Za-z_][A-Za-z0-9_]*)"))
        .as_ref()
        .map_err(Clone::clone)
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// A typed statement parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Param {
    Int(i64),
    Float(f64),
    Str(String),
}

impl From<i64> for Param {
    fn from(value: i64) -> Self {
        Param::Int(value)
    }
}

impl From<f64> for Param {
    fn from(value: f64) -> Self {
        Param::Float(value)
    }
}

impl From<&str> for Param {
    fn from(value: &str) -> Self {
        Param::Str(value.to_string())
    }
}

impl From<String> for Param {
    fn from(value: String) -> Self {
        Param::Str(value)
    }
}

/// Statement text plus its bound parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    pub text: String,
    pub params: BTreeMap<String, Param>,
}

/// Builds a statement line by line
#[derive(Debug, Default)]
pub struct StatementBuilder {
    lines: Vec<String>,
    params: BTreeMap<String, Param>,
}

impl StatementBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line(mut self, text: impl Into<String>) -> Self {
        self.lines.push(text.into());
        self
    }

    /// Bind a parameter; a later bind of the same name replaces it
    pub fn bind(mut self, name: impl Into<String>, value: impl Into<Param>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Check placeholders against bindings and produce the statement
    pub fn build(self) -> GraphResult<Statement> {
        let text = self.lines.join("\n");

        if let Some(bad) = self.params.keys().find(|name| !is_identifier(name)) {
            return Err(GraphError::InvalidParameterName(bad.clone()));
        }

        let referenced: BTreeSet<&str> = placeholder()?
            .captures_iter(&text)
            .filter_map(|c| c.get(1).map(|m| m.as_str()))
            .collect();

        if let Some(missing) = referenced.iter().find(|name| !self.params.contains_key(**name)) {
            return Err(GraphError::UnboundParameter(missing.to_string()));
        }
        if let Some(unused) = self
            .params
            .keys()
            .find(|name| !referenced.contains(name.as_str()))
        {
            return Err(GraphError::UnusedParameter(unused.clone()));
        }

        Ok(Statement {
            text,
            params: self.params,
        })
    }
}

/// MERGE statement linking an image to its camera, label and time nodes.
///
/// Every clause is a MERGE, so applying it twice has no further effect.
pub fn label_statement(event: &LabelEvent) -> GraphResult<Statement> {
    StatementBuilder::new()
        .line("MERGE (camera:Camera {camera_name: $camera})")
        .line("MERGE (image:Image {object_key: $object_key, isodate: $iso_date, timestamp: $event_ts})")
        .line("MERGE (label:Label {label_name: $label})")
        .line("MERGE (isodate:ISODate {iso_date: $iso_date})")
        .line("MERGE (year:Year {year_value: $year})")
        .line("MERGE (month:Month {month_value: $month})")
        .line("MERGE (day:Day {day_value: $day})")
        .line("MERGE (hour:Hour {hour_value: $hour})")
        .line("MERGE (image)-[:HAS_LABEL {confidence: $confidence}]->(label)")
        .line("MERGE (camera)-[:HAS_IMAGE {timestamp: $event_ts}]->(image)")
        .line("MERGE (image)-[:HAS_TIMESTAMP]->(isodate)")
        .line("MERGE (image)-[:HAS_YEAR]->(year)")
        .line("MERGE (image)-[:HAS_MONTH]->(month)")
        .line("MERGE (image)-[:HAS_DAY]->(day)")
        .line("MERGE (image)-[:HAS_HOUR]->(hour)")
        .bind("camera", event.camera.as_str())
        .bind("object_key", event.object_key.as_str())
        .bind("iso_date", event.iso_date())
        .bind("event_ts", event.event_ts)
        .bind("label", event.label.as_str())
        .bind("year", event.year())
        .bind("month", event.month())
        .bind("day", event.day())
        .bind("hour", event.hour())
        .bind("confidence", event.confidence)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};

    #[test]
    fn test_build_checks_bindings() {
        let ok = StatementBuilder::new()
            .line("MERGE (c:Camera {camera_name: $camera})")
            .bind("camera", "porch")
            .build()
            .unwrap();
        assert_eq!(ok.params["camera"], Param::Str("porch".into()));

        let unbound = StatementBuilder::new()
            .line("MERGE (c:Camera {camera_name: $camera})")
            .build();
        assert_eq!(unbound, Err(GraphError::UnboundParameter("camera".into())));

        let unused = StatementBuilder::new()
            .line("MERGE (c:Camera {camera_name: $camera})")
            .bind("camera", "porch")
            .bind("extra", 1i64)
            .build();
        assert_eq!(unused, Err(GraphError::UnusedParameter("extra".into())));

        let bad_name = StatementBuilder::new().bind("not valid", 1i64).build();
        assert!(matches!(bad_name, Err(GraphError::InvalidParameterName(_))));
    }

    #[test]
    fn test_label_statement_keeps_values_out_of_text() {
        let event = LabelEvent {
            object_key: r#"upload/porch/"}) DETACH DELETE (n"#.to_string(),
            camera: "porch".to_string(),
            label: "Person".to_string(),
            confidence: 91.25,
            event_ts: 1714550400,
            captured_at: FixedOffset::east_opt(0)
                .unwrap()
                .with_ymd_and_hms(2024, 5, 1, 8, 0, 0)
                .unwrap(),
        };

        let statement = label_statement(&event).unwrap();

        assert!(!statement.text.contains("DETACH"));
        assert!(!statement.text.contains("porch"));
        assert_eq!(statement.params["event_ts"], Param::Int(1714550400));
        assert_eq!(statement.params["hour"], Param::Int(8));
        assert_eq!(statement.params["confidence"], Param::Float(91.25));
        assert_eq!(statement.text.lines().count(), 15);
    }

    #[test]
    fn test_param_json_shape() {
        let json = serde_json::to_string(&vec![
            Param::Int(1),
            Param::Float(0.5),
            Param::Str("a".into()),
        ])
        .unwrap();
        assert_eq!(json, r#"[1,0.5,"a"]"#);
    }
}
