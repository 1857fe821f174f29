//! Label events parsed from ingested records
//!
//! Object keys look like `<prefix>/<camera>/.../<name>_YYYYMMDD-HHMMSS.jpg`.
//! The camera is the second path segment; the capture time is the
//! file-name suffix, local to a fixed UTC offset.

use std::sync::OnceLock;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDateTime, TimeZone, Timelike};
use regex::Regex;
use serde_json::Value;

use super::errors::GraphResult;
use crate::ingest::SinkError;
use crate::store::Record;

static CAPTURE_SUFFIX: OnceLock<GraphResult<Regex>> = OnceLock::new();

pub(crate) fn capture_suffix() -> GraphResult<&'static Regex> {
    CAPTURE_SUFFIX
        .get_or_init(|| super::compile_pattern(r"_(\d{8}-\d{6})(?:\.[A-Za-z0-9]+)?$"))
        .as_ref()
        .map_err(Clone::clone)
}

/// Camera name from an object key
pub fn parse_camera(object_key: &str) -> Option<&str> {
    object_key.split('/').nth(1).filter(|camera| !camera.is_empty())
}

/// Capture time from the file-name suffix of an object key.
///
/// `Ok(None)` when the key has no valid suffix.
pub fn parse_capture_time(
    object_key: &str,
    offset: FixedOffset,
) -> GraphResult<Option<DateTime<FixedOffset>>> {
    let suffix = capture_suffix()?;

    Ok(object_key.rsplit('/').next().and_then(|file_name| {
        let stamp = suffix.captures(file_name)?.get(1)?.as_str();
        let naive = NaiveDateTime::parse_from_str(stamp, "%Y%m%d-%H%M%S").ok()?;
        offset.from_local_datetime(&naive).single()
    }))
}

/// One label detected on one image
#[derive(Debug, Clone, PartialEq)]
pub struct LabelEvent {
    pub object_key: String,
    pub camera: String,
    pub label: String,
    pub confidence: f64,
    pub event_ts: i64,
    pub captured_at: DateTime<FixedOffset>,
}

fn confidence_of(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

impl LabelEvent {
    /// Interpret a store record; anything unusable is `SinkError::Malformed`.
    /// A pattern failure is `SinkError::Write` and fails the cycle.
    pub fn from_record(record: &Record, offset: FixedOffset) -> Result<Self, SinkError> {
        let malformed = |reason: &str| SinkError::malformed(record.id.clone(), reason);

        let object_key = record
            .attribute_str("object_key")
            .ok_or_else(|| malformed("missing object_key"))?;
        let camera = parse_camera(object_key)
            .ok_or_else(|| malformed("object_key has no camera segment"))?;
        let captured_at = parse_capture_time(object_key, offset)
            .map_err(|e| SinkError::Write(e.to_string()))?
            .ok_or_else(|| malformed("object_key has no capture time suffix"))?;
        let label = record
            .attribute_str("label")
            .ok_or_else(|| malformed("missing label"))?;
        let confidence = record
            .attribute("confidence")
            .and_then(confidence_of)
            .ok_or_else(|| malformed("missing or non-numeric confidence"))?;

        Ok(Self {
            object_key: object_key.to_string(),
            camera: camera.to_string(),
            label: label.to_string(),
            confidence,
            event_ts: record.sort_key,
            captured_at,
        })
    }

    /// ISO 8601 capture time with offset
    pub fn iso_date(&self) -> String {
        self.captured_at.to_rfc3339()
    }

    pub fn year(&self) -> i64 {
        i64::from(self.captured_at.year())
    }

    pub fn month(&self) -> i64 {
        i64::from(self.captured_at.month())
    }

    pub fn day(&self) -> i64 {
        i64::from(self.captured_at.day())
    }

    pub fn hour(&self) -> i64 {
        i64::from(self.captured_at.hour())
    }
}
