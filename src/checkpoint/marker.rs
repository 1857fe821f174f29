//! Checkpoint blob encoding
//!
//! The blob records the newest record ingestion has fully processed:
//!
//! ```text
//! {"max_capture_date": "2024-05-01", "max_timestamp": "1000"}
//! ```
//!
//! `max_timestamp` is written as a decimal string. Integers are accepted
//! on read so hand-edited blobs still load.

use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::errors::{CheckpointError, CheckpointResult};
use crate::store::Record;

/// Ingestion high-water mark.
///
/// Ordered lexicographically by `(max_capture_date, max_timestamp)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Date partition holding the newest processed record
    pub max_capture_date: NaiveDate,

    /// Highest processed sort key inside that partition
    #[serde(
        serialize_with = "serialize_timestamp",
        deserialize_with = "deserialize_timestamp"
    )]
    pub max_timestamp: i64,
}

impl Checkpoint {
    pub fn new(max_capture_date: NaiveDate, max_timestamp: i64) -> Self {
        Self {
            max_capture_date,
            max_timestamp,
        }
    }

    /// Position of a single record
    pub fn at(record: &Record) -> Self {
        Self::new(record.capture_date, record.sort_key)
    }

    /// The later of two positions. Progress never moves backward.
    pub fn advance(self, other: Checkpoint) -> Checkpoint {
        self.max(other)
    }

    /// Move to a later day keeping the timestamp
    pub fn with_capture_date(self, date: NaiveDate) -> Checkpoint {
        Self::new(date, self.max_timestamp)
    }

    pub fn to_json(&self) -> CheckpointResult<String> {
        serde_json::to_string(self).map_err(|e| {
            CheckpointError::encode_failed(format!("Failed to serialize checkpoint: {}", e))
        })
    }

    pub fn from_json(json: &[u8]) -> CheckpointResult<Self> {
        serde_json::from_slice(json)
            .map_err(|e| CheckpointError::corrupt(format!("Failed to parse checkpoint: {}", e)))
    }
}

impl Ord for Checkpoint {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.max_capture_date, self.max_timestamp)
            .cmp(&(other.max_capture_date, other.max_timestamp))
    }
}

impl PartialOrd for Checkpoint {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn serialize_timestamp<S: Serializer>(value: &i64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.to_string())
}

fn deserialize_timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Int(value) => Ok(value),
        Raw::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid max_timestamp: {:?}", text))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    #[test]
    fn test_blob_format() {
        let json = Checkpoint::new(day(1), 1000).to_json().unwrap();
        assert_eq!(json, r#"{"max_capture_date":"2024-05-01","max_timestamp":"1000"}"#);
    }

    #[test]
    fn test_reads_string_or_integer_timestamp() {
        let a = Checkpoint::from_json(br#"{"max_capture_date":"2024-05-01","max_timestamp":"1000"}"#)
            .unwrap();
        let b = Checkpoint::from_json(br#"{"max_capture_date":"2024-05-01","max_timestamp":1000}"#)
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(a.max_timestamp, 1000);
    }

    #[test]
    fn test_garbage_is_corrupt() {
        let blobs: [&[u8]; 4] = [
            b"not json",
            br#"{"max_capture_date":"yesterday","max_timestamp":"1"}"#,
            br#"{"max_capture_date":"2024-05-01","max_timestamp":"12ab"}"#,
            br#"{"max_capture_date":"2024-05-01"}"#,
        ];
        for blob in blobs {
            let err = Checkpoint::from_json(blob).unwrap_err();
            assert!(err.is_corrupt());
        }
    }

    #[test]
    fn test_advance_is_monotonic() {
        let base = Checkpoint::new(day(2), 500);

        assert_eq!(base.advance(Checkpoint::new(day(2), 400)), base);
        assert_eq!(base.advance(Checkpoint::new(day(1), 9999)), base);
        assert_eq!(
            base.advance(Checkpoint::new(day(3), 1)),
            Checkpoint::new(day(3), 1)
        );
        assert_eq!(base.with_capture_date(day(5)), Checkpoint::new(day(5), 500));
    }
}
