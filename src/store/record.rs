//! Capture records and partition keys
//!
//! A record belongs to two partitions at once: the calendar day it was
//! captured on and the camera (entity) that captured it. Inside either
//! partition records are ordered by `(sort_key, id)`.
//!
//! On the wire a record is a flat JSON object:
//!
//! ```text
//! {"id": "...", "camera_name": "...", "capture_date": "YYYY-MM-DD",
//!  "event_ts": 1714550400, ...attributes}
//! ```

use std::cmp::Ordering;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Format of date partition values
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a `YYYY-MM-DD` partition value
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).ok()
}

/// A single capture event as stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Primary key, unique across the store
    pub id: String,

    /// Entity partition value
    #[serde(rename = "camera_name")]
    pub entity: String,

    /// Date partition value
    pub capture_date: NaiveDate,

    /// Event timestamp, the sort key inside a partition
    #[serde(rename = "event_ts")]
    pub sort_key: i64,

    /// Opaque payload shown to clients
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl Record {
    /// Create a record with an empty payload
    pub fn new(
        id: impl Into<String>,
        entity: impl Into<String>,
        capture_date: NaiveDate,
        sort_key: i64,
    ) -> Self {
        Self {
            id: id.into(),
            entity: entity.into(),
            capture_date,
            sort_key,
            attributes: Map::new(),
        }
    }

    /// Add a payload attribute
    pub fn with_attribute(mut self, name: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }

    /// Look up a payload attribute
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Look up a payload attribute as a string
    pub fn attribute_str(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).and_then(Value::as_str)
    }

    /// Copy of this record keeping only the projected attributes.
    ///
    /// Key fields are always kept.
    pub fn project(&self, fields: &[String]) -> Record {
        let attributes = self
            .attributes
            .iter()
            .filter(|(name, _)| fields.iter().any(|f| f == *name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        Record {
            id: self.id.clone(),
            entity: self.entity.clone(),
            capture_date: self.capture_date,
            sort_key: self.sort_key,
            attributes,
        }
    }

    /// Order inside a single partition
    pub fn partition_order(&self, other: &Record) -> Ordering {
        (self.sort_key, self.id.as_str()).cmp(&(other.sort_key, other.id.as_str()))
    }

    /// Order of the capture-date index: day, then sort key, then id
    pub fn capture_date_order(&self, other: &Record) -> Ordering {
        self.capture_date
            .cmp(&other.capture_date)
            .then_with(|| self.partition_order(other))
    }
}

/// Value of the partition key a query runs against
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PartitionKey {
    /// One calendar day
    Date(NaiveDate),
    /// One camera
    Entity(String),
}

impl PartitionKey {
    /// Whether the record lives in this partition
    pub fn contains(&self, record: &Record) -> bool {
        match self {
            PartitionKey::Date(date) => record.capture_date == *date,
            PartitionKey::Entity(name) => record.entity == *name,
        }
    }

    /// The day, for date partitions
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            PartitionKey::Date(date) => Some(*date),
            PartitionKey::Entity(_) => None,
        }
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartitionKey::Date(date) => write!(f, "{}", date.format(DATE_FORMAT)),
            PartitionKey::Entity(name) => write!(f, "{}", name),
        }
    }
}

/// Store-native position of the last evaluated record.
///
/// Carries every key attribute so it can resume any index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContinuationKey {
    pub id: String,
    pub capture_date: NaiveDate,
    pub sort_key: i64,
}

impl ContinuationKey {
    /// Position of the given record
    pub fn of(record: &Record) -> Self {
        Self {
            id: record.id.clone(),
            capture_date: record.capture_date,
            sort_key: record.sort_key,
        }
    }

    /// Compare a record against this position in partition order
    pub fn cmp_partition(&self, record: &Record) -> Ordering {
        (record.sort_key, record.id.as_str()).cmp(&(self.sort_key, self.id.as_str()))
    }

    /// Compare a record against this position in capture-date index order
    pub fn cmp_capture_date(&self, record: &Record) -> Ordering {
        record
            .capture_date
            .cmp(&self.capture_date)
            .then_with(|| self.cmp_partition(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    #[test]
    fn test_record_wire_format() {
        let record = Record::new("img-1", "driveway", day(1), 1000)
            .with_attribute("object_key", json!("cam/driveway/a.jpg"));

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["camera_name"], "driveway");
        assert_eq!(value["capture_date"], "2024-05-01");
        assert_eq!(value["event_ts"], 1000);
        assert_eq!(value["object_key"], "cam/driveway/a.jpg");

        let back: Record = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_projection_keeps_keys() {
        let record = Record::new("img-1", "porch", day(2), 5)
            .with_attribute("label", json!("Person"))
            .with_attribute("confidence", json!(98.1));

        let projected = record.project(&["label".to_string()]);
        assert_eq!(projected.id, "img-1");
        assert_eq!(projected.sort_key, 5);
        assert!(projected.attribute("label").is_some());
        assert!(projected.attribute("confidence").is_none());
    }

    #[test]
    fn test_partition_membership_and_display() {
        let record = Record::new("a", "porch", day(3), 1);

        assert!(PartitionKey::Date(day(3)).contains(&record));
        assert!(!PartitionKey::Date(day(4)).contains(&record));
        assert!(PartitionKey::Entity("porch".into()).contains(&record));
        assert_eq!(PartitionKey::Date(day(3)).to_string(), "2024-05-03");
        assert_eq!(PartitionKey::Entity("porch".into()).to_string(), "porch");
    }

    #[test]
    fn test_continuation_ordering() {
        let key = ContinuationKey::of(&Record::new("b", "porch", day(3), 10));

        assert_eq!(key.cmp_partition(&Record::new("a", "porch", day(3), 10)), Ordering::Less);
        assert_eq!(key.cmp_partition(&Record::new("c", "porch", day(3), 10)), Ordering::Greater);
        assert_eq!(key.cmp_partition(&Record::new("a", "porch", day(3), 11)), Ordering::Greater);
        assert_eq!(
            key.cmp_capture_date(&Record::new("a", "porch", day(2), 99)),
            Ordering::Less
        );
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2024-05-01"), Some(day(1)));
        assert_eq!(parse_date("05/01/2024"), None);
    }
}
