//! Pagination cursors
//!
//! A cursor is an exclusive bound: "continue strictly before (older) or
//! after (newer) this point". On the wire it is a flat object
//!
//! ```text
//! {"direction": "older", "capture_date": "2024-05-02", "event_ts": 1100}
//! {"direction": "newer", "camera_name": "porch", "event_ts": 1100}
//! ```
//!
//! and, as a request parameter, URL-safe base64 of that object. A missing
//! `event_ts` means the start of the partition, which is where a walk
//! resumes after stopping at a day boundary. Cursors returned by a walk
//! also carry the `id` of the last record evaluated; records sharing its
//! `event_ts` are split on that id so none are skipped.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};

use super::errors::{PaginationError, PaginationResult};
use crate::store::{parse_date, PartitionKey, ScanDirection, SortRange, DATE_FORMAT};

/// Chronological traversal direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Newest first
    #[default]
    Older,
    /// Oldest first
    Newer,
}

impl Direction {
    pub fn scan_direction(&self) -> ScanDirection {
        match self {
            Direction::Older => ScanDirection::Backward,
            Direction::Newer => ScanDirection::Forward,
        }
    }

    /// Sort range strictly beyond `sort_value` in this direction, or
    /// beyond `(sort_value, id)` when the tie-break id is known
    pub fn range(&self, sort_value: Option<i64>, id: Option<&str>) -> SortRange {
        match (self, sort_value, id) {
            (_, None, _) => SortRange::All,
            (Direction::Older, Some(value), None) => SortRange::Before(value),
            (Direction::Newer, Some(value), None) => SortRange::After(value),
            (Direction::Older, Some(sort_key), Some(id)) => SortRange::BeforeKey {
                sort_key,
                id: id.to_string(),
            },
            (Direction::Newer, Some(sort_key), Some(id)) => SortRange::AfterKey {
                sort_key,
                id: id.to_string(),
            },
        }
    }
}

/// Resumable position of a pagination walk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CursorRepr", into = "CursorRepr")]
pub struct Cursor {
    pub direction: Direction,
    pub partition: PartitionKey,
    /// `None` is the start of the partition
    pub sort_value: Option<i64>,
    /// Record id breaking ties at `sort_value`
    pub id: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct CursorRepr {
    direction: Direction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    capture_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    camera_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    event_ts: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
}

impl From<Cursor> for CursorRepr {
    fn from(cursor: Cursor) -> Self {
        let (capture_date, camera_name) = match cursor.partition {
            PartitionKey::Date(date) => (Some(date.format(DATE_FORMAT).to_string()), None),
            PartitionKey::Entity(name) => (None, Some(name)),
        };
        Self {
            direction: cursor.direction,
            capture_date,
            camera_name,
            event_ts: cursor.sort_value,
            id: cursor.id,
        }
    }
}

impl TryFrom<CursorRepr> for Cursor {
    type Error = String;

    fn try_from(repr: CursorRepr) -> Result<Self, Self::Error> {
        let partition = match (repr.capture_date, repr.camera_name) {
            (Some(date), None) => PartitionKey::Date(
                parse_date(&date).ok_or_else(|| format!("invalid capture_date {:?}", date))?,
            ),
            (None, Some(name)) if !name.is_empty() => PartitionKey::Entity(name),
            (None, Some(_)) => return Err("empty camera_name".to_string()),
            (Some(_), Some(_)) => {
                return Err("capture_date and camera_name are exclusive".to_string())
            }
            (None, None) => return Err("missing capture_date or camera_name".to_string()),
        };

        if repr.id.is_some() && repr.event_ts.is_none() {
            return Err("id requires event_ts".to_string());
        }

        Ok(Cursor {
            direction: repr.direction,
            partition,
            sort_value: repr.event_ts,
            id: repr.id,
        })
    }
}

impl Cursor {
    pub fn new(direction: Direction, partition: PartitionKey, sort_value: Option<i64>) -> Self {
        Self {
            direction,
            partition,
            sort_value,
            id: None,
        }
    }

    /// Set the tie-break id
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Opaque request token
    pub fn to_token(&self) -> PaginationResult<String> {
        let json = serde_json::to_vec(self)
            .map_err(|e| PaginationError::MalformedCursor(e.to_string()))?;
        Ok(URL_SAFE_NO_PAD.encode(json))
    }

    /// Decode a request token
    pub fn from_token(token: &str) -> PaginationResult<Self> {
        let json = URL_SAFE_NO_PAD
            .decode(token.trim())
            .map_err(|_| PaginationError::MalformedCursor("cursor is not valid base64".into()))?;
        serde_json::from_slice(&json).map_err(|e| PaginationError::MalformedCursor(e.to_string()))
    }
}
