//! # Page Response

use serde::Serialize;

use super::cursor::Cursor;
use crate::store::Record;

/// Why a walk ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Requested count reached
    Filled,
    /// Nothing left in the requested direction
    Exhausted,
    /// Store request bound reached
    RequestGuard,
    /// Partition walk bound reached
    PartitionGuard,
}

/// One page of results.
///
/// Serializes as
/// `{"Items": [...], "Count": n, "LastEvaluatedKey": {...}, "NextCursor": "...", "StoreRequests": k}`.
/// `LastEvaluatedKey` and `NextCursor` are absent once the walk is exhausted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PageResponse {
    pub items: Vec<Record>,

    pub count: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_evaluated_key: Option<Cursor>,

    /// Token form of `last_evaluated_key`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,

    pub store_requests: usize,

    #[serde(skip)]
    pub stop_reason: StopReason,
}

impl PageResponse {
    pub fn is_exhausted(&self) -> bool {
        self.last_evaluated_key.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::Direction;
    use crate::store::PartitionKey;
    use chrono::NaiveDate;
    use serde_json::json;

    #[test]
    fn test_exhausted_response_has_no_key() {
        let response = PageResponse {
            items: Vec::new(),
            count: 0,
            last_evaluated_key: None,
            next_cursor: None,
            store_requests: 1,
            stop_reason: StopReason::Exhausted,
        };

        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"Items": [], "Count": 0, "StoreRequests": 1})
        );
        assert!(response.is_exhausted());
    }

    #[test]
    fn test_response_with_cursor() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
        let record = crate::store::Record::new("a", "porch", date, 7);
        let response = PageResponse {
            items: vec![record],
            count: 1,
            last_evaluated_key: Some(Cursor::new(Direction::Older, PartitionKey::Date(date), Some(7))),
            next_cursor: Some("token".into()),
            store_requests: 2,
            stop_reason: StopReason::Filled,
        };

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["Items"][0]["event_ts"], 7);
        assert_eq!(value["LastEvaluatedKey"]["capture_date"], "2024-05-02");
        assert_eq!(value["NextCursor"], "token");
    }
}
