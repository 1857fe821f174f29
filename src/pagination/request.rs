//! # Page Request Parser
//!
//! Parses caller parameters into a page request.
//!
//! | key | meaning |
//! |-----|---------|
//! | `camera` | entity partition |
//! | `date`, `image_date`, `video_date` | date partition, `YYYY-MM-DD`; today when absent |
//! | `num_results` | items wanted after filtering |
//! | `older_than_ts` / `newer_than_ts` | exclusive bound inside the selected partition |
//! | `cursor` | token from a previous response |
//! | `filter` | filter name in the catalog |
//!
//! Unknown keys are ignored.

use std::collections::HashMap;

use chrono::NaiveDate;

use super::cursor::{Cursor, Direction};
use super::errors::{PaginationError, PaginationResult};
use crate::config::PaginationConfig;
use crate::store::{parse_date, PartitionKey};

const DATE_KEYS: [&str; 3] = ["date", "image_date", "video_date"];

/// Which partition a walk starts in
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartitionSelector {
    /// A calendar day; `None` is today
    Date(Option<NaiveDate>),
    /// One camera
    Entity(String),
}

impl PartitionSelector {
    pub fn partition(&self, today: NaiveDate) -> PartitionKey {
        match self {
            PartitionSelector::Date(date) => PartitionKey::Date(date.unwrap_or(today)),
            PartitionSelector::Entity(name) => PartitionKey::Entity(name.clone()),
        }
    }
}

/// Where inside the selection a walk starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bound {
    /// Exclusive sort key inside the selected partition
    Timestamp { direction: Direction, sort_value: i64 },
    /// Resume point returned by a previous request
    Cursor(Cursor),
}

impl Bound {
    pub fn direction(&self) -> Direction {
        match self {
            Bound::Timestamp { direction, .. } => *direction,
            Bound::Cursor(cursor) => cursor.direction,
        }
    }
}

/// One caller request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub selector: PartitionSelector,
    pub num_results: usize,
    pub bound: Option<Bound>,
    pub filter: Option<String>,
}

impl PageRequest {
    /// Newest items of a day (today when `None`)
    pub fn date(date: Option<NaiveDate>) -> Self {
        Self {
            selector: PartitionSelector::Date(date),
            num_results: PaginationConfig::default().default_num_results,
            bound: None,
            filter: None,
        }
    }

    /// Newest items of a camera
    pub fn entity(name: impl Into<String>) -> Self {
        Self {
            selector: PartitionSelector::Entity(name.into()),
            ..Self::date(None)
        }
    }

    pub fn num_results(mut self, num_results: usize) -> Self {
        self.num_results = num_results;
        self
    }

    pub fn older_than(mut self, sort_value: i64) -> Self {
        self.bound = Some(Bound::Timestamp {
            direction: Direction::Older,
            sort_value,
        });
        self
    }

    pub fn newer_than(mut self, sort_value: i64) -> Self {
        self.bound = Some(Bound::Timestamp {
            direction: Direction::Newer,
            sort_value,
        });
        self
    }

    pub fn cursor(mut self, cursor: Cursor) -> Self {
        self.bound = Some(Bound::Cursor(cursor));
        self
    }

    pub fn filter(mut self, name: impl Into<String>) -> Self {
        self.filter = Some(name.into());
        self
    }

    pub fn direction(&self) -> Direction {
        self.bound.as_ref().map(Bound::direction).unwrap_or_default()
    }

    /// Parse caller parameters
    pub fn parse(params: &HashMap<String, String>, config: &PaginationConfig) -> PaginationResult<Self> {
        let get = |key: &str| param(params, key);

        let camera = get("camera");
        let date = DATE_KEYS.iter().find_map(|key| param(params, key));

        let selector = match (camera, date) {
            (Some(_), Some(_)) => {
                return Err(PaginationError::ConflictingParams(
                    "camera and date select different partitions".into(),
                ))
            }
            (Some(camera), None) => PartitionSelector::Entity(camera.to_string()),
            (None, Some(date)) => PartitionSelector::Date(Some(
                parse_date(date).ok_or_else(|| PaginationError::InvalidDate(date.to_string()))?,
            )),
            (None, None) => PartitionSelector::Date(None),
        };

        let num_results = match get("num_results") {
            Some(value) => parse_num_results(value, config.max_num_results)?,
            None => config.default_num_results,
        };

        let older = get("older_than_ts")
            .map(|v| parse_timestamp("older_than_ts", v))
            .transpose()?;
        let newer = get("newer_than_ts")
            .map(|v| parse_timestamp("newer_than_ts", v))
            .transpose()?;
        let cursor = get("cursor").map(Cursor::from_token).transpose()?;

        let bound = match (older, newer, cursor) {
            (None, None, None) => None,
            (Some(sort_value), None, None) => Some(Bound::Timestamp {
                direction: Direction::Older,
                sort_value,
            }),
            (None, Some(sort_value), None) => Some(Bound::Timestamp {
                direction: Direction::Newer,
                sort_value,
            }),
            (None, None, Some(cursor)) => Some(Bound::Cursor(cursor)),
            _ => {
                return Err(PaginationError::ConflictingParams(
                    "older_than_ts, newer_than_ts and cursor are mutually exclusive".into(),
                ))
            }
        };

        Ok(Self {
            selector,
            num_results,
            bound,
            filter: get("filter").map(str::to_string),
        })
    }
}

/// Trimmed non-empty parameter value
fn param<'a>(params: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    params
        .get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
}

fn parse_num_results(value: &str, max: usize) -> PaginationResult<usize> {
    let n: usize = value
        .parse()
        .map_err(|_| PaginationError::invalid("num_results", format!("not a number: {}", value)))?;

    if n == 0 || n > max {
        return Err(PaginationError::invalid(
            "num_results",
            format!("must be between 1 and {}", max),
        ));
    }
    Ok(n)
}

fn parse_timestamp(name: &'static str, value: &str) -> PaginationResult<i64> {
    value
        .parse()
        .map_err(|_| PaginationError::invalid(name, format!("not an integer: {}", value)))
}
