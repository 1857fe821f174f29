//! # Filter Evaluation
//!
//! A filter definition names an operator, a value and optionally the
//! field it applies to. The default field is the camera name.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::{FilterError, FilterResult};
use crate::store::Record;

/// Field name that targets the record's entity partition value
pub const ENTITY_FIELD: &str = "camera_name";

/// Filter operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterOperator {
    /// Substring match
    #[serde(rename = "contains")]
    Contains,

    /// Negated substring match
    #[serde(rename = "not_contains")]
    NotContains,

    /// Value in list
    #[serde(rename = "in")]
    In,
}

impl FilterOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Contains => "contains",
            FilterOperator::NotContains => "not_contains",
            FilterOperator::In => "in",
        }
    }
}

impl FromStr for FilterOperator {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "contains" => Ok(FilterOperator::Contains),
            "not_contains" => Ok(FilterOperator::NotContains),
            "in" => Ok(FilterOperator::In),
            other => Err(FilterError::UnknownOperator(other.to_string())),
        }
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A filter as configured.
///
/// The operator is kept as text so an unknown operator surfaces as an
/// error when the definition is used, not as a decode failure of the
/// whole catalog document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterDefinition {
    pub operator: String,
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl FilterDefinition {
    pub fn new(operator: FilterOperator, value: Value) -> Self {
        Self {
            operator: operator.as_str().to_string(),
            value,
            field: None,
        }
    }

    pub fn contains(needle: impl Into<String>) -> Self {
        Self::new(FilterOperator::Contains, Value::String(needle.into()))
    }

    pub fn not_contains(needle: impl Into<String>) -> Self {
        Self::new(FilterOperator::NotContains, Value::String(needle.into()))
    }

    pub fn in_list<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values = values
            .into_iter()
            .map(|v| Value::String(v.into()))
            .collect();
        Self::new(FilterOperator::In, Value::Array(values))
    }

    /// Target an attribute instead of the camera name
    pub fn on_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn compile(&self) -> FilterResult<CompiledFilter> {
        CompiledFilter::compile(self)
    }
}

/// Which part of a record a filter inspects
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterField {
    Entity,
    Attribute(String),
}

impl FilterField {
    fn resolve<'a>(&self, record: &'a Record) -> Option<&'a str> {
        match self {
            FilterField::Entity => Some(record.entity.as_str()),
            FilterField::Attribute(name) => record.attribute_str(name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Predicate {
    Contains(String),
    NotContains(String),
    In(Vec<String>),
}

/// A validated filter ready for evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledFilter {
    field: FilterField,
    predicate: Predicate,
}

fn invalid(operator: FilterOperator, reason: impl Into<String>) -> FilterError {
    FilterError::InvalidValue {
        operator: operator.as_str().to_string(),
        reason: reason.into(),
    }
}

impl CompiledFilter {
    pub fn compile(definition: &FilterDefinition) -> FilterResult<Self> {
        let operator: FilterOperator = definition.operator.parse()?;

        let field = match definition.field.as_deref() {
            None | Some(ENTITY_FIELD) => FilterField::Entity,
            Some(name) => FilterField::Attribute(name.to_string()),
        };

        let predicate = match operator {
            FilterOperator::Contains | FilterOperator::NotContains => {
                let needle = definition
                    .value
                    .as_str()
                    .ok_or_else(|| invalid(operator, "expected a string"))?
                    .to_string();
                if operator == FilterOperator::Contains {
                    Predicate::Contains(needle)
                } else {
                    Predicate::NotContains(needle)
                }
            }
            FilterOperator::In => {
                let items = definition
                    .value
                    .as_array()
                    .ok_or_else(|| invalid(operator, "expected an array"))?;
                let members = items
                    .iter()
                    .map(|item| {
                        item.as_str()
                            .map(str::to_string)
                            .ok_or_else(|| invalid(operator, "array members must be strings"))
                    })
                    .collect::<FilterResult<Vec<_>>>()?;
                Predicate::In(members)
            }
        };

        Ok(Self { field, predicate })
    }

    pub fn field(&self) -> &FilterField {
        &self.field
    }

    /// Evaluate against a record
    pub fn matches(&self, record: &Record) -> bool {
        let target = self.field.resolve(record);

        match &self.predicate {
            Predicate::Contains(needle) => target.is_some_and(|t| t.contains(needle.as_str())),
            Predicate::NotContains(needle) => !target.is_some_and(|t| t.contains(needle.as_str())),
            Predicate::In(members) => target.is_some_and(|t| members.iter().any(|m| m == t)),
        }
    }
}

/// Evaluate a definition against a record.
///
/// Fails only when the definition itself is invalid.
pub fn matches(record: &Record, definition: &FilterDefinition) -> FilterResult<bool> {
    Ok(CompiledFilter::compile(definition)?.matches(record))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn record(camera: &str) -> Record {
        Record::new("r1", camera, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(), 1)
            .with_attribute("label", json!("Person"))
    }

    #[test]
    fn test_contains() {
        let def = FilterDefinition::contains("drive");
        assert!(matches(&record("driveway"), &def).unwrap());
        assert!(!matches(&record("porch"), &def).unwrap());
    }

    #[test]
    fn test_not_contains_is_negation() {
        let def = FilterDefinition::not_contains("drive");
        assert!(!matches(&record("driveway"), &def).unwrap());
        assert!(matches(&record("porch"), &def).unwrap());
    }

    #[test]
    fn test_in() {
        let def = FilterDefinition::in_list(["porch", "garage"]);
        assert!(matches(&record("porch"), &def).unwrap());
        assert!(!matches(&record("porch-2"), &def).unwrap());
    }

    #[test]
    fn test_attribute_field() {
        let def = FilterDefinition::in_list(["Person", "Dog"]).on_field("label");
        assert!(matches(&record("porch"), &def).unwrap());

        let missing = FilterDefinition::contains("x").on_field("absent");
        assert!(!matches(&record("porch"), &missing).unwrap());
        let negated = FilterDefinition::not_contains("x").on_field("absent");
        assert!(matches(&record("porch"), &negated).unwrap());
    }

    #[test]
    fn test_unknown_operator_is_error() {
        let def = FilterDefinition {
            operator: "startswith".into(),
            value: json!("drive"),
            field: None,
        };
        assert_eq!(
            matches(&record("driveway"), &def),
            Err(FilterError::UnknownOperator("startswith".into()))
        );
    }

    #[test]
    fn test_wrong_value_shape_is_error() {
        let def = FilterDefinition::new(FilterOperator::In, json!("porch"));
        assert!(matches!(
            matches(&record("porch"), &def),
            Err(FilterError::InvalidValue { .. })
        ));

        let def = FilterDefinition::new(FilterOperator::Contains, json!(["porch"]));
        assert!(def.compile().is_err());
    }
}
