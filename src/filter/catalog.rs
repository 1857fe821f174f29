//! # Filter Catalog
//!
//! Named filters are read from the camera metadata document:
//!
//! ```text
//! {
//!   "filters": {
//!     "driveway": {"operator": "contains", "value": "driveway"},
//!     "outdoor":  {"operator": "in", "value": ["porch", "driveway"]}
//!   }
//! }
//! ```
//!
//! Other top-level keys are ignored. Every definition is compiled at load
//! time so a bad operator is a startup error.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use serde::Deserialize;

use super::errors::{FilterError, FilterResult};
use super::evaluator::{CompiledFilter, FilterDefinition};

#[derive(Debug, Deserialize)]
struct CatalogDocument {
    #[serde(default)]
    filters: BTreeMap<String, FilterDefinition>,
}

/// Validated set of named filters
#[derive(Debug, Clone, Default)]
pub struct FilterCatalog {
    filters: HashMap<String, CompiledFilter>,
}

impl FilterCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile a set of named definitions
    pub fn from_definitions(
        definitions: impl IntoIterator<Item = (String, FilterDefinition)>,
    ) -> FilterResult<Self> {
        let mut filters = HashMap::new();
        for (name, definition) in definitions {
            let compiled = definition.compile().map_err(|e| {
                FilterError::InvalidCatalog(format!("filter '{}': {}", name, e))
            })?;
            filters.insert(name, compiled);
        }
        Ok(Self { filters })
    }

    /// Parse a catalog document
    pub fn from_json(json: &str) -> FilterResult<Self> {
        let document: CatalogDocument =
            serde_json::from_str(json).map_err(|e| FilterError::InvalidCatalog(e.to_string()))?;
        Self::from_definitions(document.filters)
    }

    /// Read a catalog document from disk
    pub fn load(path: &Path) -> FilterResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| FilterError::IoError(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&content)
    }

    /// Add or replace one filter
    pub fn insert(&mut self, name: impl Into<String>, definition: &FilterDefinition) -> FilterResult<()> {
        self.filters.insert(name.into(), definition.compile()?);
        Ok(())
    }

    /// Look up a filter by name
    pub fn get(&self, name: &str) -> FilterResult<&CompiledFilter> {
        self.filters
            .get(name)
            .ok_or_else(|| FilterError::UnknownFilter(name.to_string()))
    }

    /// Filter names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.filters.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}
