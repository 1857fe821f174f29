//! Post-fetch record filters
//!
//! The store cannot push predicates down, so filters run on every record
//! a page returns. Supported operators are `contains`, `not_contains` and
//! `in`.

mod catalog;
mod errors;
mod evaluator;

pub use catalog::FilterCatalog;
pub use errors::{FilterError, FilterResult};
pub use evaluator::{
    matches, CompiledFilter, FilterDefinition, FilterField, FilterOperator, ENTITY_FIELD,
};
