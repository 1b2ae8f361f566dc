//! Core data model for healthqa.
//!
//! This crate defines the tabular dataset and value types, field roles, and
//! the rule catalog shared by the validator, cleaner and risk assessor.

pub mod catalog;
pub mod dataset;
pub mod error;
pub mod role;
pub mod value;

pub use catalog::{
    BoundField, CompiledCatalog, MatchKind, NumericRange, RolePattern, RuleCatalog, SchemaBinding,
    normalize_column_name,
};
pub use dataset::{Dataset, Row};
pub use error::{Error, Result};
pub use role::{FieldRole, RoleDefault};
pub use value::{DATE_FORMAT, Value, format_number};
