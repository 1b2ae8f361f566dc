//! Configurable cleaning engine.
//!
//! [`Cleaner::clean`] validates a [`CleaningConfig`], then applies the enabled
//! steps to a copy of the dataset and reports what each step changed.

pub mod config;
pub mod engine;
pub mod errors;
pub mod report;

pub use config::{
    CleaningConfig, ColumnNameOptions, DateOptions, DuplicateMethod, DuplicateOptions,
    InvalidDatePolicy, MissingStrategy, MissingValueOptions, Statistic, Step, StepOptions,
};
pub use engine::{Cleaner, CleaningOutcome};
pub use errors::{CleanError, Result};
pub use report::{
    CleaningReport, CleaningStep, CleaningSummary, DateColumnReport, MissingColumnReport,
    RenamedColumn, StepDetail, StepReport,
};
