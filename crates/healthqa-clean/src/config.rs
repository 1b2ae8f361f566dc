use healthqa_core::Value;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::errors::{CleanError, Result};

/// A cleaning step given either as a bare flag or as an options table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum Step<T> {
    Flag(bool),
    Options(T),
}

impl<T> Default for Step<T> {
    fn default() -> Self {
        Step::Flag(false)
    }
}

/// Options table of a cleaning step.
pub trait StepOptions: Default + Clone {
    fn enabled(&self) -> bool;
}

impl<T: StepOptions> Step<T> {
    /// Effective options when the step is enabled.
    pub fn resolve(&self) -> Option<T> {
        match self {
            Step::Flag(true) => Some(T::default()),
            Step::Flag(false) => None,
            Step::Options(options) if options.enabled() => Some(options.clone()),
            Step::Options(_) => None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.resolve().is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct ColumnNameOptions {
    pub enabled: bool,
}

impl Default for ColumnNameOptions {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl StepOptions for ColumnNameOptions {
    fn enabled(&self) -> bool {
        self.enabled
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MissingStrategy {
    /// Per-role default from the rule catalog.
    Auto,
    /// Remove every row holding a null.
    Drop,
    /// Fill every non-date column with `fill_value`.
    FillConstant,
    /// Fill numeric columns with `statistic`, other non-date columns with their mode.
    FillStatistic,
}

impl MissingStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MissingStrategy::Auto => "auto",
            MissingStrategy::Drop => "drop",
            MissingStrategy::FillConstant => "fill_constant",
            MissingStrategy::FillStatistic => "fill_statistic",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Statistic {
    Median,
    Mean,
    Mode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct MissingValueOptions {
    pub enabled: bool,
    pub strategy: MissingStrategy,
    /// Constant for `fill_constant`; the catalog sentinel when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_value: Option<String>,
    pub statistic: Statistic,
}

impl Default for MissingValueOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            strategy: MissingStrategy::Auto,
            fill_value: None,
            statistic: Statistic::Median,
        }
    }
}

impl StepOptions for MissingValueOptions {
    fn enabled(&self) -> bool {
        self.enabled
    }
}

/// What happens to date values that match no accepted format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum InvalidDatePolicy {
    /// Keep the raw text behind an explicit invalid marker.
    Flag,
    /// Replace with null.
    Null,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct DateOptions {
    pub enabled: bool,
    /// Columns to standardise; every date-role column when empty.
    pub columns: Vec<String>,
    pub on_invalid: InvalidDatePolicy,
}

impl Default for DateOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            columns: Vec::new(),
            on_invalid: InvalidDatePolicy::Flag,
        }
    }
}

impl StepOptions for DateOptions {
    fn enabled(&self) -> bool {
        self.enabled
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateMethod {
    Exact,
    Fuzzy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct DuplicateOptions {
    pub enabled: bool,
    pub method: DuplicateMethod,
    /// Columns compared by `fuzzy`; all columns when empty. `exact` always
    /// compares complete rows and rejects a non-empty list.
    pub key_columns: Vec<String>,
    /// Minimum mean similarity in `(0, 1]` for fuzzy matches.
    pub threshold: f64,
}

impl Default for DuplicateOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            method: DuplicateMethod::Exact,
            key_columns: Vec::new(),
            threshold: 0.9,
        }
    }
}

impl StepOptions for DuplicateOptions {
    fn enabled(&self) -> bool {
        self.enabled
    }
}

/// Enabled cleaning steps and their options. Absent steps are disabled.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct CleaningConfig {
    pub clean_column_names: Step<ColumnNameOptions>,
    pub handle_missing_values: Step<MissingValueOptions>,
    pub standardize_dates: Step<DateOptions>,
    pub remove_duplicates: Step<DuplicateOptions>,
}

impl CleaningConfig {
    /// Every step enabled with default options.
    pub fn all_enabled() -> Self {
        Self {
            clean_column_names: Step::Flag(true),
            handle_missing_values: Step::Flag(true),
            standardize_dates: Step::Flag(true),
            remove_duplicates: Step::Flag(true),
        }
    }

    pub fn is_noop(&self) -> bool {
        !self.clean_column_names.is_enabled()
            && !self.handle_missing_values.is_enabled()
            && !self.standardize_dates.is_enabled()
            && !self.remove_duplicates.is_enabled()
    }

    /// Structural checks run before any transformation.
    pub fn validate(&self) -> Result<()> {
        if let Some(missing) = self.handle_missing_values.resolve() {
            if let Some(value) = &missing.fill_value {
                if Value::from_cell(value).is_null() {
                    return Err(CleanError::InvalidConfig(format!(
                        "handle_missing_values.fill_value '{value}' reads as a missing value"
                    )));
                }
            }
        }

        if let Some(dates) = self.standardize_dates.resolve() {
            if dates.columns.iter().any(|column| column.trim().is_empty()) {
                return Err(CleanError::InvalidConfig(
                    "standardize_dates.columns contains a blank name".to_string(),
                ));
            }
        }

        if let Some(duplicates) = self.remove_duplicates.resolve() {
            if duplicates
                .key_columns
                .iter()
                .any(|column| column.trim().is_empty())
            {
                return Err(CleanError::InvalidConfig(
                    "remove_duplicates.key_columns contains a blank name".to_string(),
                ));
            }
            if duplicates.method == DuplicateMethod::Exact && !duplicates.key_columns.is_empty() {
                return Err(CleanError::InvalidConfig(
                    "remove_duplicates.key_columns only applies to the fuzzy method".to_string(),
                ));
            }
            let threshold = duplicates.threshold;
            if !threshold.is_finite() || threshold <= 0.0 || threshold > 1.0 {
                return Err(CleanError::InvalidConfig(format!(
                    "remove_duplicates.threshold must be in (0, 1], got {threshold}"
                )));
            }
        }

        Ok(())
    }
}
