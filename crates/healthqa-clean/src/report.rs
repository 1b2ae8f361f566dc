use healthqa_core::FieldRole;
use serde::{Deserialize, Serialize};

use crate::config::{DuplicateMethod, MissingStrategy};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleaningStep {
    CleanColumnNames,
    StandardizeDates,
    HandleMissingValues,
    RemoveDuplicates,
}

impl CleaningStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            CleaningStep::CleanColumnNames => "clean_column_names",
            CleaningStep::StandardizeDates => "standardize_dates",
            CleaningStep::HandleMissingValues => "handle_missing_values",
            CleaningStep::RemoveDuplicates => "remove_duplicates",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenamedColumn {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateColumnReport {
    pub column: String,
    /// Values converted to canonical dates.
    pub standardized: usize,
    /// Unparseable values flagged (or nulled) by this run.
    pub invalid: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub invalid_examples: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingColumnReport {
    pub column: String,
    pub role: FieldRole,
    pub missing_before: usize,
    pub filled: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_value: Option<String>,
}

impl MissingColumnReport {
    pub fn left_missing(&self) -> usize {
        self.missing_before - self.filled
    }
}

/// Step-specific detail of a report entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepDetail {
    ColumnNames {
        renamed: Vec<RenamedColumn>,
    },
    Dates {
        columns: Vec<DateColumnReport>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        missing_columns: Vec<String>,
    },
    MissingValues {
        strategy: MissingStrategy,
        rows_dropped: usize,
        /// Null cells removed together with dropped rows.
        values_dropped: usize,
        columns: Vec<MissingColumnReport>,
    },
    Duplicates {
        method: DuplicateMethod,
        key_columns: Vec<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        missing_columns: Vec<String>,
        groups: usize,
        rows_removed: usize,
    },
}

/// One applied step: what ran and how many values or rows it changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepReport {
    pub step: CleaningStep,
    pub affected: usize,
    pub detail: StepDetail,
}

/// Ordered entries for the enabled steps.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CleaningReport {
    pub steps: Vec<StepReport>,
}

impl CleaningReport {
    pub fn step(&self, step: CleaningStep) -> Option<&StepReport> {
        self.steps.iter().find(|entry| entry.step == step)
    }

    /// Total changes across every step.
    pub fn total_affected(&self) -> usize {
        self.steps.iter().map(|entry| entry.affected).sum()
    }
}

/// Flat digest of a cleaning run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CleaningSummary {
    pub records_before: usize,
    pub records_after: usize,
    pub columns_before: usize,
    pub columns_after: usize,
    pub duplicates_removed: usize,
    pub missing_values_resolved: usize,
    pub invalid_dates_flagged: usize,
}

impl CleaningSummary {
    pub(crate) fn from_report(
        report: &CleaningReport,
        before: (usize, usize),
        after: (usize, usize),
    ) -> Self {
        let mut summary = CleaningSummary {
            records_before: before.0,
            columns_before: before.1,
            records_after: after.0,
            columns_after: after.1,
            ..CleaningSummary::default()
        };
        for entry in &report.steps {
            match &entry.detail {
                StepDetail::ColumnNames { .. } => {}
                StepDetail::Dates { columns, .. } => {
                    summary.invalid_dates_flagged +=
                        columns.iter().map(|column| column.invalid).sum::<usize>();
                }
                StepDetail::MissingValues {
                    values_dropped,
                    columns,
                    ..
                } => {
                    summary.missing_values_resolved += values_dropped
                        + columns.iter().map(|column| column.filled).sum::<usize>();
                }
                StepDetail::Duplicates { rows_removed, .. } => {
                    summary.duplicates_removed += rows_removed;
                }
            }
        }
        summary
    }
}
