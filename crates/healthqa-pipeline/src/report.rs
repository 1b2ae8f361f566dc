use chrono::{DateTime, Utc};
use healthqa_clean::{CleaningReport, CleaningSummary, StepDetail, StepReport};
use healthqa_eval::{RiskAssessment, ValidationResult, push_risk_section, push_validation_section};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::sources::SourceType;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleaningSection {
    pub summary: CleaningSummary,
    pub steps: Vec<StepReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub dataset_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_type: Option<SourceType>,
    pub total_records: usize,
    pub processing_date: DateTime<Utc>,
}

/// Everything one pipeline run produced, in serialisable form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedReport {
    pub validation: ValidationResult,
    pub cleaning: CleaningSection,
    pub risk_assessment: RiskAssessment,
    pub summary: RunSummary,
}

impl CombinedReport {
    pub fn new(
        summary: RunSummary,
        validation: ValidationResult,
        cleaning_summary: CleaningSummary,
        cleaning_report: CleaningReport,
        risk_assessment: RiskAssessment,
    ) -> Self {
        Self {
            validation,
            cleaning: CleaningSection {
                summary: cleaning_summary,
                steps: cleaning_report.steps,
            },
            risk_assessment,
            summary,
        }
    }
}

/// Render a deterministic markdown report.
pub fn render_report(report: &CombinedReport) -> String {
    let mut lines = Vec::new();
    let summary = &report.summary;

    lines.push(format!("# Healthcare Data Quality Report: {}", summary.dataset_name));
    lines.push(String::new());
    lines.push("## Run summary".to_string());
    lines.push(format!("- run_id: {}", summary.run_id));
    if let Some(source_type) = summary.source_type {
        lines.push(format!("- source_type: {source_type}"));
    }
    lines.push(format!("- total_records: {}", summary.total_records));
    lines.push(format!(
        "- processing_date: {}",
        summary.processing_date.to_rfc3339()
    ));
    lines.push(String::new());

    push_validation_section(&mut lines, &report.validation);
    push_cleaning_section(&mut lines, &report.cleaning);
    push_risk_section(&mut lines, &report.risk_assessment);

    lines.join("\n")
}

fn push_cleaning_section(lines: &mut Vec<String>, cleaning: &CleaningSection) {
    let summary = &cleaning.summary;
    lines.push("## Cleaning".to_string());
    lines.push(format!(
        "- records: {} -> {}",
        summary.records_before, summary.records_after
    ));
    lines.push(format!(
        "- columns: {} -> {}",
        summary.columns_before, summary.columns_after
    ));
    lines.push(format!("- duplicates_removed: {}", summary.duplicates_removed));
    lines.push(format!(
        "- missing_values_resolved: {}",
        summary.missing_values_resolved
    ));
    lines.push(format!(
        "- invalid_dates_flagged: {}",
        summary.invalid_dates_flagged
    ));
    lines.push(String::new());

    if cleaning.steps.is_empty() {
        lines.push("No cleaning steps enabled.".to_string());
        lines.push(String::new());
        return;
    }

    lines.push("| step | affected | detail |".to_string());
    lines.push("| --- | --- | --- |".to_string());
    for entry in &cleaning.steps {
        lines.push(format!(
            "| {} | {} | {} |",
            entry.step.as_str(),
            entry.affected,
            describe_detail(&entry.detail)
        ));
    }
    lines.push(String::new());
}

fn describe_detail(detail: &StepDetail) -> String {
    match detail {
        StepDetail::ColumnNames { renamed } => {
            if renamed.is_empty() {
                "no renames".to_string()
            } else {
                renamed
                    .iter()
                    .map(|rename| format!("{} -> {}", rename.from, rename.to))
                    .collect::<Vec<_>>()
                    .join(", ")
            }
        }
        StepDetail::Dates {
            columns,
            missing_columns,
        } => {
            let mut parts: Vec<String> = columns
                .iter()
                .map(|column| {
                    format!(
                        "{}: {} standardized, {} invalid",
                        column.column, column.standardized, column.invalid
                    )
                })
                .collect();
            if !missing_columns.is_empty() {
                parts.push(format!("missing: {}", missing_columns.join(", ")));
            }
            if parts.is_empty() {
                "no date columns".to_string()
            } else {
                parts.join("; ")
            }
        }
        StepDetail::MissingValues {
            strategy,
            rows_dropped,
            columns,
            ..
        } => {
            let mut parts = vec![format!("strategy {}", strategy.as_str())];
            if *rows_dropped > 0 {
                parts.push(format!("{rows_dropped} row(s) dropped"));
            }
            for column in columns {
                parts.push(format!(
                    "{}: {} filled, {} left",
                    column.column,
                    column.filled,
                    column.left_missing()
                ));
            }
            parts.join("; ")
        }
        StepDetail::Duplicates {
            groups,
            rows_removed,
            missing_columns,
            ..
        } => {
            let mut text = format!("{groups} group(s), {rows_removed} row(s) removed");
            if !missing_columns.is_empty() {
                text.push_str(&format!("; missing: {}", missing_columns.join(", ")));
            }
            text
        }
    }
}
