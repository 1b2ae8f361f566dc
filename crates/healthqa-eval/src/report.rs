use crate::risk::{RiskAssessment, Severity};
use crate::validation::ValidationResult;

/// Append the data-quality section for a validation result.
pub fn push_validation_section(lines: &mut Vec<String>, result: &ValidationResult) {
    lines.push("## Data quality".to_string());
    lines.push(format!("- total_records: {}", result.total_records));
    lines.push(format!("- overall_score: {:.2}", result.overall_score));
    lines.push(format!(
        "- weights: completeness={:.2}, validity={:.2}",
        result.weights.completeness, result.weights.validity
    ));
    lines.push(String::new());

    if result.fields.is_empty() {
        lines.push("No fields to score.".to_string());
        lines.push(String::new());
        return;
    }

    lines.push("| field | role | completeness | validity | invalid examples |".to_string());
    lines.push("| --- | --- | --- | --- | --- |".to_string());
    for field in &result.fields {
        let examples = if field.invalid_examples.is_empty() {
            "-".to_string()
        } else {
            field.invalid_examples.join(", ")
        };
        lines.push(format!(
            "| {} | {} | {:.2} | {:.2} | {} |",
            field.field, field.role, field.completeness, field.validity, examples
        ));
    }
    lines.push(String::new());
}

/// Append the risk section for an assessment.
pub fn push_risk_section(lines: &mut Vec<String>, assessment: &RiskAssessment) {
    lines.push("## Risk assessment".to_string());
    lines.push(format!("- total_risks: {}", assessment.summary.total_risks));
    let highest = assessment
        .summary
        .highest_severity
        .map(|severity| severity.as_str())
        .unwrap_or("none");
    lines.push(format!("- highest_severity: {highest}"));
    if let Some(as_of) = assessment.as_of {
        lines.push(format!("- reference_date: {as_of}"));
    }
    let distribution: Vec<String> = Severity::ALL
        .iter()
        .map(|severity| format!("{severity}={}", assessment.count(*severity)))
        .collect();
    lines.push(format!("- distribution: {}", distribution.join(", ")));
    lines.push(String::new());

    if assessment.risks.is_empty() {
        return;
    }

    lines.push("| severity | category | fields | records | description |".to_string());
    lines.push("| --- | --- | --- | --- | --- |".to_string());
    for risk in &assessment.risks {
        lines.push(format!(
            "| {} | {} | {} | {} | {} |",
            risk.severity,
            risk.category,
            risk.fields.join(", "),
            risk.affected_records,
            risk.description
        ));
    }
    lines.push(String::new());
}
