//! Risk classification over a (usually cleaned) dataset.
//!
//! Detectors are independent: each sees the dataset plus a shared
//! [`RiskContext`] and returns its own list of risks. The assessor runs them in
//! declaration order and aggregates severities.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{NaiveDate, Utc};
use healthqa_core::{
    CompiledCatalog, Dataset, FieldRole, NumericRange, SchemaBinding, Value, normalize_column_name,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::{EvalError, Result};

/// Ordinal risk level, `low < medium < high < critical`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Low,
        Severity::Medium,
        Severity::High,
        Severity::Critical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RiskCategory {
    Completeness,
    Plausibility,
    Consistency,
}

impl RiskCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskCategory::Completeness => "completeness",
            RiskCategory::Plausibility => "plausibility",
            RiskCategory::Consistency => "consistency",
        }
    }
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Risk {
    pub category: RiskCategory,
    pub fields: Vec<String>,
    pub description: String,
    pub severity: Severity,
    pub affected_records: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskSummary {
    pub total_risks: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highest_severity: Option<Severity>,
    /// Always holds every severity, zero counts included.
    pub severity_distribution: BTreeMap<Severity, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub risks: Vec<Risk>,
    pub summary: RiskSummary,
    /// Reference date the future-date checks ran against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub as_of: Option<NaiveDate>,
}

impl RiskAssessment {
    pub fn from_risks(risks: Vec<Risk>) -> Self {
        let mut severity_distribution: BTreeMap<Severity, usize> =
            Severity::ALL.iter().map(|severity| (*severity, 0)).collect();
        for risk in &risks {
            *severity_distribution.entry(risk.severity).or_insert(0) += 1;
        }
        let summary = RiskSummary {
            total_risks: risks.len(),
            highest_severity: risks.iter().map(|risk| risk.severity).max(),
            severity_distribution,
        };
        Self {
            risks,
            summary,
            as_of: None,
        }
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.summary
            .severity_distribution
            .get(&severity)
            .copied()
            .unwrap_or(0)
    }
}

/// Numeric plausibility rule: values outside `range` raise a risk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct PlausibilityRule {
    pub column: String,
    pub range: NumericRange,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PlausibilityRule {
    pub fn new(column: &str, range: NumericRange, severity: Severity) -> Self {
        Self {
            column: column.to_string(),
            range,
            severity,
            description: None,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }
}

/// Two date columns where `end` must not precede `start`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct DatePair {
    pub start: String,
    pub end: String,
}

impl DatePair {
    pub fn new(start: &str, end: &str) -> Self {
        Self {
            start: start.to_string(),
            end: end.to_string(),
        }
    }
}

/// Columns checked for length-of-stay agreement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct StayColumns {
    pub length_of_stay: String,
    pub admission: String,
    pub discharge: String,
}

impl Default for StayColumns {
    fn default() -> Self {
        Self {
            length_of_stay: "length_of_stay".to_string(),
            admission: "admission_date".to_string(),
            discharge: "discharge_date".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct RiskConfig {
    /// Completeness below this ratio is a medium risk.
    pub completeness_medium_below: f64,
    /// Completeness below this ratio is a high risk.
    pub completeness_high_below: f64,
    pub plausibility_rules: Vec<PlausibilityRule>,
    pub date_pairs: Vec<DatePair>,
    pub stay: StayColumns,
    /// Allowed gap in days between recorded and derived length of stay.
    pub stay_tolerance_days: i64,
    /// Reference date for future-date checks.
    ///
    /// When unset the assessor uses today's UTC date, so the same input can
    /// yield different risks on different days. The date actually used is
    /// recorded on [`RiskAssessment::as_of`]; pin it here for reproducible runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub as_of: Option<NaiveDate>,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            completeness_medium_below: 0.8,
            completeness_high_below: 0.5,
            plausibility_rules: default_plausibility_rules(),
            date_pairs: vec![
                DatePair::new("admission_date", "discharge_date"),
                DatePair::new("birth_date", "admission_date"),
            ],
            stay: StayColumns::default(),
            stay_tolerance_days: 1,
            as_of: None,
        }
    }
}

fn default_plausibility_rules() -> Vec<PlausibilityRule> {
    vec![
        PlausibilityRule::new("age", NumericRange::inclusive(0.0, 120.0), Severity::High),
        PlausibilityRule::new(
            "systolic_bp",
            NumericRange::exclusive(0.0, 300.0),
            Severity::High,
        ),
        PlausibilityRule::new(
            "diastolic_bp",
            NumericRange::exclusive(0.0, 200.0),
            Severity::High,
        ),
        PlausibilityRule::new(
            "heart_rate",
            NumericRange::exclusive(0.0, 300.0),
            Severity::High,
        ),
        PlausibilityRule::new("total_charges", NumericRange::at_least(0.0), Severity::High)
            .with_description("negative total_charges"),
        PlausibilityRule::new(
            "total_charges",
            NumericRange::at_most(1_000_000.0),
            Severity::Low,
        )
        .with_description("total_charges above 1000000"),
    ]
}

impl RiskConfig {
    pub fn validate(&self) -> Result<()> {
        let high = self.completeness_high_below;
        let medium = self.completeness_medium_below;
        if !(0.0..=1.0).contains(&high) || !(0.0..=1.0).contains(&medium) || high > medium {
            return Err(EvalError::InvalidConfig(format!(
                "completeness thresholds must satisfy 0 <= high ({high}) <= medium ({medium}) <= 1"
            )));
        }
        if self.stay_tolerance_days < 0 {
            return Err(EvalError::InvalidConfig(format!(
                "stay_tolerance_days must be non-negative, got {}",
                self.stay_tolerance_days
            )));
        }
        for rule in &self.plausibility_rules {
            if rule.column.trim().is_empty() {
                return Err(EvalError::InvalidConfig(
                    "plausibility rule without a column".to_string(),
                ));
            }
            rule.range
                .check(&rule.column)
                .map_err(|err| EvalError::InvalidConfig(format!("plausibility rule: {err}")))?;
        }
        Ok(())
    }
}

/// Shared inputs for one assessment run.
pub struct RiskContext<'a> {
    pub catalog: &'a CompiledCatalog,
    pub binding: SchemaBinding,
    pub as_of: NaiveDate,
}

/// One independent risk check.
pub trait RiskDetector {
    fn name(&self) -> &'static str;
    fn detect(&self, dataset: &Dataset, context: &RiskContext<'_>) -> Vec<Risk>;
}

pub struct CompletenessDetector {
    medium_below: f64,
    high_below: f64,
}

impl CompletenessDetector {
    pub fn new(config: &RiskConfig) -> Self {
        Self {
            medium_below: config.completeness_medium_below,
            high_below: config.completeness_high_below,
        }
    }
}

impl RiskDetector for CompletenessDetector {
    fn name(&self) -> &'static str {
        "completeness"
    }

    fn detect(&self, dataset: &Dataset, _context: &RiskContext<'_>) -> Vec<Risk> {
        let total = dataset.row_count();
        if total == 0 {
            return Vec::new();
        }

        let mut risks = Vec::new();
        for (idx, column) in dataset.columns().iter().enumerate() {
            let missing = dataset.null_count(idx);
            let completeness = (total - missing) as f64 / total as f64;
            let severity = if completeness < self.high_below {
                Severity::High
            } else if completeness < self.medium_below {
                Severity::Medium
            } else {
                continue;
            };
            risks.push(Risk {
                category: RiskCategory::Completeness,
                fields: vec![column.clone()],
                description: format!(
                    "{column} is {:.1}% complete ({missing} of {total} values missing)",
                    completeness * 100.0
                ),
                severity,
                affected_records: missing,
            });
        }
        risks
    }
}

pub struct PlausibilityDetector {
    rules: Vec<PlausibilityRule>,
    length_of_stay: String,
}

impl PlausibilityDetector {
    pub fn new(config: &RiskConfig) -> Self {
        Self {
            rules: config.plausibility_rules.clone(),
            length_of_stay: config.stay.length_of_stay.clone(),
        }
    }

    fn range_risks(&self, dataset: &Dataset, risks: &mut Vec<Risk>) {
        for rule in &self.rules {
            let Some(idx) = find_column(dataset, &rule.column) else {
                continue;
            };
            let affected = dataset
                .column_values(idx)
                .filter_map(Value::as_f64)
                .filter(|value| !rule.range.contains(*value))
                .count();
            if affected == 0 {
                continue;
            }
            let column = &dataset.columns()[idx];
            let what = rule
                .description
                .clone()
                .unwrap_or_else(|| format!("{column} outside {}", rule.range.describe()));
            risks.push(Risk {
                category: RiskCategory::Plausibility,
                fields: vec![column.clone()],
                description: format!("{what} in {affected} record(s)"),
                severity: rule.severity,
                affected_records: affected,
            });
        }
    }

    fn stay_risks(&self, dataset: &Dataset, risks: &mut Vec<Risk>) {
        let Some(idx) = find_column(dataset, &self.length_of_stay) else {
            return;
        };
        let column = &dataset.columns()[idx];
        let stays: Vec<f64> = dataset.column_values(idx).filter_map(Value::as_f64).collect();

        let negative = stays.iter().filter(|stay| **stay < 0.0).count();
        if negative > 0 {
            risks.push(Risk {
                category: RiskCategory::Plausibility,
                fields: vec![column.clone()],
                description: format!("negative {column} in {negative} record(s)"),
                severity: Severity::Critical,
                affected_records: negative,
            });
        }
        let zero = stays.iter().filter(|stay| **stay == 0.0).count();
        if zero > 0 {
            risks.push(Risk {
                category: RiskCategory::Plausibility,
                fields: vec![column.clone()],
                description: format!("zero {column} in {zero} record(s)"),
                severity: Severity::High,
                affected_records: zero,
            });
        }
    }

    fn future_date_risks(
        &self,
        dataset: &Dataset,
        context: &RiskContext<'_>,
        risks: &mut Vec<Risk>,
    ) {
        for column in context.binding.columns_with_role(FieldRole::Date) {
            let Some(idx) = dataset.column_index(column) else {
                continue;
            };
            let affected = dataset
                .column_values(idx)
                .filter_map(|value| context.catalog.date_value(value))
                .filter(|date| *date > context.as_of)
                .count();
            if affected == 0 {
                continue;
            }
            risks.push(Risk {
                category: RiskCategory::Plausibility,
                fields: vec![column.to_string()],
                description: format!(
                    "{column} after {} in {affected} record(s)",
                    context.as_of
                ),
                severity: Severity::High,
                affected_records: affected,
            });
        }
    }
}

impl RiskDetector for PlausibilityDetector {
    fn name(&self) -> &'static str {
        "plausibility"
    }

    fn detect(&self, dataset: &Dataset, context: &RiskContext<'_>) -> Vec<Risk> {
        let mut risks = Vec::new();
        self.range_risks(dataset, &mut risks);
        self.stay_risks(dataset, &mut risks);
        self.future_date_risks(dataset, context, &mut risks);
        risks
    }
}

pub struct ConsistencyDetector {
    pairs: Vec<DatePair>,
    stay: StayColumns,
    tolerance_days: i64,
}

impl ConsistencyDetector {
    pub fn new(config: &RiskConfig) -> Self {
        Self {
            pairs: config.date_pairs.clone(),
            stay: config.stay.clone(),
            tolerance_days: config.stay_tolerance_days,
        }
    }

    fn pair_risks(
        &self,
        dataset: &Dataset,
        context: &RiskContext<'_>,
        pair: &DatePair,
        risks: &mut Vec<Risk>,
    ) {
        let (Some(start_idx), Some(end_idx)) = (
            find_column(dataset, &pair.start),
            find_column(dataset, &pair.end),
        ) else {
            return;
        };
        let start_name = dataset.columns()[start_idx].clone();
        let end_name = dataset.columns()[end_idx].clone();

        let mut missing_start = 0usize;
        let mut reversed = 0usize;
        for row in dataset.rows() {
            let Some(end) = context.catalog.date_value(&row[end_idx]) else {
                continue;
            };
            match context.catalog.date_value(&row[start_idx]) {
                Some(start) if end < start => reversed += 1,
                Some(_) => {}
                None => missing_start += 1,
            }
        }

        let fields = vec![start_name.clone(), end_name.clone()];
        if missing_start > 0 {
            risks.push(Risk {
                category: RiskCategory::Consistency,
                fields: fields.clone(),
                description: format!(
                    "{end_name} recorded but {start_name} missing or unparseable in {missing_start} record(s)"
                ),
                severity: Severity::Medium,
                affected_records: missing_start,
            });
        }
        if reversed > 0 {
            risks.push(Risk {
                category: RiskCategory::Consistency,
                fields,
                description: format!(
                    "{end_name} earlier than {start_name} in {reversed} record(s)"
                ),
                severity: Severity::High,
                affected_records: reversed,
            });
        }
    }

    fn stay_mismatch(&self, dataset: &Dataset, context: &RiskContext<'_>) -> Option<Risk> {
        let stay_idx = find_column(dataset, &self.stay.length_of_stay)?;
        let admission_idx = find_column(dataset, &self.stay.admission)?;
        let discharge_idx = find_column(dataset, &self.stay.discharge)?;

        let mismatched = dataset
            .rows()
            .iter()
            .filter(|row| {
                let stay = row[stay_idx].as_f64();
                let admission = context.catalog.date_value(&row[admission_idx]);
                let discharge = context.catalog.date_value(&row[discharge_idx]);
                match (stay, admission, discharge) {
                    (Some(stay), Some(admission), Some(discharge)) => {
                        let derived = (discharge - admission).num_days() as f64;
                        (stay - derived).abs() > self.tolerance_days as f64
                    }
                    _ => false,
                }
            })
            .count();
        if mismatched == 0 {
            return None;
        }

        let columns = dataset.columns();
        Some(Risk {
            category: RiskCategory::Consistency,
            fields: vec![
                columns[stay_idx].clone(),
                columns[admission_idx].clone(),
                columns[discharge_idx].clone(),
            ],
            description: format!(
                "{} disagrees with the admission/discharge interval by more than {} day(s) in {mismatched} record(s)",
                columns[stay_idx], self.tolerance_days
            ),
            severity: Severity::Medium,
            affected_records: mismatched,
        })
    }
}

impl RiskDetector for ConsistencyDetector {
    fn name(&self) -> &'static str {
        "consistency"
    }

    fn detect(&self, dataset: &Dataset, context: &RiskContext<'_>) -> Vec<Risk> {
        let mut risks = Vec::new();
        for pair in &self.pairs {
            self.pair_risks(dataset, context, pair, &mut risks);
        }
        risks.extend(self.stay_mismatch(dataset, context));
        risks
    }
}

/// Runs the detectors in declaration order.
pub struct RiskAssessor {
    catalog: CompiledCatalog,
    detectors: Vec<Box<dyn RiskDetector>>,
    as_of: Option<NaiveDate>,
}

impl RiskAssessor {
    pub fn new(catalog: CompiledCatalog, config: &RiskConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            catalog,
            detectors: vec![
                Box::new(CompletenessDetector::new(config)),
                Box::new(PlausibilityDetector::new(config)),
                Box::new(ConsistencyDetector::new(config)),
            ],
            as_of: config.as_of,
        })
    }

    /// Assessor with a custom detector list.
    pub fn with_detectors(
        catalog: CompiledCatalog,
        detectors: Vec<Box<dyn RiskDetector>>,
        as_of: Option<NaiveDate>,
    ) -> Self {
        Self {
            catalog,
            detectors,
            as_of,
        }
    }

    /// Effective reference date: the configured one, else today (UTC).
    pub fn reference_date(&self) -> NaiveDate {
        self.as_of.unwrap_or_else(|| Utc::now().date_naive())
    }

    pub fn assess(&self, dataset: &Dataset) -> RiskAssessment {
        let context = RiskContext {
            catalog: &self.catalog,
            binding: self.catalog.bind(dataset),
            as_of: self.reference_date(),
        };

        let mut risks = Vec::new();
        for detector in &self.detectors {
            let found = detector.detect(dataset, &context);
            debug!(detector = detector.name(), risks = found.len(), "detector finished");
            risks.extend(found);
        }

        let mut assessment = RiskAssessment::from_risks(risks);
        assessment.as_of = Some(context.as_of);
        info!(
            total_risks = assessment.summary.total_risks,
            highest = assessment
                .summary
                .highest_severity
                .map(|severity| severity.as_str())
                .unwrap_or("none"),
            "risk assessment completed"
        );
        assessment
    }
}

/// Locate a column by exact or normalised name.
fn find_column(dataset: &Dataset, name: &str) -> Option<usize> {
    dataset.column_index(name).or_else(|| {
        let wanted = normalize_column_name(name);
        dataset
            .columns()
            .iter()
            .position(|column| normalize_column_name(column) == wanted)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use healthqa_core::RuleCatalog;

    fn assessor() -> RiskAssessor {
        let config = RiskConfig {
            as_of: NaiveDate::from_ymd_opt(2025, 1, 1),
            ..RiskConfig::default()
        };
        RiskAssessor::new(RuleCatalog::default().compile().unwrap(), &config).unwrap()
    }

    fn context<'a>(catalog: &'a CompiledCatalog, dataset: &Dataset) -> RiskContext<'a> {
        RiskContext {
            catalog,
            binding: catalog.bind(dataset),
            as_of: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        }
    }

    #[test]
    fn assessment_records_reference_date() {
        let dataset = Dataset::from_records(vec![vec![("age", Value::Number(40.0))]]).unwrap();
        assert_eq!(
            assessor().assess(&dataset).as_of,
            NaiveDate::from_ymd_opt(2025, 1, 1)
        );

        let unpinned =
            RiskAssessor::new(RuleCatalog::default().compile().unwrap(), &RiskConfig::default())
                .unwrap();
        assert!(unpinned.assess(&dataset).as_of.is_some());
    }

    #[test]
    fn plausibility_rules_reject_non_finite_bounds() {
        let mut config = RiskConfig::default();
        config.plausibility_rules[0].range.max = Some(f64::NAN);
        assert!(matches!(
            config.validate(),
            Err(EvalError::InvalidConfig(_))
        ));

        let mut config = RiskConfig::default();
        config.plausibility_rules[0].range.min = Some(200.0);
        config.plausibility_rules[0].range.max = Some(100.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn distribution_always_lists_every_severity() {
        let assessment = RiskAssessment::from_risks(Vec::new());
        assert_eq!(assessment.summary.severity_distribution.len(), 4);
        assert_eq!(assessment.summary.highest_severity, None);
        assert_eq!(assessment.summary.total_risks, 0);
    }

    #[test]
    fn completeness_thresholds_map_to_severity() {
        let dataset = Dataset::from_records(vec![
            vec![("a", Value::Null), ("b", Value::Number(1.0))],
            vec![("a", Value::Null), ("b", Value::Null)],
            vec![("a", Value::Number(1.0)), ("b", Value::Number(1.0))],
            vec![("a", Value::Null), ("b", Value::Number(1.0))],
        ])
        .unwrap();
        let catalog = RuleCatalog::default().compile().unwrap();
        let detector = CompletenessDetector::new(&RiskConfig::default());
        let risks = detector.detect(&dataset, &context(&catalog, &dataset));

        assert_eq!(risks.len(), 2);
        assert_eq!(risks[0].fields, vec!["a"]);
        assert_eq!(risks[0].severity, Severity::High);
        assert_eq!(risks[0].affected_records, 3);
        assert_eq!(risks[1].fields, vec!["b"]);
        assert_eq!(risks[1].severity, Severity::Medium);
    }

    #[test]
    fn empty_dataset_has_no_completeness_risks() {
        let dataset = Dataset::empty(vec!["a".to_string()]).unwrap();
        let catalog = RuleCatalog::default().compile().unwrap();
        let detector = CompletenessDetector::new(&RiskConfig::default());
        let risks = detector.detect(&dataset, &context(&catalog, &dataset));
        assert!(risks.is_empty());
    }

    #[test]
    fn length_of_stay_severity_depends_on_sign() {
        let dataset = Dataset::from_records(vec![
            vec![("length_of_stay", Value::Number(-2.0))],
            vec![("length_of_stay", Value::Number(0.0))],
            vec![("length_of_stay", Value::Number(0.0))],
            vec![("length_of_stay", Value::Number(3.0))],
        ])
        .unwrap();
        let assessment = assessor().assess(&dataset);

        assert_eq!(assessment.count(Severity::Critical), 1);
        assert_eq!(assessment.count(Severity::High), 1);
        let zero = assessment
            .risks
            .iter()
            .find(|risk| risk.severity == Severity::High)
            .unwrap();
        assert_eq!(zero.affected_records, 2);
    }

    #[test]
    fn charges_split_into_negative_and_large() {
        let dataset = Dataset::from_records(vec![
            vec![("total_charges", Value::Number(-10.0))],
            vec![("total_charges", Value::Number(2_500_000.0))],
            vec![("total_charges", Value::Number(12_000.0))],
        ])
        .unwrap();
        let assessment = assessor().assess(&dataset);
        let severities: Vec<Severity> = assessment.risks.iter().map(|risk| risk.severity).collect();
        assert_eq!(severities, vec![Severity::High, Severity::Low]);
    }

    #[test]
    fn future_dates_are_high_risk() {
        let dataset = Dataset::from_records(vec![
            vec![("admission_date", Value::text("2030-05-01"))],
            vec![("admission_date", Value::text("2020-05-01"))],
        ])
        .unwrap();
        let assessment = assessor().assess(&dataset);
        assert_eq!(assessment.risks.len(), 1);
        assert_eq!(assessment.risks[0].category, RiskCategory::Plausibility);
        assert_eq!(assessment.risks[0].severity, Severity::High);
    }

    #[test]
    fn discharge_before_admission_is_inconsistent() {
        let dataset = Dataset::from_records(vec![vec![
            ("admission_date", Value::text("2024-03-10")),
            ("discharge_date", Value::text("2024-03-01")),
        ]])
        .unwrap();
        let assessment = assessor().assess(&dataset);
        let risk = assessment
            .risks
            .iter()
            .find(|risk| risk.category == RiskCategory::Consistency)
            .unwrap();
        assert!(risk.severity >= Severity::Medium);
        assert_eq!(risk.fields, vec!["admission_date", "discharge_date"]);
    }

    #[test]
    fn discharge_without_admission_is_medium() {
        let dataset = Dataset::from_records(vec![
            vec![
                ("admission_date", Value::Invalid("invalid-date".to_string())),
                ("discharge_date", Value::text("2024-03-01")),
            ],
            vec![
                ("admission_date", Value::Null),
                ("discharge_date", Value::Null),
            ],
        ])
        .unwrap();
        let assessment = assessor().assess(&dataset);
        let consistency: Vec<&Risk> = assessment
            .risks
            .iter()
            .filter(|risk| risk.category == RiskCategory::Consistency)
            .collect();
        assert_eq!(consistency.len(), 1);
        assert_eq!(consistency[0].severity, Severity::Medium);
        assert_eq!(consistency[0].affected_records, 1);
    }

    #[test]
    fn stay_mismatch_beyond_tolerance() {
        let dataset = Dataset::from_records(vec![
            vec![
                ("admission_date", Value::text("2024-03-01")),
                ("discharge_date", Value::text("2024-03-05")),
                ("length_of_stay", Value::Number(5.0)),
            ],
            vec![
                ("admission_date", Value::text("2024-03-01")),
                ("discharge_date", Value::text("2024-03-05")),
                ("length_of_stay", Value::Number(9.0)),
            ],
        ])
        .unwrap();
        let assessment = assessor().assess(&dataset);
        let mismatch: Vec<&Risk> = assessment
            .risks
            .iter()
            .filter(|risk| risk.fields.len() == 3)
            .collect();
        assert_eq!(mismatch.len(), 1);
        assert_eq!(mismatch[0].affected_records, 1);
        assert_eq!(mismatch[0].severity, Severity::Medium);
    }

    #[test]
    fn rejects_inverted_completeness_thresholds() {
        let config = RiskConfig {
            completeness_high_below: 0.9,
            completeness_medium_below: 0.5,
            ..RiskConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
