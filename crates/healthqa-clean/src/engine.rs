use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap, HashSet};

use healthqa_core::{
    CompiledCatalog, Dataset, FieldRole, RoleDefault, Row, Value, format_number,
    normalize_column_name,
};
use strsim::normalized_levenshtein;
use tracing::{debug, info, warn};

use crate::config::{
    CleaningConfig, DateOptions, DuplicateMethod, DuplicateOptions, InvalidDatePolicy,
    MissingStrategy, MissingValueOptions, Statistic,
};
use crate::errors::Result;
use crate::report::{
    CleaningReport, CleaningStep, CleaningSummary, DateColumnReport, MissingColumnReport,
    RenamedColumn, StepDetail, StepReport,
};

const MAX_INVALID_EXAMPLES: usize = 5;

/// Result of one cleaning run.
#[derive(Debug, Clone, PartialEq)]
pub struct CleaningOutcome {
    pub dataset: Dataset,
    pub report: CleaningReport,
    pub summary: CleaningSummary,
}

/// Applies enabled cleaning steps in a fixed order: column names, dates,
/// missing values, duplicates.
#[derive(Debug, Clone)]
pub struct Cleaner {
    catalog: CompiledCatalog,
}

impl Cleaner {
    pub fn new(catalog: CompiledCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &CompiledCatalog {
        &self.catalog
    }

    /// Clean a copy of `dataset`. The config is validated before any step runs.
    pub fn clean(&self, dataset: &Dataset, config: &CleaningConfig) -> Result<CleaningOutcome> {
        config.validate()?;

        let before = (dataset.row_count(), dataset.column_count());
        let (mut columns, mut rows) = dataset.clone().into_parts();
        let mut report = CleaningReport::default();

        if config.clean_column_names.is_enabled() {
            report.steps.push(clean_column_names(&mut columns));
        }
        if let Some(options) = config.standardize_dates.resolve() {
            report
                .steps
                .push(self.standardize_dates(&columns, &mut rows, &options));
        }
        if let Some(options) = config.handle_missing_values.resolve() {
            report
                .steps
                .push(self.handle_missing_values(&columns, &mut rows, &options));
        }
        if let Some(options) = config.remove_duplicates.resolve() {
            report
                .steps
                .push(remove_duplicates(&columns, &mut rows, &options));
        }

        for entry in &report.steps {
            debug!(
                step = entry.step.as_str(),
                affected = entry.affected,
                "cleaning step applied"
            );
        }

        let dataset = Dataset::new(columns, rows)?;
        let summary = CleaningSummary::from_report(
            &report,
            before,
            (dataset.row_count(), dataset.column_count()),
        );
        info!(
            records_before = summary.records_before,
            records_after = summary.records_after,
            steps = report.steps.len(),
            "cleaning completed"
        );

        Ok(CleaningOutcome {
            dataset,
            report,
            summary,
        })
    }

    fn standardize_dates(
        &self,
        columns: &[String],
        rows: &mut [Row],
        options: &DateOptions,
    ) -> StepReport {
        let mut missing_columns = Vec::new();
        let targets: Vec<usize> = if options.columns.is_empty() {
            self.catalog
                .bind_columns(columns)
                .iter()
                .enumerate()
                .filter(|(_, field)| field.role == FieldRole::Date)
                .map(|(idx, _)| idx)
                .collect()
        } else {
            let mut targets = Vec::new();
            for name in &options.columns {
                match resolve_column(columns, name) {
                    Some(idx) if !targets.contains(&idx) => targets.push(idx),
                    Some(_) => {}
                    None => missing_columns.push(name.clone()),
                }
            }
            targets
        };

        if !missing_columns.is_empty() {
            warn!(columns = ?missing_columns, "date columns not found");
        }

        let mut reports = Vec::with_capacity(targets.len());
        for idx in targets {
            let mut column = DateColumnReport {
                column: columns[idx].clone(),
                standardized: 0,
                invalid: 0,
                invalid_examples: Vec::new(),
            };
            for row in rows.iter_mut() {
                let value = &mut row[idx];
                if !matches!(value, Value::Text(_) | Value::Number(_)) {
                    continue;
                }
                match self.catalog.date_value(value) {
                    Some(date) => {
                        *value = Value::Date(date);
                        column.standardized += 1;
                    }
                    None => {
                        let raw = value.to_cell();
                        if column.invalid_examples.len() < MAX_INVALID_EXAMPLES
                            && !column.invalid_examples.contains(&raw)
                        {
                            column.invalid_examples.push(raw.clone());
                        }
                        *value = match options.on_invalid {
                            InvalidDatePolicy::Flag => Value::Invalid(raw),
                            InvalidDatePolicy::Null => Value::Null,
                        };
                        column.invalid += 1;
                    }
                }
            }
            reports.push(column);
        }

        StepReport {
            step: CleaningStep::StandardizeDates,
            affected: reports
                .iter()
                .map(|column| column.standardized + column.invalid)
                .sum(),
            detail: StepDetail::Dates {
                columns: reports,
                missing_columns,
            },
        }
    }

    fn handle_missing_values(
        &self,
        columns: &[String],
        rows: &mut Vec<Row>,
        options: &MissingValueOptions,
    ) -> StepReport {
        let mut rows_dropped = 0usize;
        let mut values_dropped = 0usize;
        let mut reports = Vec::new();

        if options.strategy == MissingStrategy::Drop {
            rows.retain(|row| {
                let nulls = row.iter().filter(|value| value.is_null()).count();
                if nulls > 0 {
                    rows_dropped += 1;
                    values_dropped += nulls;
                }
                nulls == 0
            });
        } else {
            let binding = self.catalog.bind_columns(columns);
            for (idx, field) in binding.iter().enumerate() {
                let missing_before = rows.iter().filter(|row| row[idx].is_null()).count();
                if missing_before == 0 {
                    continue;
                }
                let fill = self.fill_value(rows, idx, field.role, options);
                let filled = match &fill {
                    Some(value) => {
                        for row in rows.iter_mut() {
                            if row[idx].is_null() {
                                row[idx] = value.clone();
                            }
                        }
                        missing_before
                    }
                    None => 0,
                };
                reports.push(MissingColumnReport {
                    column: field.name.clone(),
                    role: field.role,
                    missing_before,
                    filled,
                    fill_value: fill.map(|value| value.to_cell()),
                });
            }
        }

        let filled: usize = reports.iter().map(|column| column.filled).sum();
        StepReport {
            step: CleaningStep::HandleMissingValues,
            affected: rows_dropped + filled,
            detail: StepDetail::MissingValues {
                strategy: options.strategy,
                rows_dropped,
                values_dropped,
                columns: reports,
            },
        }
    }

    /// Replacement for nulls in one column; `None` leaves them missing.
    fn fill_value(
        &self,
        rows: &[Row],
        idx: usize,
        role: FieldRole,
        options: &MissingValueOptions,
    ) -> Option<Value> {
        // Dates are never fabricated.
        if role == FieldRole::Date {
            return None;
        }
        match options.strategy {
            MissingStrategy::Auto => match role.missing_default() {
                RoleDefault::FillConstant => Some(Value::text(self.catalog.missing_sentinel())),
                RoleDefault::FillMedian => numeric_statistic(rows, idx, Statistic::Median),
                RoleDefault::Leave => None,
            },
            MissingStrategy::FillConstant => Some(
                options
                    .fill_value
                    .as_deref()
                    .map(Value::from_cell)
                    .unwrap_or_else(|| Value::text(self.catalog.missing_sentinel())),
            ),
            MissingStrategy::FillStatistic if role == FieldRole::Numeric => {
                numeric_statistic(rows, idx, options.statistic)
            }
            MissingStrategy::FillStatistic => column_mode(rows, idx),
            MissingStrategy::Drop => None,
        }
    }
}

fn clean_column_names(columns: &mut [String]) -> StepReport {
    let mut seen = HashSet::new();
    let mut renamed = Vec::new();

    for (position, name) in columns.iter_mut().enumerate() {
        let mut base = normalize_column_name(name);
        if base.is_empty() {
            base = format!("column_{}", position + 1);
        }
        let mut candidate = base.clone();
        let mut suffix = 2;
        while seen.contains(&candidate) {
            candidate = format!("{base}_{suffix}");
            suffix += 1;
        }
        seen.insert(candidate.clone());

        if *name != candidate {
            renamed.push(RenamedColumn {
                from: name.clone(),
                to: candidate.clone(),
            });
            *name = candidate;
        }
    }

    StepReport {
        step: CleaningStep::CleanColumnNames,
        affected: renamed.len(),
        detail: StepDetail::ColumnNames { renamed },
    }
}

fn remove_duplicates(
    columns: &[String],
    rows: &mut Vec<Row>,
    options: &DuplicateOptions,
) -> StepReport {
    let mut missing_columns = Vec::new();
    let key_idx: Vec<usize> = if options.key_columns.is_empty()
        || options.method == DuplicateMethod::Exact
    {
        (0..columns.len()).collect()
    } else {
        let mut keys = Vec::new();
        for name in &options.key_columns {
            match resolve_column(columns, name) {
                Some(idx) if !keys.contains(&idx) => keys.push(idx),
                Some(_) => {}
                None => missing_columns.push(name.clone()),
            }
        }
        keys
    };

    if !missing_columns.is_empty() {
        warn!(columns = ?missing_columns, "duplicate key columns not found");
    }

    let mut survivors_hit = BTreeSet::new();
    let mut rows_removed = 0usize;

    // Nothing to compare on.
    if !key_idx.is_empty() {
        let mut kept: Vec<Row> = Vec::with_capacity(rows.len());
        match options.method {
            DuplicateMethod::Exact => {
                let mut seen: HashMap<Vec<String>, usize> = HashMap::new();
                for row in rows.drain(..) {
                    let key: Vec<String> = key_idx.iter().map(|idx| row[*idx].key()).collect();
                    match seen.get(&key) {
                        Some(survivor) => {
                            survivors_hit.insert(*survivor);
                            rows_removed += 1;
                        }
                        None => {
                            seen.insert(key, kept.len());
                            kept.push(row);
                        }
                    }
                }
            }
            DuplicateMethod::Fuzzy => {
                for row in rows.drain(..) {
                    let matched = kept
                        .iter()
                        .position(|survivor| similarity(survivor, &row, &key_idx) >= options.threshold);
                    match matched {
                        Some(survivor) => {
                            survivors_hit.insert(survivor);
                            rows_removed += 1;
                        }
                        None => kept.push(row),
                    }
                }
            }
        }
        *rows = kept;
    }

    StepReport {
        step: CleaningStep::RemoveDuplicates,
        affected: rows_removed,
        detail: StepDetail::Duplicates {
            method: options.method,
            key_columns: key_idx.iter().map(|idx| columns[*idx].clone()).collect(),
            missing_columns,
            groups: survivors_hit.len(),
            rows_removed,
        },
    }
}

/// Mean normalised Levenshtein similarity over the key columns.
fn similarity(left: &Row, right: &Row, key_idx: &[usize]) -> f64 {
    let total: f64 = key_idx
        .iter()
        .map(|idx| normalized_levenshtein(&left[*idx].to_cell(), &right[*idx].to_cell()))
        .sum();
    total / key_idx.len() as f64
}

fn resolve_column(columns: &[String], name: &str) -> Option<usize> {
    columns.iter().position(|column| column == name).or_else(|| {
        let wanted = normalize_column_name(name);
        columns
            .iter()
            .position(|column| normalize_column_name(column) == wanted)
    })
}

fn numeric_statistic(rows: &[Row], idx: usize, statistic: Statistic) -> Option<Value> {
    let mut values: Vec<f64> = rows.iter().filter_map(|row| row[idx].as_f64()).collect();
    if values.is_empty() {
        return None;
    }

    let result = match statistic {
        Statistic::Median => {
            values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
            let mid = values.len() / 2;
            if values.len() % 2 == 0 {
                (values[mid - 1] + values[mid]) / 2.0
            } else {
                values[mid]
            }
        }
        Statistic::Mean => values.iter().sum::<f64>() / values.len() as f64,
        Statistic::Mode => {
            let mut counts: HashMap<String, usize> = HashMap::new();
            let mut order = Vec::new();
            for value in &values {
                let key = format_number(*value);
                let count = counts.entry(key.clone()).or_insert(0);
                if *count == 0 {
                    order.push((key, *value));
                }
                *count += 1;
            }
            let mut best = values[0];
            let mut best_count = 0;
            for (key, value) in order {
                let count = counts.get(&key).copied().unwrap_or(0);
                if count > best_count {
                    best = value;
                    best_count = count;
                }
            }
            best
        }
    };
    Some(Value::Number(result))
}

/// Most frequent observed value; ties go to the first seen.
fn column_mode(rows: &[Row], idx: usize) -> Option<Value> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut order: Vec<(String, &Value)> = Vec::new();
    for row in rows {
        let value = &row[idx];
        if value.is_null() || value.is_invalid() {
            continue;
        }
        let key = value.key();
        let count = counts.entry(key.clone()).or_insert(0);
        if *count == 0 {
            order.push((key, value));
        }
        *count += 1;
    }

    let mut best: Option<(&Value, usize)> = None;
    for (key, value) in order {
        let count = counts.get(&key).copied().unwrap_or(0);
        if best.map(|(_, best_count)| count > best_count).unwrap_or(true) {
            best = Some((value, count));
        }
    }
    best.map(|(value, _)| value.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Step;
    use healthqa_core::RuleCatalog;

    fn cleaner() -> Cleaner {
        Cleaner::new(RuleCatalog::default().compile().unwrap())
    }

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn column_names_normalize_and_deduplicate() {
        let mut names = columns(&["Patient ID", "patient_id", "  ", "Admission-Date"]);
        let report = clean_column_names(&mut names);
        assert_eq!(
            names,
            columns(&["patient_id", "patient_id_2", "column_3", "admission_date"])
        );
        assert_eq!(report.affected, 4);

        let again = clean_column_names(&mut names);
        assert_eq!(again.affected, 0);
    }

    #[test]
    fn median_handles_even_counts() {
        let rows: Vec<Row> = [1.0, 4.0, 2.0, 3.0]
            .iter()
            .map(|value| vec![Value::Number(*value)])
            .chain(std::iter::once(vec![Value::Null]))
            .collect();
        assert_eq!(
            numeric_statistic(&rows, 0, Statistic::Median),
            Some(Value::Number(2.5))
        );
        assert_eq!(
            numeric_statistic(&rows, 0, Statistic::Mean),
            Some(Value::Number(2.5))
        );
    }

    #[test]
    fn mode_prefers_first_seen_on_ties() {
        let rows: Vec<Row> = ["B", "A", "A", "B", "C"]
            .iter()
            .map(|value| vec![Value::text(*value)])
            .collect();
        assert_eq!(column_mode(&rows, 0), Some(Value::text("B")));
    }

    #[test]
    fn auto_strategy_follows_roles() {
        let dataset = Dataset::from_records(vec![
            vec![
                ("patient_id", Value::text("P1")),
                ("gender", Value::Null),
                ("age", Value::Number(30.0)),
                ("admission_date", Value::Null),
            ],
            vec![
                ("patient_id", Value::Null),
                ("gender", Value::text("F")),
                ("age", Value::Null),
                ("admission_date", Value::text("2024-01-02")),
            ],
            vec![
                ("patient_id", Value::text("P3")),
                ("gender", Value::text("M")),
                ("age", Value::Number(50.0)),
                ("admission_date", Value::text("2024-01-03")),
            ],
        ])
        .unwrap();

        let config = CleaningConfig {
            handle_missing_values: Step::Flag(true),
            ..CleaningConfig::default()
        };
        let outcome = cleaner().clean(&dataset, &config).unwrap();
        let cleaned = &outcome.dataset;

        assert_eq!(cleaned.value(0, "gender"), Some(&Value::text("Unknown")));
        assert_eq!(cleaned.value(1, "age"), Some(&Value::Number(40.0)));
        assert_eq!(cleaned.value(1, "patient_id"), Some(&Value::Null));
        assert_eq!(cleaned.value(0, "admission_date"), Some(&Value::Null));
        assert_eq!(outcome.summary.missing_values_resolved, 2);
    }

    #[test]
    fn fuzzy_duplicates_match_near_identical_rows() {
        let dataset = Dataset::from_records(vec![
            vec![("name", Value::text("Jonathan Smith")), ("city", Value::text("Boston"))],
            vec![("name", Value::text("Jonathon Smith")), ("city", Value::text("Boston"))],
            vec![("name", Value::text("Maria Lopez")), ("city", Value::text("Denver"))],
        ])
        .unwrap();

        let config = CleaningConfig {
            remove_duplicates: Step::Options(DuplicateOptions {
                method: DuplicateMethod::Fuzzy,
                key_columns: vec!["name".to_string(), "city".to_string()],
                threshold: 0.9,
                ..DuplicateOptions::default()
            }),
            ..CleaningConfig::default()
        };
        let outcome = cleaner().clean(&dataset, &config).unwrap();
        assert_eq!(outcome.dataset.row_count(), 2);
        assert_eq!(
            outcome.dataset.value(1, "name"),
            Some(&Value::text("Maria Lopez"))
        );
        assert_eq!(outcome.summary.duplicates_removed, 1);
    }
}
