use healthqa_clean::{
    CleanError, Cleaner, CleaningConfig, CleaningStep, DateOptions, InvalidDatePolicy,
    MissingStrategy, MissingValueOptions, Step, StepDetail,
};
use healthqa_core::{Dataset, RuleCatalog, Value};

fn cleaner() -> Cleaner {
    Cleaner::new(RuleCatalog::default().compile().expect("catalog"))
}

fn admissions(rows: usize) -> Dataset {
    let records = (0..rows).map(|idx| {
        let gender = if (5..=10).contains(&idx) {
            Value::Null
        } else if idx % 2 == 0 {
            Value::text("M")
        } else {
            Value::text("F")
        };
        let admission = if (15..=20).contains(&idx) {
            Value::text("invalid-date")
        } else {
            Value::text(format!("2023-{:02}-{:02}", idx % 12 + 1, idx % 28 + 1))
        };
        vec![
            ("Patient ID", Value::text(format!("P{idx:04}"))),
            ("Gender", gender),
            ("Admission Date", admission),
            ("Age", Value::Number((20 + idx % 60) as f64)),
        ]
    });
    Dataset::from_records(records).expect("dataset")
}

fn messy() -> Dataset {
    Dataset::from_records(vec![
        vec![
            ("Patient ID", Value::text("P1")),
            ("Gender", Value::Null),
            ("Admission Date", Value::text("03/15/2024")),
            ("Total Charges", Value::Number(1200.0)),
        ],
        vec![
            ("Patient ID", Value::text("P1")),
            ("Gender", Value::Null),
            ("Admission Date", Value::text("03/15/2024")),
            ("Total Charges", Value::Number(1200.0)),
        ],
        vec![
            ("Patient ID", Value::text("P2")),
            ("Gender", Value::text("F")),
            ("Admission Date", Value::text("not a date")),
            ("Total Charges", Value::Null),
        ],
        vec![
            ("Patient ID", Value::Null),
            ("Gender", Value::text("M")),
            ("Admission Date", Value::Null),
            ("Total Charges", Value::Number(800.0)),
        ],
    ])
    .expect("dataset")
}

#[test]
fn disabled_config_returns_input_unchanged() {
    for dataset in [messy(), admissions(30), Dataset::default()] {
        let outcome = cleaner()
            .clean(&dataset, &CleaningConfig::default())
            .expect("clean");
        assert_eq!(outcome.dataset, dataset);
        assert!(outcome.report.steps.is_empty());
        assert_eq!(outcome.summary.records_before, outcome.summary.records_after);
    }
}

#[test]
fn second_run_reports_no_changes() {
    let config = CleaningConfig::all_enabled();
    let first = cleaner().clean(&messy(), &config).expect("first run");
    assert!(first.report.total_affected() > 0);

    let second = cleaner().clean(&first.dataset, &config).expect("second run");
    assert_eq!(second.report.steps.len(), 4);
    for entry in &second.report.steps {
        assert_eq!(entry.affected, 0, "{} changed data", entry.step.as_str());
    }
    assert_eq!(second.dataset, first.dataset);
}

#[test]
fn duplicate_groups_reduce_row_count() {
    let mut records = Vec::new();
    // Groups of size 3, 2 and 1.
    for (id, copies) in [("A", 3), ("B", 2), ("C", 1)] {
        for _ in 0..copies {
            records.push(vec![("id", Value::text(id)), ("age", Value::Number(40.0))]);
        }
    }
    let dataset = Dataset::from_records(records).expect("dataset");
    let config = CleaningConfig {
        remove_duplicates: Step::Flag(true),
        ..CleaningConfig::default()
    };

    let outcome = cleaner().clean(&dataset, &config).expect("clean");
    assert_eq!(outcome.summary.records_before, 6);
    assert_eq!(outcome.summary.records_after, 6 - (2 + 1));
    assert_eq!(outcome.summary.duplicates_removed, 3);

    let ids: Vec<String> = outcome
        .dataset
        .rows()
        .iter()
        .map(|row| row[0].to_cell())
        .collect();
    assert_eq!(ids, vec!["A", "B", "C"]);

    match &outcome
        .report
        .step(CleaningStep::RemoveDuplicates)
        .expect("duplicate step")
        .detail
    {
        StepDetail::Duplicates { groups, .. } => assert_eq!(*groups, 2),
        other => panic!("unexpected detail {other:?}"),
    }
}

#[test]
fn hundred_row_scenario_fills_gender_and_flags_dates() {
    let config = CleaningConfig {
        clean_column_names: Step::Flag(true),
        handle_missing_values: Step::Flag(true),
        standardize_dates: Step::Options(DateOptions {
            columns: vec!["admission_date".to_string()],
            ..DateOptions::default()
        }),
        ..CleaningConfig::default()
    };
    let outcome = cleaner().clean(&admissions(100), &config).expect("clean");
    let cleaned = &outcome.dataset;

    let gender = cleaned.column_index("gender").expect("gender column");
    assert_eq!(cleaned.null_count(gender), 0);
    assert_eq!(cleaned.value(5, "gender"), Some(&Value::text("Unknown")));

    assert_eq!(
        cleaned.value(15, "admission_date"),
        Some(&Value::Invalid("invalid-date".to_string()))
    );
    assert_eq!(outcome.summary.invalid_dates_flagged, 6);

    let dates = outcome
        .report
        .step(CleaningStep::StandardizeDates)
        .expect("date step");
    match &dates.detail {
        StepDetail::Dates { columns, .. } => {
            assert_eq!(columns[0].column, "admission_date");
            assert_eq!(columns[0].invalid, 6);
            assert_eq!(columns[0].standardized, 94);
            assert_eq!(columns[0].invalid_examples, vec!["invalid-date"]);
        }
        other => panic!("unexpected detail {other:?}"),
    }
}

#[test]
fn steps_run_in_fixed_order() {
    let config = CleaningConfig::all_enabled();
    let outcome = cleaner().clean(&messy(), &config).expect("clean");
    let steps: Vec<CleaningStep> = outcome.report.steps.iter().map(|entry| entry.step).collect();
    assert_eq!(
        steps,
        vec![
            CleaningStep::CleanColumnNames,
            CleaningStep::StandardizeDates,
            CleaningStep::HandleMissingValues,
            CleaningStep::RemoveDuplicates,
        ]
    );
}

#[test]
fn dates_are_never_filled() {
    let config = CleaningConfig {
        handle_missing_values: Step::Options(MissingValueOptions {
            strategy: MissingStrategy::FillConstant,
            fill_value: Some("N/A-filled".to_string()),
            ..MissingValueOptions::default()
        }),
        ..CleaningConfig::default()
    };
    let outcome = cleaner().clean(&messy(), &config).expect("clean");
    assert_eq!(outcome.dataset.value(3, "Admission Date"), Some(&Value::Null));
    assert_eq!(
        outcome.dataset.value(3, "Patient ID"),
        Some(&Value::text("N/A-filled"))
    );
}

#[test]
fn drop_strategy_removes_rows_with_nulls() {
    let config = CleaningConfig {
        handle_missing_values: Step::Options(MissingValueOptions {
            strategy: MissingStrategy::Drop,
            ..MissingValueOptions::default()
        }),
        ..CleaningConfig::default()
    };
    let outcome = cleaner().clean(&messy(), &config).expect("clean");
    assert_eq!(outcome.dataset.row_count(), 0);
    assert_eq!(outcome.summary.missing_values_resolved, 5);
}

#[test]
fn invalid_dates_can_be_nulled() {
    let config = CleaningConfig {
        standardize_dates: Step::Options(DateOptions {
            on_invalid: InvalidDatePolicy::Null,
            ..DateOptions::default()
        }),
        ..CleaningConfig::default()
    };
    let outcome = cleaner().clean(&messy(), &config).expect("clean");
    assert_eq!(outcome.dataset.value(2, "Admission Date"), Some(&Value::Null));
    assert_eq!(outcome.summary.invalid_dates_flagged, 1);
}

#[test]
fn invalid_config_fails_before_any_step() {
    let config: CleaningConfig = toml::from_str(
        r#"
        clean_column_names = true

        [handle_missing_values]
        strategy = "fill_constant"
        fill_value = "NA"
        "#,
    )
    .expect("parse config");

    let result = cleaner().clean(&messy(), &config);
    assert!(matches!(result, Err(CleanError::InvalidConfig(_))));
}

#[test]
fn report_serializes_with_step_tags() {
    let outcome = cleaner()
        .clean(&messy(), &CleaningConfig::all_enabled())
        .expect("clean");
    let json = serde_json::to_value(&outcome.report).expect("serialize");
    assert_eq!(json["steps"][0]["step"], "clean_column_names");
    assert_eq!(json["steps"][0]["detail"]["kind"], "column_names");
    assert_eq!(json["steps"][3]["detail"]["method"], "exact");
}
