use chrono::NaiveDate;
use healthqa_core::{Dataset, RuleCatalog, Value};
use healthqa_eval::{RiskAssessor, RiskConfig, Severity, ValidationConfig, Validator};

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
            ("patient_id", Value::text(format!("P{idx:04}"))),
            ("gender", gender),
            ("admission_date", admission),
            ("age", Value::Number((idx % 90) as f64)),
        ]
    });
    Dataset::from_records(records).expect("dataset")
}

fn validator() -> Validator {
    let catalog = RuleCatalog::default().compile().expect("catalog");
    Validator::new(catalog, &ValidationConfig::default()).expect("validator")
}

#[test]
fn hundred_row_scenario_scores_gender_and_dates() {
    let result = validator().validate(&admissions(100));

    let gender = result.field("gender").expect("gender field");
    assert!((gender.completeness - 0.94).abs() < 1e-9);

    let admission = result.field("admission_date").expect("admission field");
    assert_eq!(admission.completeness, 1.0);
    assert!(admission.validity <= 0.94);
    assert_eq!(admission.invalid_examples, vec!["invalid-date"]);
}

#[test]
fn overall_score_stays_within_bounds() {
    let datasets = vec![
        Dataset::default(),
        Dataset::empty(vec!["age".to_string(), "gender".to_string()]).expect("empty"),
        admissions(1),
        admissions(100),
        Dataset::from_records(vec![vec![
            ("age", Value::Number(-500.0)),
            ("gender", Value::text("?")),
            ("admission_date", Value::Invalid("nope".to_string())),
        ]])
        .expect("garbage"),
    ];

    for dataset in &datasets {
        let score = validator().validate(dataset).overall_score;
        assert!((0.0..=100.0).contains(&score), "score {score} out of bounds");
    }
}

#[test]
fn severity_distribution_sums_to_risk_count() {
    let config = RiskConfig {
        as_of: NaiveDate::from_ymd_opt(2024, 1, 1),
        ..RiskConfig::default()
    };
    let catalog = RuleCatalog::default().compile().expect("catalog");
    let assessor = RiskAssessor::new(catalog, &config).expect("assessor");

    let dataset = Dataset::from_records(vec![
        vec![
            ("age", Value::Number(150.0)),
            ("admission_date", Value::text("2023-06-10")),
            ("discharge_date", Value::text("2023-06-01")),
            ("length_of_stay", Value::Number(-9.0)),
        ],
        vec![
            ("age", Value::Null),
            ("admission_date", Value::text("2025-02-01")),
            ("discharge_date", Value::Null),
            ("length_of_stay", Value::Number(0.0)),
        ],
    ])
    .expect("dataset");

    let assessment = assessor.assess(&dataset);
    let counted: usize = assessment.summary.severity_distribution.values().sum();
    assert_eq!(counted, assessment.risks.len());
    assert_eq!(assessment.summary.highest_severity, Some(Severity::Critical));

    let again = assessor.assess(&dataset);
    assert_eq!(again, assessment);
}
