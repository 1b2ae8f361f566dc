//! Seeded synthetic admissions data with known quality defects.
//!
//! Row 0 carries an implausible age, rows 5-10 have no gender and rows 15-20
//! hold an unparseable admission date.

use chrono::{Duration, NaiveDate};
use healthqa_core::{DATE_FORMAT, Dataset, Value};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub const DEFAULT_SAMPLE_RECORDS: usize = 100;
pub const DEFAULT_SAMPLE_SEED: u64 = 42;
/// Largest sample a single request may ask for.
pub const MAX_SAMPLE_RECORDS: usize = 1_000_000;

pub const SAMPLE_COLUMNS: [&str; 11] = [
    "patient_id",
    "birth_date",
    "age",
    "gender",
    "race",
    "admission_date",
    "discharge_date",
    "primary_diagnosis",
    "length_of_stay",
    "total_charges",
    "systolic_bp",
];

const RACES: [&str; 5] = ["White", "Black", "Asian", "Hispanic", "Other"];
const DIAGNOSES: [&str; 8] = [
    "I10", "E11.9", "J18.9", "I25.10", "N39.0", "K21.9", "I50.9", "J44.1",
];

pub fn generate_sample(records: usize, seed: u64) -> healthqa_core::Result<Dataset> {
    if records > MAX_SAMPLE_RECORDS {
        return Err(healthqa_core::Error::InvalidDataset(format!(
            "sample of {records} records exceeds the limit of {MAX_SAMPLE_RECORDS}"
        )));
    }
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let period_start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or_default();

    let mut rows = Vec::with_capacity(records);
    for idx in 0..records {
        let age: i64 = if idx == 0 {
            150
        } else {
            rng.random_range(18..=90)
        };
        let admission = period_start + Duration::days(rng.random_range(0..365));
        let stay: i64 = rng.random_range(1..=14);
        let discharge = admission + Duration::days(stay);
        let birth = admission - Duration::days(age * 365 + rng.random_range(0..365));

        let gender = if (5..=10).contains(&idx) {
            Value::Null
        } else if rng.random_bool(0.5) {
            Value::text("M")
        } else {
            Value::text("F")
        };
        let admission_value = if (15..=20).contains(&idx) {
            Value::text("invalid-date")
        } else {
            Value::text(admission.format(DATE_FORMAT).to_string())
        };
        let charges = (rng.random_range(1_000.0..50_000.0_f64) * 100.0).round() / 100.0;

        rows.push(vec![
            Value::text(format!("P{:05}", idx + 1)),
            Value::text(birth.format(DATE_FORMAT).to_string()),
            Value::Number(age as f64),
            gender,
            Value::text(RACES[rng.random_range(0..RACES.len())]),
            admission_value,
            Value::text(discharge.format(DATE_FORMAT).to_string()),
            Value::text(DIAGNOSES[rng.random_range(0..DIAGNOSES.len())]),
            Value::Number(stay as f64),
            Value::Number(charges),
            Value::Number(rng.random_range(90..=180) as f64),
        ]);
    }

    Dataset::new(
        SAMPLE_COLUMNS.iter().map(|column| column.to_string()).collect(),
        rows,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_is_deterministic_per_seed() {
        let first = generate_sample(50, 7).unwrap();
        let second = generate_sample(50, 7).unwrap();
        let other = generate_sample(50, 8).unwrap();
        assert_eq!(first, second);
        assert_ne!(first, other);
    }

    #[test]
    fn oversized_request_fails_without_allocating() {
        assert!(generate_sample(MAX_SAMPLE_RECORDS + 1, 1).is_err());
        assert!(generate_sample(usize::MAX, 1).is_err());
    }

    #[test]
    fn sample_carries_known_defects() {
        let sample = generate_sample(DEFAULT_SAMPLE_RECORDS, DEFAULT_SAMPLE_SEED).unwrap();
        assert_eq!(sample.row_count(), 100);
        assert_eq!(sample.value(0, "age"), Some(&Value::Number(150.0)));

        let gender = sample.column_index("gender").unwrap();
        assert_eq!(sample.null_count(gender), 6);
        for row in 15..=20 {
            assert_eq!(
                sample.value(row, "admission_date"),
                Some(&Value::text("invalid-date"))
            );
        }
    }
}
