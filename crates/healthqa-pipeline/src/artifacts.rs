use std::fs::{File, OpenOptions, create_dir_all};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use healthqa_core::Dataset;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::{PipelineError, Result};
use crate::report::{CombinedReport, render_report};

pub const CLEANED_FILE: &str = "cleaned.csv";
pub const REPORT_JSON_FILE: &str = "report.json";
pub const REPORT_MD_FILE: &str = "report.md";

/// Files written for one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactPaths {
    pub cleaned_csv: PathBuf,
    pub report_json: PathBuf,
    pub report_md: PathBuf,
}

/// Destination for per-source outputs.
pub trait ArtifactSink {
    fn persist(
        &self,
        dataset_name: &str,
        cleaned: &Dataset,
        report: &CombinedReport,
    ) -> Result<ArtifactPaths>;
}

/// Writes `<root>/<dataset_name>/{cleaned.csv,report.json,report.md}`.
#[derive(Debug, Clone)]
pub struct FsArtifactSink {
    root: PathBuf,
}

impl FsArtifactSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ArtifactSink for FsArtifactSink {
    fn persist(
        &self,
        dataset_name: &str,
        cleaned: &Dataset,
        report: &CombinedReport,
    ) -> Result<ArtifactPaths> {
        let dir = self.root.join(dataset_name);
        create_dir_all(&dir)?;

        let paths = ArtifactPaths {
            cleaned_csv: dir.join(CLEANED_FILE),
            report_json: dir.join(REPORT_JSON_FILE),
            report_md: dir.join(REPORT_MD_FILE),
        };

        let rows = write_dataset_csv(&paths.cleaned_csv, cleaned)?;
        write_json_atomic(&paths.report_json, report)?;
        write_bytes_atomic(&paths.report_md, render_report(report).as_bytes())?;

        info!(
            dataset = %dataset_name,
            rows,
            dir = %dir.display(),
            "artifacts written"
        );
        Ok(paths)
    }
}

/// Write a dataset as headed CSV; returns the number of data rows.
pub fn write_dataset_csv(path: &Path, dataset: &Dataset) -> Result<usize> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            create_dir_all(parent)?;
        }
    }
    let writer = BufWriter::new(File::create(path)?);
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    writer.write_record(dataset.columns())?;
    for row in dataset.rows() {
        writer.write_record(row.iter().map(|value| value.to_cell()))?;
    }
    writer.flush()?;
    Ok(dataset.row_count())
}

pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let data = serde_json::to_vec_pretty(value)?;
    write_bytes_atomic(path, &data)
}

/// Write through a sibling temp file, then rename over the target.
pub fn write_bytes_atomic(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            create_dir_all(parent)?;
        }
    }

    let tmp_path = temp_path(path)?;
    let mut file = OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(&tmp_path)?;
    file.write_all(data)?;
    file.sync_all()?;

    std::fs::rename(&tmp_path, path)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            sync_dir(parent)?;
        }
    }
    Ok(())
}

fn temp_path(path: &Path) -> Result<PathBuf> {
    let file_name = path.file_name().ok_or_else(|| {
        PipelineError::Config(format!("invalid artifact path {}", path.display()))
    })?;
    Ok(path.with_file_name(format!("{}.tmp", file_name.to_string_lossy())))
}

#[cfg(unix)]
fn sync_dir(path: &Path) -> io::Result<()> {
    File::open(path)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_path: &Path) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::read_csv;
    use healthqa_core::Value;

    #[test]
    fn csv_round_trip_keeps_nulls_and_dates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let dataset = Dataset::from_records(vec![
            vec![
                ("id", Value::text("P1")),
                ("admitted", Value::Date(chrono::NaiveDate::from_ymd_opt(2024, 2, 1).unwrap())),
                ("note", Value::Null),
            ],
            vec![
                ("id", Value::text("P2")),
                ("admitted", Value::Invalid("soon".to_string())),
                ("note", Value::text("a, b")),
            ],
        ])
        .unwrap();

        assert_eq!(write_dataset_csv(&path, &dataset).unwrap(), 2);
        let reloaded = read_csv(&path).unwrap();
        assert_eq!(reloaded.value(0, "admitted"), Some(&Value::text("2024-02-01")));
        assert_eq!(reloaded.value(0, "note"), Some(&Value::Null));
        assert_eq!(reloaded.value(1, "note"), Some(&Value::text("a, b")));
    }

    #[test]
    fn identifiers_and_codes_round_trip_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.csv");
        std::fs::write(&input, "patient_id,zip,icd9\n00123,02134,250.00\n").unwrap();

        let dataset = read_csv(&input).unwrap();
        assert_eq!(dataset.value(0, "patient_id"), Some(&Value::text("00123")));
        assert_eq!(dataset.value(0, "icd9"), Some(&Value::text("250.00")));

        let output = dir.path().join("out.csv");
        write_dataset_csv(&output, &dataset).unwrap();
        assert_eq!(
            std::fs::read_to_string(&output).unwrap(),
            "patient_id,zip,icd9\n00123,02134,250.00\n"
        );
    }

    #[test]
    fn atomic_write_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("report.json");
        write_json_atomic(&path, &serde_json::json!({ "ok": true })).unwrap();

        assert!(path.is_file());
        assert!(!dir.path().join("nested").join("report.json.tmp").exists());
    }
}
