//! Source definitions and the loaders that turn them into datasets.

use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use healthqa_core::{Dataset, Value};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::{PipelineError, Result};
use crate::sample::{
    DEFAULT_SAMPLE_RECORDS, DEFAULT_SAMPLE_SEED, MAX_SAMPLE_RECORDS, generate_sample,
};

/// Named dataset origin.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Cdc,
    Cms,
    Fda,
    Mimic,
    Eicu,
    UciHeart,
    Csv,
    Json,
    Sample,
}

impl SourceType {
    pub const ALL: [SourceType; 9] = [
        SourceType::Cdc,
        SourceType::Cms,
        SourceType::Fda,
        SourceType::Mimic,
        SourceType::Eicu,
        SourceType::UciHeart,
        SourceType::Csv,
        SourceType::Json,
        SourceType::Sample,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Cdc => "cdc",
            SourceType::Cms => "cms",
            SourceType::Fda => "fda",
            SourceType::Mimic => "mimic",
            SourceType::Eicu => "eicu",
            SourceType::UciHeart => "uci_heart",
            SourceType::Csv => "csv",
            SourceType::Json => "json",
            SourceType::Sample => "sample",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            SourceType::Cdc => "CDC public health extract",
            SourceType::Cms => "CMS claims and provider extract",
            SourceType::Fda => "FDA adverse event extract",
            SourceType::Mimic => "MIMIC critical care extract",
            SourceType::Eicu => "eICU collaborative research extract",
            SourceType::UciHeart => "UCI heart disease dataset",
            SourceType::Csv => "local CSV file",
            SourceType::Json => "local JSON file",
            SourceType::Sample => "synthetic admissions sample",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceType {
    type Err = PipelineError;

    fn from_str(value: &str) -> Result<Self> {
        let wanted = value.trim().to_ascii_lowercase().replace('-', "_");
        SourceType::ALL
            .iter()
            .copied()
            .find(|source| source.as_str() == wanted)
            .ok_or_else(|| PipelineError::InvalidSource(format!("unknown source type '{value}'")))
    }
}

/// One batch unit: where to load from and what to call the result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SourceDefinition {
    pub source_type: SourceType,
    pub dataset_name: String,
    /// Loader-specific parameters (`path`, `format`, `records`, `seed`).
    #[serde(flatten)]
    pub params: BTreeMap<String, serde_json::Value>,
}

impl SourceDefinition {
    pub fn new(source_type: SourceType, dataset_name: &str) -> Self {
        Self {
            source_type,
            dataset_name: dataset_name.to_string(),
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(|value| value.as_str())
    }

    pub fn param_u64(&self, key: &str) -> Result<Option<u64>> {
        match self.params.get(key) {
            None => Ok(None),
            Some(value) => value.as_u64().map(Some).ok_or_else(|| {
                PipelineError::InvalidSource(format!(
                    "{}: parameter '{key}' must be a non-negative integer",
                    self.dataset_name
                ))
            }),
        }
    }

    /// The dataset name becomes an output directory; keep it a single plain segment.
    pub fn validate(&self) -> Result<()> {
        let name = self.dataset_name.trim();
        if name.is_empty() {
            return Err(PipelineError::InvalidSource(
                "dataset_name must not be empty".to_string(),
            ));
        }
        if name == "." || name == ".." || name.contains(['/', '\\']) {
            return Err(PipelineError::InvalidSource(format!(
                "dataset_name '{name}' must be a plain directory name"
            )));
        }
        Ok(())
    }
}

/// Produces a dataset for a source definition.
pub trait SourceLoader {
    fn load(&self, source: &SourceDefinition) -> Result<Dataset>;
}

/// Reads the `path` parameter as CSV or JSON, chosen by the `format`
/// parameter or the file extension.
pub struct FileLoader;

impl SourceLoader for FileLoader {
    fn load(&self, source: &SourceDefinition) -> Result<Dataset> {
        let path = source.param_str("path").map(PathBuf::from).ok_or_else(|| {
            PipelineError::Load(format!(
                "{} source '{}' requires a 'path' parameter",
                source.source_type, source.dataset_name
            ))
        })?;
        if !path.is_file() {
            return Err(PipelineError::Load(format!(
                "source file not found: {}",
                path.display()
            )));
        }

        let format = source
            .param_str("format")
            .map(|format| format.to_ascii_lowercase())
            .or_else(|| {
                path.extension()
                    .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
            })
            .unwrap_or_else(|| "csv".to_string());

        let dataset = match format.as_str() {
            "csv" | "txt" => read_csv(&path)?,
            "json" => read_json(&path)?,
            other => {
                return Err(PipelineError::Load(format!(
                    "unsupported file format '{other}' for {}",
                    path.display()
                )));
            }
        };
        debug!(path = %path.display(), rows = dataset.row_count(), "file loaded");
        Ok(dataset)
    }
}

/// Generates the synthetic admissions dataset (`records`, `seed`).
pub struct SampleLoader;

impl SourceLoader for SampleLoader {
    fn load(&self, source: &SourceDefinition) -> Result<Dataset> {
        let records = match source.param_u64("records")? {
            None => DEFAULT_SAMPLE_RECORDS,
            Some(records) => usize::try_from(records)
                .ok()
                .filter(|records| *records <= MAX_SAMPLE_RECORDS)
                .ok_or_else(|| {
                    PipelineError::InvalidSource(format!(
                        "{}: records must be at most {MAX_SAMPLE_RECORDS}, got {records}",
                        source.dataset_name
                    ))
                })?,
        };
        let seed = source.param_u64("seed")?.unwrap_or(DEFAULT_SAMPLE_SEED);
        Ok(generate_sample(records, seed)?)
    }
}

/// Loaders keyed by source type.
pub struct LoaderRegistry {
    loaders: BTreeMap<SourceType, Box<dyn SourceLoader>>,
}

impl LoaderRegistry {
    pub fn empty() -> Self {
        Self {
            loaders: BTreeMap::new(),
        }
    }

    pub fn register(&mut self, source_type: SourceType, loader: Box<dyn SourceLoader>) {
        self.loaders.insert(source_type, loader);
    }

    pub fn supports(&self, source_type: SourceType) -> bool {
        self.loaders.contains_key(&source_type)
    }

    pub fn load(&self, source: &SourceDefinition) -> Result<Dataset> {
        let loader = self
            .loaders
            .get(&source.source_type)
            .ok_or(PipelineError::NoLoader(source.source_type))?;
        info!(
            source_type = %source.source_type,
            dataset = %source.dataset_name,
            "loading source"
        );
        loader.load(source)
    }
}

impl Default for LoaderRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        for source_type in SourceType::ALL {
            if source_type == SourceType::Sample {
                registry.register(source_type, Box::new(SampleLoader));
            } else {
                registry.register(source_type, Box::new(FileLoader));
            }
        }
        registry
    }
}

/// Read a headed CSV file; every row must match the header width.
pub fn read_csv(path: &Path) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_path(path)?;

    let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(Value::from_cell).collect());
    }
    Ok(Dataset::new(columns, rows)?)
}

/// Read a JSON array of objects, or an object holding one under `records`.
pub fn read_json(path: &Path) -> Result<Dataset> {
    let reader = BufReader::new(File::open(path)?);
    let document: serde_json::Value = serde_json::from_reader(reader)?;

    let items = match &document {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(map) => match map.get("records") {
            Some(serde_json::Value::Array(items)) => items,
            _ => {
                return Err(PipelineError::Load(format!(
                    "{}: expected an array of records",
                    path.display()
                )));
            }
        },
        _ => {
            return Err(PipelineError::Load(format!(
                "{}: expected an array of records",
                path.display()
            )));
        }
    };

    let mut records = Vec::with_capacity(items.len());
    for (idx, item) in items.iter().enumerate() {
        let object = item.as_object().ok_or_else(|| {
            PipelineError::Load(format!(
                "{}: record {} is not an object",
                path.display(),
                idx + 1
            ))
        })?;
        records.push(
            object
                .iter()
                .map(|(key, value)| (key.clone(), json_value(value)))
                .collect::<Vec<_>>(),
        );
    }
    Ok(Dataset::from_records(records)?)
}

fn json_value(value: &serde_json::Value) -> Value {
    match value {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Number(number) => number.as_f64().map(Value::Number).unwrap_or(Value::Null),
        serde_json::Value::String(text) => Value::from_cell(text),
        serde_json::Value::Bool(flag) => Value::text(flag.to_string()),
        other => Value::text(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_source_type_names() {
        assert_eq!("uci-heart".parse::<SourceType>().unwrap(), SourceType::UciHeart);
        assert_eq!("MIMIC".parse::<SourceType>().unwrap(), SourceType::Mimic);
        assert!("hl7".parse::<SourceType>().is_err());
    }

    #[test]
    fn definitions_flatten_params() {
        let source: SourceDefinition = serde_json::from_value(serde_json::json!({
            "source_type": "cdc",
            "dataset_name": "cdc_2023",
            "path": "data/cdc.csv"
        }))
        .unwrap();
        assert_eq!(source.source_type, SourceType::Cdc);
        assert_eq!(source.param_str("path"), Some("data/cdc.csv"));
    }

    #[test]
    fn rejects_path_like_dataset_names() {
        assert!(SourceDefinition::new(SourceType::Csv, "../escape").validate().is_err());
        assert!(SourceDefinition::new(SourceType::Csv, " ").validate().is_err());
        assert!(SourceDefinition::new(SourceType::Csv, "cms_2022").validate().is_ok());
    }

    #[test]
    fn file_loader_requires_path() {
        let source = SourceDefinition::new(SourceType::Cms, "cms");
        let err = LoaderRegistry::default().load(&source).unwrap_err();
        assert!(matches!(err, PipelineError::Load(_)));
    }

    #[test]
    fn oversized_sample_is_rejected_before_generation() {
        let source = SourceDefinition::new(SourceType::Sample, "huge")
            .with_param("records", 1_000_000_000_000u64);
        match LoaderRegistry::default().load(&source) {
            Err(PipelineError::InvalidSource(message)) => assert!(message.contains("at most")),
            other => panic!("expected invalid source, got {other:?}"),
        }
    }

    #[test]
    fn sample_params_must_be_integers() {
        let source = SourceDefinition::new(SourceType::Sample, "demo").with_param("records", "ten");
        assert!(matches!(
            LoaderRegistry::default().load(&source),
            Err(PipelineError::InvalidSource(_))
        ));
    }
}
