use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use healthqa_clean::CleaningConfig;
use healthqa_core::RuleCatalog;
use healthqa_eval::{RiskConfig, ValidationConfig};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{PipelineError, Result};
use crate::sources::SourceDefinition;

pub const DEFAULT_CONFIG_FILE: &str = "healthqa.toml";
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// Application configuration file (`healthqa.toml`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub output_dir: PathBuf,
    pub catalog: RuleCatalog,
    pub validation: ValidationConfig,
    pub cleaning: CleaningConfig,
    pub risk: RiskConfig,
    pub batch_sources: Vec<SourceDefinition>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            catalog: RuleCatalog::default(),
            validation: ValidationConfig::default(),
            cleaning: CleaningConfig::all_enabled(),
            risk: RiskConfig::default(),
            batch_sources: Vec::new(),
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|err| {
            PipelineError::Config(format!("failed to read {}: {err}", path.display()))
        })?;
        let config = Self::from_toml_str(&contents)?;
        debug!(path = %path.display(), sources = config.batch_sources.len(), "config loaded");
        Ok(config)
    }

    /// Load `path`, or fall back to defaults when it does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            debug!(path = %path.display(), "config file absent, using defaults");
            Ok(Self::default())
        }
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check every section without touching any data.
    pub fn validate(&self) -> Result<()> {
        self.catalog.compile()?;
        self.validation.weights.normalized()?;
        self.cleaning.validate()?;
        self.risk.validate()?;

        let mut names = HashSet::new();
        for source in &self.batch_sources {
            source.validate()?;
            if !names.insert(source.dataset_name.as_str()) {
                return Err(PipelineError::Config(format!(
                    "dataset_name '{}' appears more than once in batch_sources",
                    source.dataset_name
                )));
            }
        }
        Ok(())
    }
}
