use std::collections::BTreeSet;

use healthqa_core::{CompiledCatalog, Dataset, FieldRole};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::{EvalError, Result};

/// Relative weights of completeness and validity in the quality score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct ScoreWeights {
    pub completeness: f64,
    pub validity: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            completeness: 0.5,
            validity: 0.5,
        }
    }
}

impl ScoreWeights {
    /// Scale the weights so they sum to 1.
    pub fn normalized(&self) -> Result<Self> {
        let weights = [self.completeness, self.validity];
        if weights.iter().any(|weight| !weight.is_finite() || *weight < 0.0) {
            return Err(EvalError::InvalidConfig(format!(
                "score weights must be finite and non-negative (completeness={}, validity={})",
                self.completeness, self.validity
            )));
        }
        let sum = self.completeness + self.validity;
        if sum <= 0.0 {
            return Err(EvalError::InvalidConfig(
                "score weights must not all be zero".to_string(),
            ));
        }
        Ok(Self {
            completeness: self.completeness / sum,
            validity: self.validity / sum,
        })
    }
}

/// Validator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct ValidationConfig {
    pub weights: ScoreWeights,
    /// Maximum number of distinct failing values kept per field.
    pub max_examples: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            max_examples: 5,
        }
    }
}

/// Quality metrics for one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldQuality {
    pub field: String,
    pub role: FieldRole,
    pub total: usize,
    pub non_null: usize,
    pub valid: usize,
    pub completeness: f64,
    pub validity: f64,
    /// Weighted field score in `[0, 1]`.
    pub score: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub invalid_examples: Vec<String>,
}

/// Per-field and overall quality scores for one dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub total_records: usize,
    pub weights: ScoreWeights,
    pub fields: Vec<FieldQuality>,
    /// Weighted mean over fields, scaled to `[0, 100]`.
    pub overall_score: f64,
}

impl ValidationResult {
    pub fn field(&self, name: &str) -> Option<&FieldQuality> {
        self.fields.iter().find(|field| field.field == name)
    }
}

/// Applies the rule catalog to a dataset. Never alters or drops data.
#[derive(Debug, Clone)]
pub struct Validator {
    catalog: CompiledCatalog,
    weights: ScoreWeights,
    max_examples: usize,
}

impl Validator {
    pub fn new(catalog: CompiledCatalog, config: &ValidationConfig) -> Result<Self> {
        Ok(Self {
            catalog,
            weights: config.weights.normalized()?,
            max_examples: config.max_examples,
        })
    }

    pub fn weights(&self) -> ScoreWeights {
        self.weights
    }

    pub fn validate(&self, dataset: &Dataset) -> ValidationResult {
        let binding = self.catalog.bind(dataset);
        let total = dataset.row_count();

        let fields: Vec<FieldQuality> = binding
            .iter()
            .enumerate()
            .map(|(idx, bound)| self.score_field(dataset, idx, &bound.name, bound.role, total))
            .collect();

        // No columns means nothing to vouch for.
        let overall_score = if fields.is_empty() {
            0.0
        } else {
            let mean = fields.iter().map(|field| field.score).sum::<f64>() / fields.len() as f64;
            (mean * 100.0).clamp(0.0, 100.0)
        };

        info!(
            records = total,
            fields = fields.len(),
            overall_score,
            "validation completed"
        );

        ValidationResult {
            total_records: total,
            weights: self.weights,
            fields,
            overall_score,
        }
    }

    fn score_field(
        &self,
        dataset: &Dataset,
        idx: usize,
        name: &str,
        role: FieldRole,
        total: usize,
    ) -> FieldQuality {
        let mut non_null = 0usize;
        let mut valid = 0usize;
        let mut examples = BTreeSet::new();
        let mut ordered_examples = Vec::new();

        for value in dataset.column_values(idx) {
            if value.is_null() {
                continue;
            }
            non_null += 1;
            if self.catalog.is_valid(name, role, value) {
                valid += 1;
            } else if ordered_examples.len() < self.max_examples {
                let raw = value.to_cell();
                if examples.insert(raw.clone()) {
                    ordered_examples.push(raw);
                }
            }
        }

        // Empty columns: completeness 0, vacuously valid.
        let completeness = if total == 0 {
            0.0
        } else {
            non_null as f64 / total as f64
        };
        let validity = if non_null == 0 {
            1.0
        } else {
            valid as f64 / non_null as f64
        };
        let score = self.weights.completeness * completeness + self.weights.validity * validity;

        debug!(field = %name, role = %role, completeness, validity, "field scored");

        FieldQuality {
            field: name.to_string(),
            role,
            total,
            non_null,
            valid,
            completeness,
            validity,
            score,
            invalid_examples: ordered_examples,
        }
    }
}
