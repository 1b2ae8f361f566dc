//! Declarative validation rules and role inference.
//!
//! A [`RuleCatalog`] is plain configuration data; [`RuleCatalog::compile`]
//! checks it once and produces a [`CompiledCatalog`] that the validator,
//! cleaner and risk assessor share.

use std::collections::BTreeMap;

use chrono::format::{Item, StrftimeItems};
use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;
use crate::error::{Error, Result};
use crate::role::FieldRole;
use crate::value::Value;

/// Inclusive/exclusive numeric bounds for a plausible value range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct NumericRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default = "default_true")]
    pub min_inclusive: bool,
    #[serde(default = "default_true")]
    pub max_inclusive: bool,
}

impl NumericRange {
    pub fn inclusive(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
            min_inclusive: true,
            max_inclusive: true,
        }
    }

    pub fn exclusive(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
            min_inclusive: false,
            max_inclusive: false,
        }
    }

    pub fn at_least(min: f64) -> Self {
        Self {
            min: Some(min),
            max: None,
            min_inclusive: true,
            max_inclusive: true,
        }
    }

    pub fn at_most(max: f64) -> Self {
        Self {
            min: None,
            max: Some(max),
            min_inclusive: true,
            max_inclusive: true,
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        let above_min = match self.min {
            Some(min) if self.min_inclusive => value >= min,
            Some(min) => value > min,
            None => true,
        };
        let below_max = match self.max {
            Some(max) if self.max_inclusive => value <= max,
            Some(max) => value < max,
            None => true,
        };
        above_min && below_max
    }

    /// Human-readable interval notation, e.g. `(0, 300)` or `[0, ∞)`.
    pub fn describe(&self) -> String {
        let open = if self.min_inclusive && self.min.is_some() {
            '['
        } else {
            '('
        };
        let close = if self.max_inclusive && self.max.is_some() {
            ']'
        } else {
            ')'
        };
        let min = self
            .min
            .map(crate::value::format_number)
            .unwrap_or_else(|| "-∞".to_string());
        let max = self
            .max
            .map(crate::value::format_number)
            .unwrap_or_else(|| "∞".to_string());
        format!("{open}{min}, {max}{close}")
    }

    /// Bounds must be finite and ordered; an open side is written as `None`.
    pub fn check(&self, column: &str) -> Result<()> {
        for bound in [self.min, self.max].into_iter().flatten() {
            if !bound.is_finite() {
                return Err(Error::InvalidCatalog(format!(
                    "range for '{column}' has non-finite bound {bound}"
                )));
            }
        }
        if let (Some(min), Some(max)) = (self.min, self.max) {
            if min > max {
                return Err(Error::InvalidCatalog(format!(
                    "range for '{column}' has min {min} greater than max {max}"
                )));
            }
        }
        Ok(())
    }
}

/// How a role pattern is compared against a normalised column name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Exact,
    Prefix,
    Suffix,
    Contains,
}

/// Name-pattern rule assigning a role to matching columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct RolePattern {
    #[serde(rename = "match")]
    pub kind: MatchKind,
    pub pattern: String,
    pub role: FieldRole,
}

impl RolePattern {
    pub fn new(kind: MatchKind, pattern: &str, role: FieldRole) -> Self {
        Self {
            kind,
            pattern: pattern.to_string(),
            role,
        }
    }

    fn matches(&self, normalized: &str) -> bool {
        let pattern = self.pattern.as_str();
        match self.kind {
            MatchKind::Exact => normalized == pattern,
            MatchKind::Prefix => normalized.starts_with(pattern),
            MatchKind::Suffix => normalized.ends_with(pattern),
            MatchKind::Contains => normalized.contains(pattern),
        }
    }
}

/// Declarative validation checks keyed by field role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct RuleCatalog {
    /// Accepted date formats, tried in order; the first match wins.
    pub date_formats: Vec<String>,
    /// Accepted datetime formats; only the date part is kept.
    pub datetime_formats: Vec<String>,
    /// Regex identifiers must match.
    pub identifier_pattern: String,
    /// Regex clinical codes must match (case-insensitive).
    pub clinical_code_pattern: String,
    /// Plausible ranges for numeric columns, keyed by column name.
    pub numeric_ranges: BTreeMap<String, NumericRange>,
    /// Allowed values for categorical columns (case-insensitive).
    pub allowed_values: BTreeMap<String, Vec<String>>,
    /// Explicit role assignments; these win over pattern inference.
    pub role_overrides: BTreeMap<String, FieldRole>,
    /// Ordered name patterns used when no override applies.
    pub role_patterns: Vec<RolePattern>,
    /// Sentinel used when filling missing categorical/free-text values.
    pub missing_sentinel: String,
}

impl Default for RuleCatalog {
    fn default() -> Self {
        let mut numeric_ranges = BTreeMap::new();
        numeric_ranges.insert("age".to_string(), NumericRange::inclusive(0.0, 120.0));
        numeric_ranges.insert(
            "systolic_bp".to_string(),
            NumericRange::exclusive(0.0, 300.0),
        );
        numeric_ranges.insert(
            "diastolic_bp".to_string(),
            NumericRange::exclusive(0.0, 200.0),
        );
        numeric_ranges.insert(
            "heart_rate".to_string(),
            NumericRange::exclusive(0.0, 300.0),
        );
        numeric_ranges.insert(
            "length_of_stay".to_string(),
            NumericRange::inclusive(0.0, 365.0),
        );
        numeric_ranges.insert("total_charges".to_string(), NumericRange::at_least(0.0));

        let mut allowed_values = BTreeMap::new();
        allowed_values.insert(
            "gender".to_string(),
            ["M", "F", "U", "Male", "Female", "Unknown", "Other"]
                .iter()
                .map(|value| value.to_string())
                .collect(),
        );

        Self {
            date_formats: ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y", "%Y%m%d"]
                .iter()
                .map(|format| format.to_string())
                .collect(),
            datetime_formats: ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"]
                .iter()
                .map(|format| format.to_string())
                .collect(),
            identifier_pattern: "^[A-Za-z0-9][A-Za-z0-9_-]*$".to_string(),
            clinical_code_pattern: r"^[A-TV-Z][0-9][0-9AB](\.[0-9A-TV-Z]{1,4})?$".to_string(),
            numeric_ranges,
            allowed_values,
            role_overrides: BTreeMap::new(),
            role_patterns: default_role_patterns(),
            missing_sentinel: "Unknown".to_string(),
        }
    }
}

fn default_role_patterns() -> Vec<RolePattern> {
    use FieldRole::{Categorical, ClinicalCode, Date, Identifier, Numeric};
    use MatchKind::{Contains, Exact, Suffix};

    vec![
        RolePattern::new(Exact, "id", Identifier),
        RolePattern::new(Suffix, "_id", Identifier),
        RolePattern::new(Exact, "mrn", Identifier),
        RolePattern::new(Contains, "date", Date),
        RolePattern::new(Exact, "dob", Date),
        RolePattern::new(Suffix, "_at", Date),
        RolePattern::new(Contains, "diagnosis", ClinicalCode),
        RolePattern::new(Contains, "icd", ClinicalCode),
        RolePattern::new(Suffix, "_code", ClinicalCode),
        RolePattern::new(Exact, "age", Numeric),
        RolePattern::new(Contains, "length_of_stay", Numeric),
        RolePattern::new(Exact, "los", Numeric),
        RolePattern::new(Contains, "charge", Numeric),
        RolePattern::new(Contains, "cost", Numeric),
        RolePattern::new(Contains, "amount", Numeric),
        RolePattern::new(Suffix, "_bp", Numeric),
        RolePattern::new(Contains, "heart_rate", Numeric),
        RolePattern::new(Contains, "pulse", Numeric),
        RolePattern::new(Contains, "weight", Numeric),
        RolePattern::new(Contains, "height", Numeric),
        RolePattern::new(Contains, "temperature", Numeric),
        RolePattern::new(Suffix, "_count", Numeric),
        RolePattern::new(Suffix, "_score", Numeric),
        RolePattern::new(Contains, "gender", Categorical),
        RolePattern::new(Exact, "sex", Categorical),
        RolePattern::new(Contains, "race", Categorical),
        RolePattern::new(Contains, "ethnicity", Categorical),
        RolePattern::new(Contains, "insurance", Categorical),
        RolePattern::new(Suffix, "_status", Categorical),
        RolePattern::new(Suffix, "_type", Categorical),
        RolePattern::new(Suffix, "_category", Categorical),
    ]
}

fn default_true() -> bool {
    true
}

impl RuleCatalog {
    /// Check the catalog and compile its patterns.
    pub fn compile(&self) -> Result<CompiledCatalog> {
        if self.date_formats.is_empty() {
            return Err(Error::InvalidCatalog(
                "at least one date format is required".to_string(),
            ));
        }
        for format in self.date_formats.iter().chain(&self.datetime_formats) {
            check_format(format)?;
        }

        let identifier = Regex::new(&self.identifier_pattern).map_err(|err| {
            Error::InvalidCatalog(format!("identifier_pattern: {err}"))
        })?;
        let clinical_code = Regex::new(&format!("(?i){}", self.clinical_code_pattern))
            .map_err(|err| Error::InvalidCatalog(format!("clinical_code_pattern: {err}")))?;

        let mut ranges = BTreeMap::new();
        for (column, range) in &self.numeric_ranges {
            range.check(column)?;
            ranges.insert(normalize_column_name(column), range.clone());
        }

        let allowed = self
            .allowed_values
            .iter()
            .map(|(column, values)| {
                (
                    normalize_column_name(column),
                    values
                        .iter()
                        .map(|value| value.trim().to_lowercase())
                        .collect::<Vec<_>>(),
                )
            })
            .collect();

        let overrides = self
            .role_overrides
            .iter()
            .map(|(column, role)| (normalize_column_name(column), *role))
            .collect();

        Ok(CompiledCatalog {
            catalog: self.clone(),
            identifier,
            clinical_code,
            ranges,
            allowed,
            overrides,
        })
    }
}

fn check_format(format: &str) -> Result<()> {
    if format.trim().is_empty()
        || StrftimeItems::new(format).any(|item| matches!(item, Item::Error))
    {
        return Err(Error::InvalidCatalog(format!("invalid date format '{format}'")));
    }
    Ok(())
}

/// A column bound to its role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundField {
    pub name: String,
    pub role: FieldRole,
}

/// Explicit column → role assignment produced in one deterministic pass.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SchemaBinding {
    pub fields: Vec<BoundField>,
}

impl SchemaBinding {
    pub fn role_of(&self, column: &str) -> Option<FieldRole> {
        self.fields
            .iter()
            .find(|field| field.name == column)
            .map(|field| field.role)
    }

    /// Columns with the given role, in dataset order.
    pub fn columns_with_role(&self, role: FieldRole) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|field| field.role == role)
            .map(|field| field.name.as_str())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BoundField> {
        self.fields.iter()
    }
}

/// Checked catalog with compiled patterns and normalised lookups.
#[derive(Debug, Clone)]
pub struct CompiledCatalog {
    catalog: RuleCatalog,
    identifier: Regex,
    clinical_code: Regex,
    ranges: BTreeMap<String, NumericRange>,
    allowed: BTreeMap<String, Vec<String>>,
    overrides: BTreeMap<String, FieldRole>,
}

impl CompiledCatalog {
    pub fn catalog(&self) -> &RuleCatalog {
        &self.catalog
    }

    pub fn missing_sentinel(&self) -> &str {
        &self.catalog.missing_sentinel
    }

    /// Resolve the role of a column: override, then first matching pattern,
    /// then `free_text`.
    pub fn infer_role(&self, column: &str) -> FieldRole {
        let normalized = normalize_column_name(column);
        if let Some(role) = self.overrides.get(&normalized) {
            return *role;
        }
        self.catalog
            .role_patterns
            .iter()
            .find(|pattern| pattern.matches(&normalized))
            .map(|pattern| pattern.role)
            .unwrap_or(FieldRole::FreeText)
    }

    pub fn bind_columns(&self, columns: &[String]) -> SchemaBinding {
        SchemaBinding {
            fields: columns
                .iter()
                .map(|name| BoundField {
                    name: name.clone(),
                    role: self.infer_role(name),
                })
                .collect(),
        }
    }

    pub fn bind(&self, dataset: &Dataset) -> SchemaBinding {
        self.bind_columns(dataset.columns())
    }

    pub fn numeric_range(&self, column: &str) -> Option<&NumericRange> {
        self.ranges.get(&normalize_column_name(column))
    }

    /// Parse text against the accepted formats; the first match wins.
    pub fn parse_date(&self, raw: &str) -> Option<NaiveDate> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        self.catalog
            .date_formats
            .iter()
            .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
            .or_else(|| {
                self.catalog.datetime_formats.iter().find_map(|format| {
                    NaiveDateTime::parse_from_str(trimmed, format)
                        .ok()
                        .map(|value| value.date())
                })
            })
    }

    /// Date view of a value: dates as-is, text and numbers parsed.
    pub fn date_value(&self, value: &Value) -> Option<NaiveDate> {
        match value {
            Value::Date(date) => Some(*date),
            Value::Text(text) => self.parse_date(text),
            Value::Number(_) => self.parse_date(&value.to_cell()),
            Value::Null | Value::Invalid(_) => None,
        }
    }

    /// Role-specific validity predicate for a non-null value.
    pub fn is_valid(&self, column: &str, role: FieldRole, value: &Value) -> bool {
        match value {
            Value::Null | Value::Invalid(_) => return false,
            _ => {}
        }

        match role {
            FieldRole::Date => self.date_value(value).is_some(),
            FieldRole::Numeric => match value.as_f64() {
                Some(number) => self
                    .numeric_range(column)
                    .map(|range| range.contains(number))
                    .unwrap_or(true),
                None => false,
            },
            FieldRole::Identifier => scalar_text(value)
                .map(|text| !text.is_empty() && self.identifier.is_match(&text))
                .unwrap_or(false),
            FieldRole::Categorical => match scalar_text(value) {
                Some(text) if !text.is_empty() => {
                    match self.allowed.get(&normalize_column_name(column)) {
                        Some(allowed) => allowed.contains(&text.to_lowercase()),
                        None => true,
                    }
                }
                _ => false,
            },
            FieldRole::ClinicalCode => scalar_text(value)
                .map(|text| self.clinical_code.is_match(&text))
                .unwrap_or(false),
            FieldRole::FreeText => true,
        }
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Text(text) => Some(text.trim().to_string()),
        Value::Number(_) => Some(value.to_cell()),
        _ => None,
    }
}

/// Canonical column name: lowercase, runs of non-alphanumerics collapsed to
/// `_`, no leading or trailing `_`. Applying it twice is a no-op.
pub fn normalize_column_name(name: &str) -> String {
    let mut normalized = String::with_capacity(name.len());
    let mut pending_separator = false;
    for ch in name.trim().chars() {
        if ch.is_alphanumeric() {
            if pending_separator && !normalized.is_empty() {
                normalized.push('_');
            }
            pending_separator = false;
            normalized.extend(ch.to_lowercase());
        } else {
            pending_separator = true;
        }
    }
    normalized
}
