use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Semantic classification of a column; drives validation and cleaning.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum FieldRole {
    Identifier,
    Date,
    Categorical,
    Numeric,
    ClinicalCode,
    FreeText,
}

/// What the `auto` missing-value strategy does for a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleDefault {
    /// Fill with the catalog's constant sentinel (`"Unknown"` by default).
    FillConstant,
    /// Fill with the column median.
    FillMedian,
    /// Leave missing; values of this role are never fabricated.
    Leave,
}

impl FieldRole {
    pub const ALL: [FieldRole; 6] = [
        FieldRole::Identifier,
        FieldRole::Date,
        FieldRole::Categorical,
        FieldRole::Numeric,
        FieldRole::ClinicalCode,
        FieldRole::FreeText,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldRole::Identifier => "identifier",
            FieldRole::Date => "date",
            FieldRole::Categorical => "categorical",
            FieldRole::Numeric => "numeric",
            FieldRole::ClinicalCode => "clinical_code",
            FieldRole::FreeText => "free_text",
        }
    }

    /// Default cleaning strategy for missing values of this role.
    pub fn missing_default(&self) -> RoleDefault {
        match self {
            FieldRole::Categorical | FieldRole::FreeText => RoleDefault::FillConstant,
            FieldRole::Numeric => RoleDefault::FillMedian,
            FieldRole::Identifier | FieldRole::Date | FieldRole::ClinicalCode => {
                RoleDefault::Leave
            }
        }
    }
}

impl fmt::Display for FieldRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
