//! Quality scoring and risk classification for healthcare datasets.

pub mod errors;
pub mod report;
pub mod risk;
pub mod validation;

pub use errors::{EvalError, Result};
pub use report::{push_risk_section, push_validation_section};
pub use risk::{
    CompletenessDetector, ConsistencyDetector, DatePair, PlausibilityDetector, PlausibilityRule,
    Risk, RiskAssessment, RiskAssessor, RiskCategory, RiskConfig, RiskContext, RiskDetector,
    RiskSummary, Severity, StayColumns,
};
pub use validation::{FieldQuality, ScoreWeights, ValidationConfig, ValidationResult, Validator};
