use thiserror::Error;

use crate::sources::SourceType;

/// Errors raised while loading, processing or persisting one source.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("load error: {0}")]
    Load(String),
    #[error("no loader registered for source type '{0}'")]
    NoLoader(SourceType),
    #[error("invalid source definition: {0}")]
    InvalidSource(String),
    #[error("invalid config: {0}")]
    Config(String),
    #[error(transparent)]
    Core(#[from] healthqa_core::Error),
    #[error(transparent)]
    Clean(#[from] healthqa_clean::CleanError),
    #[error(transparent)]
    Eval(#[from] healthqa_eval::EvalError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("toml parse error: {0}")]
    TomlDe(#[from] toml::de::Error),
    #[error("toml write error: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
