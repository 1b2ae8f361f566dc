use thiserror::Error;

/// Errors emitted while configuring the validator or the risk assessor.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Catalog(#[from] healthqa_core::Error),
}

pub type Result<T> = std::result::Result<T, EvalError>;
