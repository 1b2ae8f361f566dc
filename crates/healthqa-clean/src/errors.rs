use thiserror::Error;

/// Errors emitted by the cleaning engine.
#[derive(Debug, Error)]
pub enum CleanError {
    /// The cleaning configuration is structurally invalid; nothing was applied.
    #[error("invalid cleaning config: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Dataset(#[from] healthqa_core::Error),
}

pub type Result<T> = std::result::Result<T, CleanError>;
