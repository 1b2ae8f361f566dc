use thiserror::Error;

/// Core error type shared across healthqa crates.
#[derive(Debug, Error)]
pub enum Error {
    /// The dataset violates structural invariants (row width, duplicate columns).
    #[error("invalid dataset: {0}")]
    InvalidDataset(String),
    /// The rule catalog cannot be compiled (bad regex, inverted range).
    #[error("invalid catalog: {0}")]
    InvalidCatalog(String),
}

/// Convenience alias for results returned by healthqa crates.
pub type Result<T> = std::result::Result<T, Error>;
