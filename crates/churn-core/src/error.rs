//! Error types for churn-core

use thiserror::Error;

/// Result type alias for churn operations
pub type Result<T> = std::result::Result<T, ChurnError>;

/// Main error type for churn operations
#[derive(Error, Debug)]
pub enum ChurnError {
    /// A required raw field is missing or cannot be cast to its column type
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    /// A schema column could not be assembled, or the scorer disagrees with the schema
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    /// The scorer raised or produced unusable output
    #[error("Scorer failure: {0}")]
    ScorerFailure(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl ChurnError {
    /// Whether the caller is at fault (as opposed to the service)
    pub fn is_client_error(&self) -> bool {
        matches!(self, ChurnError::MalformedRequest(_))
    }
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Reading a config or artifact file failed
    #[error("IO error reading {path}: {message}")]
    Io { path: String, message: String },

    /// Config or artifact could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// A one-hot column name cannot be split into field and value
    #[error("Invalid one-hot column {column:?}: {reason}")]
    InvalidColumn { column: String, reason: String },

    /// A column name appears twice
    #[error("Duplicate column: {0}")]
    DuplicateColumn(String),

    /// A numeric column has no training-time range
    #[error("Missing min/max range for numeric column {0}")]
    MissingRange(String),

    /// A min/max range cannot be used for scaling
    #[error("Invalid range for {column}: min={min}, max={max}")]
    InvalidRange { column: String, min: f64, max: f64 },

    /// Value out of valid range
    #[error("Value out of range: {0}")]
    OutOfRange(String),

    /// A required setting is missing or unusable
    #[error("Invalid setting: {0}")]
    Invalid(String),
}
