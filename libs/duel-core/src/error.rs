//! Error types for duel-core.

use thiserror::Error;

/// Result type alias using ParseError.
pub type Result<T> = std::result::Result<T, ParseError>;

/// Errors that can occur while parsing timestamps, records, or CSV rows.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("bad date format: {value}")]
    BadDateFormat { value: String },

    #[error("missing field: {field}")]
    MissingField { field: &'static str },

    #[error("unknown game mode: {value}")]
    UnknownGameMode { value: String },

    #[error("invalid record: {0}")]
    InvalidRecord(String),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}
