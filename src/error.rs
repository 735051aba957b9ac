//! Error types for quarterly_metrics
//!
//! Only caller contract violations and I/O failures surface as errors.
//! Business-data gaps (a missing prior quarter, zero capital, no price match)
//! are never errors: the affected metric is left as `None`.

use thiserror::Error;

/// Main error type for quarterly_metrics
#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("Invalid fiscal year end month: {0} (expected 1-12)")]
    InvalidFiscalMonth(u32),

    #[error("Malformed fiscal period label: {0:?}")]
    MalformedPeriod(String),

    #[error("Duplicate fiscal period: {0}")]
    DuplicatePeriod(String),

    #[error("No quarterly records supplied")]
    EmptyInput,

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

/// Result type alias for quarterly_metrics operations
pub type Result<T> = std::result::Result<T, MetricsError>;
