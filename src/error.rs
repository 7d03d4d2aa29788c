// src/error.rs

use std::path::PathBuf;

use thiserror::Error;

use crate::data_analysis::sweep::SkipReason;

/// Errors raised by the loading, configuration, and presentation layers.
///
/// Degenerate data inside the analysis core is never reported through this type;
/// the core uses sentinel fit outcomes and excludes groups instead.
#[derive(Debug, Error)]
pub enum BodeError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("could not decode '{0}' with any supported encoding")]
    Decode(PathBuf),

    #[error("column '{column}' not found in the CSV file; columns found: {found:?}")]
    MissingColumn { column: String, found: Vec<String> },

    #[error("row {row}: invalid timestamp '{value}'")]
    Timestamp { row: usize, value: String },

    #[error("row {row}: invalid value '{value}' in column '{column}'")]
    Value {
        row: usize,
        column: String,
        value: String,
    },

    #[error("no valid data rows were read")]
    EmptyDataset,

    #[error("'{0}' is not a valid period in seconds")]
    InvalidPeriodInput(String),

    #[error("period {period}s not found; available periods: {available:?}")]
    UnknownPeriod { period: f64, available: Vec<f64> },

    #[error(transparent)]
    Analysis(#[from] SkipReason),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to parse config file: {0}")]
    ConfigFormat(#[from] toml::de::Error),

    #[error("failed to render '{path}': {message}")]
    Plot { path: PathBuf, message: String },
}
