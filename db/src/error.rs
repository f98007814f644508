//! Error types for file-backed storage.
//!
//! Covers the card database file, the authoritative CSV import, the decklist
//! corpus directory, run configuration and report output.

use std::path::PathBuf;

use deckstats_core::ReportError;
use thiserror::Error;

/// Errors that can occur while reading or writing deckstats files.
#[derive(Debug, Error)]
pub enum StoreError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing or serialization failure.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// CSV parsing or writing failure.
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// An authoritative card row is missing a required field.
    #[error("invalid card row {line}: {reason}")]
    InvalidRow { line: u64, reason: String },

    /// The corpus directory for a format/archetype does not exist or is not
    /// a directory.
    #[error("invalid corpus path {}: {reason}", path.display())]
    InvalidCorpus { path: PathBuf, reason: String },

    /// Report rendering failure.
    #[error("report error: {0}")]
    ReportError(#[from] ReportError),
}

/// Convenience alias for results with [`StoreError`].
pub type Result<T> = std::result::Result<T, StoreError>;
