//! Bounded-memory sampling of large delimited files for charting
//!
//! The pipeline is strictly linear: the source reader yields batches of raw
//! rows, the reservoir keeps a uniform sample of them, the coercion stage types
//! the chart columns, and the post-sample filter narrows the typed rows down.

pub mod coercion;
pub mod config;
pub mod export;
pub mod filter;
pub mod pipeline;
pub mod result;
pub mod sampling;
pub mod schema;
pub mod sources;

use std::path::PathBuf;

use arrow::error::ArrowError;
use tokio::task::JoinError;
use thiserror::Error;

// Re-exports
pub use config::{ChartKind, NullConfig, SampleConfig};
pub use filter::RowFilter;
pub use pipeline::{sample, sample_async, sample_cancellable, sample_with_rng, SampleOutcome, InterruptedSample};
pub use result::{CoercedRow, ColumnInfo, SampleResult};
pub use schema::{preview, FilterHint, Preview};
pub use sources::{CsvBatchReader, Source};

/// Errors that can occur while sampling a source
#[derive(Error, Debug)]
pub enum DataError {
    #[error("source not found: {}", path.display())]
    SourceNotFound { path: PathBuf },

    #[error("could not decode line {line} as {encoding}")]
    Encoding { line: u64, encoding: &'static str },

    #[error("unsupported encoding: {0}")]
    UnsupportedEncoding(String),

    #[error("column '{column}' ({role}) not found in header")]
    ColumnNotFound { column: String, role: &'static str },

    #[error("max_rows must be a positive integer, got {0}")]
    InvalidCapacity(i64),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("source has no header line")]
    EmptySource,

    #[error("no rows left after sampling and filtering")]
    EmptyResult,

    #[error("sampling was interrupted after {rows_seen} rows")]
    Interrupted { rows_seen: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(String),

    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    #[error("Join error: {0}")]
    Join(#[from] JoinError),
}

impl From<csv::Error> for DataError {
    fn from(error: csv::Error) -> Self {
        match error.kind() {
            csv::ErrorKind::Io(io_err) => DataError::Io(std::io::Error::new(io_err.kind(), error.to_string())),
            _ => DataError::Csv(error.to_string()),
        }
    }
}

impl DataError {
    /// Whether the error is a configuration problem detected before reading data
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            DataError::ColumnNotFound { .. }
                | DataError::InvalidCapacity(_)
                | DataError::InvalidConfig(_)
                | DataError::UnsupportedEncoding(_)
        )
    }
}
