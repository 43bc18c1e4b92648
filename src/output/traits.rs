//! Exporter trait and output errors

use crate::config::OutputFormat;
use crate::state::DirectoryRecord;
use std::io::Write;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid CSV delimiter {0:?}: must be ASCII and not a quote or newline")]
    Delimiter(char),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Export column order
pub const COLUMNS: [&str; 9] = [
    "name",
    "institution",
    "role",
    "start_date",
    "email",
    "phone",
    "resolution_ref",
    "source_url",
    "biography",
];

/// Serializes records to a writer
///
/// Implementations write the whole collection in one call and return the
/// number of records written.
pub trait RecordExporter {
    /// Format this exporter produces
    fn format(&self) -> OutputFormat;

    /// Writes every record, in order
    fn export(&self, records: &[DirectoryRecord], writer: &mut dyn Write) -> OutputResult<usize>;
}
