//! Output module for exporting records and run reports
//!
//! This module handles:
//! - Collecting the records of a run
//! - Exporting them as CSV, JSON Lines or a JSON array
//! - Run statistics and the markdown summary

mod collection;
mod csv_output;
mod json_output;
mod markdown;
pub mod stats;
mod traits;

pub use collection::{duplicate_source_urls, RecordCollection};
pub use csv_output::CsvExporter;
pub use json_output::{JsonExporter, JsonLinesExporter};
pub use markdown::{format_markdown_summary, generate_markdown_summary, RunSummary};
pub use stats::{print_statistics, RunStatistics};
pub use traits::{OutputError, OutputResult, RecordExporter, COLUMNS};

use crate::config::{OutputConfig, OutputFormat};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// Today's local date as used in output paths (YYYYMMDD)
pub fn date_stamp() -> String {
    chrono::Local::now().format("%Y%m%d").to_string()
}

/// Converts a configured delimiter into the single byte the CSV writer takes
fn csv_delimiter(delimiter: char) -> OutputResult<u8> {
    if delimiter.is_ascii() && !matches!(delimiter, '"' | '\n' | '\r') {
        Ok(delimiter as u8)
    } else {
        Err(OutputError::Delimiter(delimiter))
    }
}

/// Builds the exporter for the configured format
pub fn exporter_for(config: &OutputConfig) -> OutputResult<Box<dyn RecordExporter>> {
    Ok(match config.format {
        OutputFormat::Csv => Box::new(CsvExporter::new(
            csv_delimiter(config.delimiter)?,
            config.utf8_bom,
        )),
        OutputFormat::Jsonl => Box::new(JsonLinesExporter),
        OutputFormat::Json => Box::new(JsonExporter),
    })
}

/// Exports a record collection to a file
///
/// Parent directories are created and an existing file is overwritten.
///
/// # Returns
///
/// * `Ok(usize)` - Number of records written
/// * `Err(OutputError)` - Failed to create or write the file
pub fn export_to_path(
    collection: &RecordCollection,
    exporter: &dyn RecordExporter,
    path: &Path,
) -> OutputResult<usize> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = BufWriter::new(File::create(path)?);
    let written = exporter.export(collection.records(), &mut writer)?;

    tracing::info!(
        "Wrote {} records as {} to {}",
        written,
        exporter.format(),
        path.display()
    );
    Ok(written)
}

/// Exports a record collection as configured, returning the resolved path
pub fn export_records(
    collection: &RecordCollection,
    config: &OutputConfig,
) -> OutputResult<PathBuf> {
    let path = config.resolved_path(&date_stamp());
    let exporter = exporter_for(config)?;
    export_to_path(collection, exporter.as_ref(), &path)?;
    Ok(path)
}
