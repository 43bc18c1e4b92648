//! JSON exports: one object per line, or a single pretty array

use crate::config::OutputFormat;
use crate::output::traits::{OutputResult, RecordExporter};
use crate::state::DirectoryRecord;
use std::io::Write;

/// Writes one JSON object per line
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonLinesExporter;

impl RecordExporter for JsonLinesExporter {
    fn format(&self) -> OutputFormat {
        OutputFormat::Jsonl
    }

    fn export(&self, records: &[DirectoryRecord], writer: &mut dyn Write) -> OutputResult<usize> {
        for record in records {
            serde_json::to_writer(&mut *writer, record)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        Ok(records.len())
    }
}

/// Writes a pretty-printed JSON array
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonExporter;

impl RecordExporter for JsonExporter {
    fn format(&self) -> OutputFormat {
        OutputFormat::Json
    }

    fn export(&self, records: &[DirectoryRecord], writer: &mut dyn Write) -> OutputResult<usize> {
        serde_json::to_writer_pretty(&mut *writer, records)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(records.len())
    }
}
