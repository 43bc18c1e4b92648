//! Delimited text export
//!
//! Biographies routinely contain commas, so the default separator is `;`.

use crate::config::OutputFormat;
use crate::output::traits::{OutputResult, RecordExporter, COLUMNS};
use crate::state::DirectoryRecord;
use std::io::Write;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// CSV exporter with a configurable delimiter
#[derive(Debug, Clone, Copy)]
pub struct CsvExporter {
    delimiter: u8,
    utf8_bom: bool,
}

impl Default for CsvExporter {
    fn default() -> Self {
        Self {
            delimiter: b';',
            utf8_bom: false,
        }
    }
}

impl CsvExporter {
    /// Creates an exporter; the delimiter must be a single ASCII character
    pub fn new(delimiter: u8, utf8_bom: bool) -> Self {
        Self {
            delimiter,
            utf8_bom,
        }
    }
}

impl RecordExporter for CsvExporter {
    fn format(&self) -> OutputFormat {
        OutputFormat::Csv
    }

    fn export(&self, records: &[DirectoryRecord], writer: &mut dyn Write) -> OutputResult<usize> {
        if self.utf8_bom {
            writer.write_all(UTF8_BOM)?;
        }

        // Header is written by hand so an empty run still gets one
        let mut csv_writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(false)
            .from_writer(writer);

        csv_writer.write_record(COLUMNS)?;
        for record in records {
            csv_writer.serialize(record)?;
        }
        csv_writer.flush()?;

        Ok(records.len())
    }
}
