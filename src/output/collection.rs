//! Record collection handed to the exporters

use crate::state::DirectoryRecord;
use std::collections::BTreeMap;

/// Records of a run, in completion order
///
/// Records sharing a source URL are reported but kept.
#[derive(Debug, Clone, Default)]
pub struct RecordCollection {
    records: Vec<DirectoryRecord>,
    duplicates: Vec<String>,
}

impl RecordCollection {
    pub fn new(records: Vec<DirectoryRecord>) -> Self {
        let duplicates = duplicate_source_urls(&records);
        for url in &duplicates {
            tracing::warn!(url = %url, "Several records share a source URL");
        }
        Self {
            records,
            duplicates,
        }
    }

    pub fn records(&self) -> &[DirectoryRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Source URLs seen on more than one record
    pub fn duplicate_urls(&self) -> &[String] {
        &self.duplicates
    }

    /// Records whose fields are all missing
    pub fn incomplete(&self) -> impl Iterator<Item = &DirectoryRecord> {
        self.records.iter().filter(|record| record.is_empty())
    }

    pub fn into_records(self) -> Vec<DirectoryRecord> {
        self.records
    }
}

impl From<Vec<DirectoryRecord>> for RecordCollection {
    fn from(records: Vec<DirectoryRecord>) -> Self {
        Self::new(records)
    }
}

/// Returns every source URL carried by more than one record, sorted
pub fn duplicate_source_urls(records: &[DirectoryRecord]) -> Vec<String> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for record in records {
        *counts.entry(record.source_url.as_str()).or_default() += 1;
    }
    counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(url, _)| url.to_string())
        .collect()
}
