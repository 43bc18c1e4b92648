//! Run statistics
//!
//! This module derives the end-of-run figures from a finished crawl job and
//! prints them for the operator.

use crate::output::collection::duplicate_source_urls;
use crate::state::{CrawlJob, PhaseTimings};

/// Run statistics summary
#[derive(Debug, Clone, PartialEq)]
pub struct RunStatistics {
    /// Page count known before phase 1, if any
    pub pages_expected: Option<u32>,

    /// Listing pages fetched successfully
    pub pages_fetched: usize,

    /// Listing pages that failed after retries
    pub pages_failed: usize,

    /// Distinct detail URLs discovered
    pub detail_urls: usize,

    /// Links repeated across listing pages
    pub duplicate_links: usize,

    /// Records in the output, placeholders included
    pub records_total: usize,

    /// Detail fetches that failed after retries
    pub records_failed: usize,

    /// Records with every field missing
    pub records_incomplete: usize,

    /// Records sharing a source URL with another record
    pub duplicate_records: usize,

    pub timings: PhaseTimings,
}

impl RunStatistics {
    pub fn from_job(job: &CrawlJob) -> Self {
        Self {
            pages_expected: job.expected_pages(),
            pages_fetched: job.stats.pages_fetched,
            pages_failed: job.stats.pages_failed,
            detail_urls: job.detail_urls.len(),
            duplicate_links: job.stats.duplicate_links,
            records_total: job.records.len(),
            records_failed: job.stats.records_failed,
            records_incomplete: job.incomplete_records(),
            duplicate_records: duplicate_source_urls(&job.records).len(),
            timings: job.timings,
        }
    }

    /// Share of detail fetches that failed, as a percentage
    pub fn failure_rate(&self) -> f64 {
        if self.records_total == 0 {
            return 0.0;
        }
        (self.records_failed as f64 / self.records_total as f64) * 100.0
    }

    /// Records per second over the extraction phase
    pub fn extraction_rate(&self) -> f64 {
        let secs = self.timings.extraction.as_secs_f64();
        if secs > 0.0 {
            self.records_total as f64 / secs
        } else {
            0.0
        }
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &RunStatistics) {
    println!("=== Harvest Statistics ===\n");

    println!("Listing pages:");
    if let Some(expected) = stats.pages_expected {
        println!("  Expected: {}", expected);
    }
    println!("  Fetched: {}", stats.pages_fetched);
    println!("  Failed: {}", stats.pages_failed);
    println!("  Detail URLs discovered: {}", stats.detail_urls);
    if stats.duplicate_links > 0 {
        println!("  Duplicate links merged: {}", stats.duplicate_links);
    }
    println!();

    println!("Records:");
    println!("  Total: {}", stats.records_total);
    println!(
        "  Failed: {} ({:.1}%)",
        stats.records_failed,
        stats.failure_rate()
    );
    println!("  Incomplete: {}", stats.records_incomplete);
    if stats.duplicate_records > 0 {
        println!("  Duplicate source URLs: {}", stats.duplicate_records);
    }
    println!();

    println!("Timings:");
    println!("  Listing phase: {:.2?}", stats.timings.discovery);
    println!(
        "  Detail phase: {:.2?} ({:.2} records/sec)",
        stats.timings.extraction,
        stats.extraction_rate()
    );
    println!("  Total: {:.2?}", stats.timings.total);
}
