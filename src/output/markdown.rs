//! Markdown summary generation
//!
//! This module generates a human-readable markdown report of a harvest run,
//! including statistics, phase timings and the units that failed.

use crate::output::collection::duplicate_source_urls;
use crate::output::stats::RunStatistics;
use crate::output::traits::OutputResult;
use crate::state::{CrawlJob, PageOutcome};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Longest list printed per section
const LIST_LIMIT: usize = 50;

/// Everything the run report shows
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Local start time of the run
    pub started_at: String,
    pub config_hash: Option<String>,
    /// Where the records were exported
    pub output_path: Option<String>,
    pub statistics: RunStatistics,
    /// Failed listing pages with their HTTP status, if any
    pub failed_pages: Vec<(u32, Option<u16>)>,
    /// Source URLs of records with every field missing
    pub incomplete_urls: Vec<String>,
    pub duplicate_urls: Vec<String>,
}

impl RunSummary {
    pub fn from_job(job: &CrawlJob, started_at: impl Into<String>) -> Self {
        let failed_pages = job
            .pages_in_order()
            .into_iter()
            .filter_map(|task| match task.outcome {
                PageOutcome::Failed { status } => Some((task.page, status)),
                PageOutcome::Fetched => None,
            })
            .collect();

        let mut incomplete_urls: Vec<String> = job
            .records
            .iter()
            .filter(|record| record.is_empty())
            .map(|record| record.source_url.clone())
            .collect();
        incomplete_urls.sort();

        Self {
            started_at: started_at.into(),
            config_hash: None,
            output_path: None,
            statistics: RunStatistics::from_job(job),
            failed_pages,
            incomplete_urls,
            duplicate_urls: duplicate_source_urls(&job.records),
        }
    }

    pub fn with_config_hash(mut self, hash: impl Into<String>) -> Self {
        self.config_hash = Some(hash.into());
        self
    }

    pub fn with_output_path(mut self, path: impl Into<String>) -> Self {
        self.output_path = Some(path.into());
        self
    }
}

/// Writes the markdown report
///
/// # Arguments
///
/// * `summary` - The run summary data
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote markdown summary
/// * `Err(OutputError)` - Failed to write summary
pub fn generate_markdown_summary(summary: &RunSummary, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_summary(summary);

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a run summary as markdown
pub fn format_markdown_summary(summary: &RunSummary) -> String {
    let stats = &summary.statistics;
    let mut md = String::new();

    md.push_str("# Directory Harvest Summary\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Started**: {}\n", summary.started_at));
    md.push_str(&format!(
        "- **Duration**: {:.2} seconds\n",
        stats.timings.total.as_secs_f64()
    ));
    if let Some(hash) = &summary.config_hash {
        md.push_str(&format!("- **Config Hash**: {}\n", hash));
    }
    if let Some(path) = &summary.output_path {
        md.push_str(&format!("- **Output**: {}\n", path));
    }
    md.push('\n');

    // Overall statistics
    md.push_str("## Overall Statistics\n\n");
    md.push_str("| Metric | Value |\n");
    md.push_str("|--------|-------|\n");
    match stats.pages_expected {
        Some(pages) => md.push_str(&format!("| Pages Expected | {} |\n", pages)),
        None => md.push_str("| Pages Expected | discovered |\n"),
    }
    md.push_str(&format!("| Pages Fetched | {} |\n", stats.pages_fetched));
    md.push_str(&format!("| Pages Failed | {} |\n", stats.pages_failed));
    md.push_str(&format!("| Detail URLs | {} |\n", stats.detail_urls));
    md.push_str(&format!("| Duplicate Links | {} |\n", stats.duplicate_links));
    md.push_str(&format!("| Records | {} |\n", stats.records_total));
    md.push_str(&format!("| Records Failed | {} |\n", stats.records_failed));
    md.push_str(&format!(
        "| Incomplete Records | {} |\n",
        stats.records_incomplete
    ));
    md.push_str(&format!("| Failure Rate | {:.2}% |\n\n", stats.failure_rate()));

    // Timings
    md.push_str("## Phase Timings\n\n");
    md.push_str("| Phase | Seconds |\n");
    md.push_str("|-------|---------|\n");
    md.push_str(&format!(
        "| Listing | {:.2} |\n",
        stats.timings.discovery.as_secs_f64()
    ));
    md.push_str(&format!(
        "| Detail | {:.2} |\n\n",
        stats.timings.extraction.as_secs_f64()
    ));

    if !summary.failed_pages.is_empty() {
        md.push_str("## Failed Listing Pages\n\n");
        md.push_str("| Page | Status |\n");
        md.push_str("|------|--------|\n");
        for (page, status) in &summary.failed_pages {
            let status = status.map_or_else(|| "-".to_string(), |s| s.to_string());
            md.push_str(&format!("| {} | {} |\n", page, status));
        }
        md.push('\n');
    }

    push_url_list(&mut md, "Incomplete Records", &summary.incomplete_urls);
    push_url_list(&mut md, "Duplicate Source URLs", &summary.duplicate_urls);

    md
}

fn push_url_list(md: &mut String, title: &str, urls: &[String]) {
    if urls.is_empty() {
        return;
    }

    md.push_str(&format!("## {}\n\n", title));
    md.push_str(&format!("Total: {}\n\n", urls.len()));
    for url in urls.iter().take(LIST_LIMIT) {
        md.push_str(&format!("- {}\n", url));
    }
    if urls.len() > LIST_LIMIT {
        md.push_str(&format!("\n... and {} more\n", urls.len() - LIST_LIMIT));
    }
    md.push('\n');
}
