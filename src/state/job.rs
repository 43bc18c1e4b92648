//! Crawl job bookkeeping
//!
//! A [`CrawlJob`] is created once per run by the harvester and handed to the
//! output layer when both phases have drained.

use crate::crawler::PagePlan;
use crate::state::DirectoryRecord;
use std::collections::BTreeSet;
use std::time::Duration;

/// Outcome of fetching one listing page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    /// Page fetched and parsed (it may still have yielded zero links)
    Fetched,
    /// Page fetch failed; carries the HTTP status when there was one
    Failed { status: Option<u16> },
}

/// One listing page of the crawl
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageTask {
    /// 1-based page index
    pub page: u32,
    /// Resolved listing URL
    pub url: String,
    /// Detail URLs found on the page; empty is a valid terminal signal
    pub links: BTreeSet<String>,
    pub outcome: PageOutcome,
}

impl PageTask {
    /// Returns true if the page yielded at least one qualifying link
    pub fn has_more(&self) -> bool {
        !self.links.is_empty()
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, PageOutcome::Failed { .. })
    }
}

/// Counters reported by a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlStats {
    pub pages_fetched: usize,
    pub pages_failed: usize,
    pub records_fetched: usize,
    pub records_failed: usize,
    /// Links seen on more than one listing page (merged into one URL)
    pub duplicate_links: usize,
}

impl CrawlStats {
    /// Total listing pages attempted
    pub fn pages_total(&self) -> usize {
        self.pages_fetched + self.pages_failed
    }

    /// Total detail records attempted
    pub fn records_total(&self) -> usize {
        self.records_fetched + self.records_failed
    }

    /// Share of detail fetches that failed, as a percentage
    pub fn failure_rate(&self) -> f64 {
        let total = self.records_total();
        if total == 0 {
            return 0.0;
        }
        (self.records_failed as f64 / total as f64) * 100.0
    }
}

/// Wall-clock duration of each phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhaseTimings {
    /// Phase 1: listing pages to detail URLs
    pub discovery: Duration,
    /// Phase 2: detail URLs to records
    pub extraction: Duration,
    pub total: Duration,
}

/// The whole run
#[derive(Debug, Clone)]
pub struct CrawlJob {
    /// How listing pages were enumerated
    pub plan: PagePlan,
    /// Listing pages, in completion order
    pub page_tasks: Vec<PageTask>,
    /// Aggregated detail URLs from phase 1
    pub detail_urls: BTreeSet<String>,
    /// Aggregated records from phase 2, in completion order
    pub records: Vec<DirectoryRecord>,
    pub stats: CrawlStats,
    pub timings: PhaseTimings,
}

impl CrawlJob {
    /// Expected page count when it was known up front
    pub fn expected_pages(&self) -> Option<u32> {
        match self.plan {
            PagePlan::Known(pages) => Some(pages),
            PagePlan::Discovery => None,
        }
    }

    /// Records with no field besides their source URL
    pub fn incomplete_records(&self) -> usize {
        self.records.iter().filter(|r| r.is_empty()).count()
    }

    /// Listing page tasks sorted by page index
    pub fn pages_in_order(&self) -> Vec<&PageTask> {
        let mut pages: Vec<_> = self.page_tasks.iter().collect();
        pages.sort_by_key(|task| task.page);
        pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_rate() {
        let stats = CrawlStats {
            records_fetched: 5,
            records_failed: 1,
            ..CrawlStats::default()
        };
        assert_eq!(stats.records_total(), 6);
        assert!((stats.failure_rate() - 16.666).abs() < 0.01);
    }

    #[test]
    fn test_failure_rate_zero_records() {
        assert_eq!(CrawlStats::default().failure_rate(), 0.0);
    }

    #[test]
    fn test_page_task_signals() {
        let mut task = PageTask {
            page: 4,
            url: "https://example.com/list?sheet=4".to_string(),
            links: BTreeSet::new(),
            outcome: PageOutcome::Fetched,
        };
        assert!(!task.has_more());
        assert!(!task.is_failed());

        task.links.insert("https://example.com/a".to_string());
        task.outcome = PageOutcome::Failed { status: Some(503) };
        assert!(task.has_more());
        assert!(task.is_failed());
    }

    #[test]
    fn test_incomplete_records() {
        let job = CrawlJob {
            plan: PagePlan::Known(1),
            page_tasks: vec![],
            detail_urls: BTreeSet::new(),
            records: vec![
                DirectoryRecord::placeholder("https://example.com/a"),
                DirectoryRecord {
                    name: Some("Ana".to_string()),
                    ..DirectoryRecord::placeholder("https://example.com/b")
                },
            ],
            stats: CrawlStats::default(),
            timings: PhaseTimings::default(),
        };
        assert_eq!(job.incomplete_records(), 1);
        assert_eq!(job.expected_pages(), Some(1));
    }
}
