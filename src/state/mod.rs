//! State management for the harvest
//!
//! This module contains the run's data model:
//! - Directory records produced by phase 2
//! - Listing page tasks and the crawl job that aggregates them

pub mod job;
pub mod record;

pub use job::{CrawlJob, CrawlStats, PageOutcome, PageTask, PhaseTimings};
pub use record::DirectoryRecord;
