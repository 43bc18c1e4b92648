//! Harvest coordinator - two-phase crawl orchestration
//!
//! This module drives a run from the first listing page to the final record
//! set:
//! - Fetching page 1 and choosing the page enumeration
//! - Phase 1: listing pages to detail URLs, concurrently or by discovery
//! - Phase 2: detail URLs to records through a bounded worker pool
//! - Progress reporting and phase timings
//!
//! Phase 2 does not start until every phase 1 unit has completed.

use crate::config::{validate, Config};
use crate::crawler::aggregate::{Aggregate, LinkSet};
use crate::crawler::listing::parse_listing;
use crate::crawler::pagination::{DiscoveryCursor, PagePlan, PaginationPolicy};
use crate::crawler::profile::SiteProfile;
use crate::crawler::progress::{Phase, ProgressSink, ProgressUpdate, TracingProgress};
use crate::crawler::{FetchError, Fetcher};
use crate::extract::extract_record;
use crate::state::{CrawlJob, CrawlStats, DirectoryRecord, PageOutcome, PageTask, PhaseTimings};
use crate::HarvestError;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use url::Url;

/// Result of one listing page unit
#[derive(Debug)]
struct ListingOutcome {
    task: PageTask,
    /// URL the page was served from, after redirects
    served_url: Option<Url>,
    last_page: Option<u32>,
    error: Option<FetchError>,
}

/// Per-phase counters, updated from the driver loop only
struct PhaseCounter {
    phase: Phase,
    total: Option<usize>,
    done: usize,
    failed: usize,
    started: Instant,
}

impl PhaseCounter {
    fn start(phase: Phase, total: Option<usize>, progress: &dyn ProgressSink) -> Self {
        progress.phase_started(phase, total);
        Self {
            phase,
            total,
            done: 0,
            failed: 0,
            started: Instant::now(),
        }
    }

    fn record(&mut self, progress: &dyn ProgressSink, url: &str, error: Option<&FetchError>) {
        self.done += 1;
        if let Some(error) = error {
            self.failed += 1;
            progress.unit_failed(self.phase, error);
        }
        progress.unit_completed(&ProgressUpdate {
            phase: self.phase,
            done: self.done,
            total: self.total,
            failed: self.failed,
            url: url.to_string(),
        });
    }

    fn record_panic(&mut self) {
        self.done += 1;
        self.failed += 1;
    }

    fn finish(self, progress: &dyn ProgressSink) -> Duration {
        let elapsed = self.started.elapsed();
        progress.phase_finished(self.phase, self.done, self.failed, elapsed);
        elapsed
    }
}

/// Main harvest structure
pub struct Harvester {
    config: Arc<Config>,
    fetcher: Fetcher,
    profile: Arc<SiteProfile>,
    progress: Arc<dyn ProgressSink>,
}

impl Harvester {
    /// Creates a new harvester
    ///
    /// # Arguments
    ///
    /// * `config` - The harvest configuration, validated here
    /// * `progress` - Sink receiving progress events
    ///
    /// # Returns
    ///
    /// * `Ok(Harvester)` - Ready to run
    /// * `Err(HarvestError)` - Invalid configuration or HTTP client setup failure
    pub fn new(config: Config, progress: Arc<dyn ProgressSink>) -> Result<Self, HarvestError> {
        validate(&config)?;

        let fetcher = Fetcher::from_config(&config.site, &config.crawler)?;
        let profile = SiteProfile::from_site(&config.site)?;

        Ok(Self {
            config: Arc::new(config),
            fetcher,
            profile: Arc::new(profile),
            progress,
        })
    }

    /// Size of each phase's worker pool
    pub fn workers(&self) -> usize {
        self.config.crawler.workers.max(1)
    }

    pub fn profile(&self) -> &SiteProfile {
        &self.profile
    }

    /// Runs both phases to completion
    ///
    /// The only fatal failure is the first listing page; every later unit
    /// failure is counted and the run carries on.
    pub async fn run(&self) -> Result<CrawlJob, HarvestError> {
        let started = Instant::now();
        let policy = PaginationPolicy::from_config(&self.config.crawler);
        let links: Aggregate<LinkSet> = Aggregate::default();

        tracing::info!(
            "Starting harvest of {} with {} workers",
            self.profile.listing.base(),
            self.workers()
        );

        let first = fetch_listing_page(&self.fetcher, &self.profile, 1).await;
        if let Some(source) = first.error {
            return Err(HarvestError::InitialPage {
                url: first.task.url,
                source,
            });
        }

        let plan = policy.plan(first.last_page);
        match plan {
            PagePlan::Known(pages) => tracing::info!(
                pages,
                estimated_records = plan.estimated_records().unwrap_or_default(),
                "Page count known"
            ),
            PagePlan::Discovery => {
                tracing::info!("Page count unknown, discovering pages sequentially")
            }
        }

        // Phase 1
        let total_pages = match plan {
            PagePlan::Known(pages) => Some(pages as usize),
            PagePlan::Discovery => None,
        };
        let mut counter = PhaseCounter::start(Phase::Discovery, total_pages, &*self.progress);
        links.update(|set| set.merge(&first.task.links));
        counter.record(&*self.progress, &first.task.url, None);

        let mut page_tasks = Vec::new();
        match plan {
            PagePlan::Known(pages) => {
                page_tasks.push(first.task);
                let rest = self.fetch_listing_pages(2..=pages, &links, &mut counter).await;
                page_tasks.extend(rest);
            }
            PagePlan::Discovery => {
                let mut cursor = DiscoveryCursor::new(self.profile.listing.clone());
                if let Some(served) = &first.served_url {
                    cursor.advance(first.task.page, served, first.task.has_more());
                }
                page_tasks.push(first.task);
                let rest = self.discover_listing_pages(cursor, &links, &mut counter).await;
                page_tasks.extend(rest);
            }
        }
        let discovery = counter.finish(&*self.progress);

        let LinkSet {
            urls: detail_urls,
            duplicates,
        } = links.take();
        tracing::info!(
            "Discovered {} detail URLs across {} listing pages ({} duplicate links)",
            detail_urls.len(),
            page_tasks.len(),
            duplicates
        );

        // Phase 2
        let extraction_started = Instant::now();
        let (records, records_failed) = self.fetch_records(&detail_urls).await;
        let extraction = extraction_started.elapsed();

        let pages_failed = page_tasks.iter().filter(|task| task.is_failed()).count();
        let stats = CrawlStats {
            pages_fetched: page_tasks.len() - pages_failed,
            pages_failed,
            records_fetched: records.len().saturating_sub(records_failed),
            records_failed,
            duplicate_links: duplicates,
        };

        let timings = PhaseTimings {
            discovery,
            extraction,
            total: started.elapsed(),
        };

        tracing::info!(
            "Harvest complete: {} records ({} failed) in {:.2?}",
            records.len(),
            records_failed,
            timings.total
        );

        Ok(CrawlJob {
            plan,
            page_tasks,
            detail_urls,
            records,
            stats,
            timings,
        })
    }

    /// Fetches a known range of listing pages through the worker pool
    async fn fetch_listing_pages(
        &self,
        pages: std::ops::RangeInclusive<u32>,
        links: &Aggregate<LinkSet>,
        counter: &mut PhaseCounter,
    ) -> Vec<PageTask> {
        tracing::debug!(workers = self.workers(), "Fetching listing pages {:?}", pages);
        let semaphore = Arc::new(Semaphore::new(self.workers()));
        let mut workers = JoinSet::new();

        for page in pages {
            let semaphore = Arc::clone(&semaphore);
            let fetcher = self.fetcher.clone();
            let profile = Arc::clone(&self.profile);
            let links = links.clone();

            workers.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                let outcome = fetch_listing_page(&fetcher, &profile, page).await;
                links.update(|set| set.merge(&outcome.task.links));
                outcome
            });
        }

        let mut tasks = Vec::new();
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(outcome) => {
                    counter.record(&*self.progress, &outcome.task.url, outcome.error.as_ref());
                    tasks.push(outcome.task);
                }
                Err(e) => {
                    tracing::error!("Listing worker failed: {}", e);
                    counter.record_panic();
                }
            }
        }
        tasks
    }

    /// Walks listing pages one at a time until discovery stops
    async fn discover_listing_pages(
        &self,
        mut cursor: DiscoveryCursor,
        links: &Aggregate<LinkSet>,
        counter: &mut PhaseCounter,
    ) -> Vec<PageTask> {
        let mut tasks = Vec::new();

        while let Some(page) = cursor.next_page() {
            let outcome = fetch_listing_page(&self.fetcher, &self.profile, page).await;
            links.update(|set| set.merge(&outcome.task.links));
            counter.record(&*self.progress, &outcome.task.url, outcome.error.as_ref());

            match &outcome.served_url {
                Some(served) => {
                    cursor.advance(page, served, outcome.task.has_more());
                }
                None => {
                    tracing::warn!(page, "Listing page failed, stopping discovery");
                    cursor.stop();
                }
            }
            tasks.push(outcome.task);
        }

        tasks
    }

    /// Fetches every detail URL through the worker pool
    ///
    /// Returns exactly one record per URL and the number of failed units.
    async fn fetch_records(&self, urls: &BTreeSet<String>) -> (Vec<DirectoryRecord>, usize) {
        let records: Aggregate<Vec<DirectoryRecord>> =
            Aggregate::new(Vec::with_capacity(urls.len()));
        let semaphore = Arc::new(Semaphore::new(self.workers()));
        let mut workers = JoinSet::new();
        tracing::info!(
            workers = self.workers(),
            "Fetching {} detail pages",
            urls.len()
        );
        let mut counter = PhaseCounter::start(Phase::Extraction, Some(urls.len()), &*self.progress);

        for url in urls {
            let semaphore = Arc::clone(&semaphore);
            let fetcher = self.fetcher.clone();
            let profile = Arc::clone(&self.profile);
            let records = records.clone();
            let url = url.clone();

            workers.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                let (record, error) = match fetch_record(&fetcher, &profile, &url).await {
                    Ok(record) => (record, None),
                    Err(error) => (DirectoryRecord::placeholder(&url), Some(error)),
                };
                records.update(|all| all.push(record));
                (url, error)
            });
        }

        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok((url, error)) => counter.record(&*self.progress, &url, error.as_ref()),
                Err(e) => {
                    tracing::error!("Detail worker failed: {}", e);
                    counter.record_panic();
                }
            }
        }

        let failed = counter.failed;
        counter.finish(&*self.progress);

        let mut records = records.take();
        if records.len() < urls.len() {
            // A worker that died before appending still owes its placeholder
            let seen: HashSet<String> = records.iter().map(|r| r.source_url.clone()).collect();
            records.extend(
                urls.iter()
                    .filter(|url| !seen.contains(*url))
                    .map(|url| DirectoryRecord::placeholder(url)),
            );
        }

        (records, failed)
    }
}

/// Fetches and parses one listing page
///
/// Failures become an empty page carrying the error.
async fn fetch_listing_page(fetcher: &Fetcher, profile: &SiteProfile, page: u32) -> ListingOutcome {
    let url = profile.listing.page(page);

    match fetcher.fetch(url.as_str()).await {
        Ok(fetched) => {
            let parsed = parse_listing(&fetched.body, &fetched.final_url, &profile.listing_selectors);
            tracing::debug!(page, links = parsed.links.len(), "Listing page parsed");
            ListingOutcome {
                task: PageTask {
                    page,
                    url: url.to_string(),
                    links: parsed.links,
                    outcome: PageOutcome::Fetched,
                },
                served_url: Some(fetched.final_url),
                last_page: parsed.last_page,
                error: None,
            }
        }
        Err(error) => ListingOutcome {
            task: PageTask {
                page,
                url: url.to_string(),
                links: BTreeSet::new(),
                outcome: PageOutcome::Failed {
                    status: error.status(),
                },
            },
            served_url: None,
            last_page: None,
            error: Some(error),
        },
    }
}

/// Fetches one detail page and extracts its record
async fn fetch_record(
    fetcher: &Fetcher,
    profile: &SiteProfile,
    url: &str,
) -> Result<DirectoryRecord, FetchError> {
    let fetched = fetcher.fetch(url).await?;
    Ok(extract_record(&fetched.body, url, &profile.fields))
}

/// Runs a complete harvest, reporting progress through tracing
///
/// # Arguments
///
/// * `config` - The harvest configuration
///
/// # Returns
///
/// * `Ok(CrawlJob)` - Both phases completed
/// * `Err(HarvestError)` - Invalid configuration or the first listing page failed
pub async fn run_harvest(config: Config) -> Result<CrawlJob, HarvestError> {
    let harvester = Harvester::new(config, Arc::new(TracingProgress::default()))?;
    harvester.run().await
}
