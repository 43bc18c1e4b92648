//! Crawler module for listing and detail page processing
//!
//! This module contains the core harvesting logic, including:
//! - HTTP fetching with retry logic
//! - Listing page parsing and link collection
//! - Page count resolution and sequential discovery
//! - Bounded worker pools and overall run coordination

mod aggregate;
mod coordinator;
mod fetcher;
mod listing;
mod pagination;
mod profile;
mod progress;

pub use aggregate::{Aggregate, LinkSet};
pub use coordinator::{run_harvest, Harvester};
pub use fetcher::{build_http_client, FetchError, Fetched, Fetcher, RetryPolicy};
pub use listing::{collect_links, parse_listing, ListingPage, ListingSelectors};
pub use pagination::{
    last_page_indicator, DiscoveryCursor, PagePlan, PaginationPolicy, RECORDS_PER_PAGE,
};
pub use profile::SiteProfile;
pub use progress::{NullProgress, Phase, ProgressSink, ProgressUpdate, TracingProgress};
