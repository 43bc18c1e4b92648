//! Listing page enumeration
//!
//! The page count is taken from the "last page" indicator of the first
//! listing page when it can be read. Otherwise pages are walked one by one
//! until a page yields no detail links.

use crate::config::{CrawlerConfig, PaginationMode};
use crate::url::ListingUrl;
use scraper::{Html, Selector};
use url::Url;

/// Rough count of records per listing page, used only for estimates
pub const RECORDS_PER_PAGE: usize = 20;

/// How the operator asked pages to be enumerated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginationPolicy {
    /// Use the indicator when present, otherwise discover
    Auto,
    /// Always discover, ignoring the indicator
    Discovery,
    /// Fixed page count supplied by the operator
    Fixed(u32),
}

/// The page enumeration chosen for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagePlan {
    /// Pages `1..=N` are fetched concurrently
    Known(u32),
    /// Pages are fetched sequentially until one yields no links
    Discovery,
}

impl PagePlan {
    /// Estimated record count, when the page count is known
    pub fn estimated_records(&self) -> Option<usize> {
        match self {
            Self::Known(pages) => Some(*pages as usize * RECORDS_PER_PAGE),
            Self::Discovery => None,
        }
    }
}

impl PaginationPolicy {
    pub fn from_config(config: &CrawlerConfig) -> Self {
        match (config.page_count, config.pagination) {
            (Some(pages), _) => Self::Fixed(pages),
            (None, PaginationMode::Discovery) => Self::Discovery,
            (None, PaginationMode::Auto) => Self::Auto,
        }
    }

    /// Resolves the plan once the first listing page has been read
    pub fn plan(&self, indicator: Option<u32>) -> PagePlan {
        match (self, indicator) {
            (Self::Fixed(pages), _) => PagePlan::Known(*pages),
            (Self::Auto, Some(pages)) if pages >= 1 => PagePlan::Known(pages),
            _ => PagePlan::Discovery,
        }
    }
}

/// Reads the last page number from the pagination control
///
/// The indicator's text must be a bare positive integer.
pub fn last_page_indicator(document: &Html, selector: &Selector) -> Option<u32> {
    document
        .select(selector)
        .filter_map(|element| element.text().collect::<String>().trim().parse::<u32>().ok())
        .find(|&pages| pages >= 1)
}

/// Loop-carried state of sequential page discovery
#[derive(Debug, Clone)]
pub struct DiscoveryCursor {
    listing: ListingUrl,
    next: Option<u32>,
}

impl DiscoveryCursor {
    pub fn new(listing: ListingUrl) -> Self {
        Self {
            listing,
            next: Some(1),
        }
    }

    /// Next page index to fetch, if discovery has not stopped
    pub fn next_page(&self) -> Option<u32> {
        self.next
    }

    /// Advances past the fetched page `page`
    ///
    /// `served_url` is the URL the page was actually served from. Discovery
    /// stops when the page had no links, or when the served page number is
    /// unreadable or differs from the requested one, as when an out-of-range
    /// page redirects back to the first page.
    pub fn advance(&mut self, page: u32, served_url: &Url, has_more: bool) -> Option<u32> {
        self.next = if !has_more {
            None
        } else {
            match self.listing.page_number(served_url) {
                Some(served) if served == page => page.checked_add(1),
                Some(served) => {
                    tracing::warn!(
                        page,
                        served,
                        url = %served_url,
                        "Listing page redirected to another page, stopping discovery"
                    );
                    None
                }
                None => {
                    tracing::warn!(url = %served_url, "Unreadable page number, stopping discovery");
                    None
                }
            }
        };
        self.next
    }

    /// Stops discovery, e.g. after a failed fetch
    pub fn stop(&mut self) {
        self.next = None;
    }
}
