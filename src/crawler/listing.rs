//! Listing page parser
//!
//! This module handles parsing a listing page to extract:
//! - Detail page links (absolute, deduplicated)
//! - The "last page" pagination indicator

use crate::config::SiteVariant;
use crate::crawler::pagination::last_page_indicator;
use crate::extract::parse_selector;
use crate::url::{resolve_link, DetailPathFilter};
use scraper::{Html, Selector};
use std::collections::BTreeSet;
use url::Url;

/// Detail link anchors on the current layout
const CURRENT_LINK_SELECTOR: &str =
    r#"a.link-transition.flex.justify-between.items-center.mt-8[class~="hover:no-underline"]"#;

/// Detail link anchors on the legacy layout, matched on the exact class string
const LEGACY_LINK_SELECTOR: &str =
    r#"a[class="link-transition flex hover:no-underline justify-between items-center mt-8"]"#;

const LAST_PAGE_SELECTOR: &str = r#"a[aria-label*="Última página"]"#;

/// Compiled selectors for one listing layout
#[derive(Debug, Clone)]
pub struct ListingSelectors {
    /// Anchors pointing at detail pages
    pub link: Selector,
    /// Pagination control holding the last page number
    pub last_page: Selector,
    /// Path shape a link must have to be kept; None keeps every link
    pub detail_filter: Option<DetailPathFilter>,
}

impl ListingSelectors {
    pub fn for_variant(variant: SiteVariant) -> crate::Result<Self> {
        match variant {
            SiteVariant::Current => Self::current(),
            SiteVariant::Legacy => Self::legacy(),
        }
    }

    pub fn current() -> crate::Result<Self> {
        Ok(Self {
            link: parse_selector(CURRENT_LINK_SELECTOR)?,
            last_page: parse_selector(LAST_PAGE_SELECTOR)?,
            detail_filter: Some(DetailPathFilter::default()),
        })
    }

    pub fn legacy() -> crate::Result<Self> {
        Ok(Self {
            link: parse_selector(LEGACY_LINK_SELECTOR)?,
            last_page: parse_selector(LAST_PAGE_SELECTOR)?,
            detail_filter: None,
        })
    }
}

/// Extracted information from a listing page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingPage {
    /// Absolute detail URLs found on the page
    pub links: BTreeSet<String>,
    /// True if the page yielded at least one link
    pub has_more: bool,
    /// Last page number, if the pagination control was present
    pub last_page: Option<u32>,
}

/// Parses a listing page
///
/// # Link Extraction Rules
///
/// **Include:**
/// - Anchors matched by the layout's link selector, resolved against the
///   page URL
///
/// **Exclude:**
/// - Anchors without `href`
/// - `javascript:`, `mailto:`, `tel:`, data URIs and fragment-only links
/// - Links whose path lacks the detail shape, when the layout filters paths
///
/// # Example
///
/// ```
/// use directory_harvester::crawler::{parse_listing, ListingSelectors};
/// use url::Url;
///
/// let html = r#"<a class="link-transition flex hover:no-underline justify-between items-center mt-8"
///                  href="/institucion/minsa/funcionarios/1-ana">Ana</a>"#;
/// let base = Url::parse("https://www.gob.pe/funcionariospublicos?sheet=1").unwrap();
/// let page = parse_listing(html, &base, &ListingSelectors::current().unwrap());
/// assert!(page.has_more);
/// assert!(page.links.contains("https://www.gob.pe/institucion/minsa/funcionarios/1-ana"));
/// ```
pub fn parse_listing(html: &str, base_url: &Url, selectors: &ListingSelectors) -> ListingPage {
    let document = Html::parse_document(html);

    let (links, has_more) = collect_links(&document, base_url, selectors);
    let last_page = last_page_indicator(&document, &selectors.last_page);

    ListingPage {
        links,
        has_more,
        last_page,
    }
}

/// Collects the detail links of a parsed listing page
///
/// Returns the links and whether any were found. An empty set is the
/// terminal signal for page discovery.
pub fn collect_links(
    document: &Html,
    base_url: &Url,
    selectors: &ListingSelectors,
) -> (BTreeSet<String>, bool) {
    let links: BTreeSet<String> = document
        .select(&selectors.link)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_link(href, base_url))
        .filter(|url| {
            selectors
                .detail_filter
                .as_ref()
                .map_or(true, |filter| filter.matches(url))
        })
        .map(String::from)
        .collect();

    let has_more = !links.is_empty();
    (links, has_more)
}
