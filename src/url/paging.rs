//! Listing page URL construction
//!
//! Listing pages live at `<base>/<listing-path>?<param>=<n>` with a 1-based
//! page number.

use crate::config::SiteConfig;
use url::Url;

/// Builds and parses paginated listing URLs
#[derive(Debug, Clone)]
pub struct ListingUrl {
    base: Url,
    param: String,
}

impl ListingUrl {
    /// Creates a listing URL template from the site configuration
    pub fn from_site(site: &SiteConfig) -> Result<Self, url::ParseError> {
        let base = Url::parse(&site.base_url)?.join(&site.listing_path)?;
        Ok(Self::new(base, &site.page_param))
    }

    /// Creates a listing URL template from an already resolved listing URL
    pub fn new(mut base: Url, param: &str) -> Self {
        base.set_query(None);
        base.set_fragment(None);
        Self {
            base,
            param: param.to_string(),
        }
    }

    /// The listing URL without any page parameter
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Resolves the URL of a 1-based page
    pub fn page(&self, page: u32) -> Url {
        let mut url = self.base.clone();
        url.query_pairs_mut()
            .append_pair(&self.param, &page.to_string());
        url
    }

    /// Reads the page number back out of a listing URL
    ///
    /// Returns None when the parameter is missing or is not a positive integer.
    pub fn page_number(&self, url: &Url) -> Option<u32> {
        url.query_pairs()
            .filter(|(key, _)| key == self.param.as_str())
            .last()
            .and_then(|(_, value)| value.trim().parse::<u32>().ok())
            .filter(|page| *page >= 1)
    }
}
