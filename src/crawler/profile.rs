//! Site profile: everything layout-specific about a harvest

use crate::config::{SiteConfig, SiteVariant};
use crate::crawler::ListingSelectors;
use crate::extract::FieldMap;
use crate::url::ListingUrl;

/// Compiled URLs and selectors for one site layout
///
/// Built once per run and shared read-only by every worker.
#[derive(Debug, Clone)]
pub struct SiteProfile {
    pub variant: SiteVariant,
    pub listing: ListingUrl,
    pub listing_selectors: ListingSelectors,
    pub fields: FieldMap,
}

impl SiteProfile {
    pub fn from_site(site: &SiteConfig) -> crate::Result<Self> {
        Ok(Self {
            variant: site.variant,
            listing: ListingUrl::from_site(site)?,
            listing_selectors: ListingSelectors::for_variant(site.variant)?,
            fields: FieldMap::for_variant(site.variant)?,
        })
    }
}
