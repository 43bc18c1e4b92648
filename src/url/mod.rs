//! URL handling module
//!
//! This module provides listing page URL construction, link resolution and the
//! detail-page path filter.

mod paging;
mod resolve;

pub use paging::ListingUrl;
pub use resolve::{resolve_link, DetailPathFilter};
