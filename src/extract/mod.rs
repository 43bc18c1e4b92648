//! Record extraction
//!
//! This module turns a fetched detail page into a [`DirectoryRecord`]:
//! - Field-to-selector maps for each page layout
//! - Text node selection, joining and cleanup
//! - Localized start date normalization
//!
//! [`DirectoryRecord`]: crate::state::DirectoryRecord

mod date;
mod fields;

pub use date::{normalize_date, normalize_date_iso, translate_month};
pub use fields::{
    extract_fields, extract_record, record_from_fields, ExtractedFields, Field, FieldMap,
    FieldSpec, Take, TextScope,
};

use crate::HarvestError;
use scraper::Selector;

/// Parses a CSS selector, keeping the offending text in the error
pub(crate) fn parse_selector(css: &str) -> Result<Selector, HarvestError> {
    Selector::parse(css).map_err(|e| HarvestError::Selector {
        selector: css.to_string(),
        message: e.to_string(),
    })
}
