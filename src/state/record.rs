//! Directory record definitions
//!
//! One record per official, keyed by the detail-page URL it was read from.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One public official's profile
///
/// Field order is the export column order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryRecord {
    pub name: Option<String>,
    pub institution: Option<String>,
    /// Position held ("cargo")
    pub role: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub resolution_ref: Option<String>,
    /// Canonical detail-page URL; unique key of the record
    pub source_url: String,
    pub biography: Option<String>,
}

impl DirectoryRecord {
    /// Creates a placeholder record carrying only its source URL
    ///
    /// Used when the detail page could not be fetched, so failures stay
    /// visible in the output instead of being dropped.
    pub fn placeholder(source_url: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            ..Self::default()
        }
    }

    /// Returns true if no field besides `source_url` is present
    pub fn is_empty(&self) -> bool {
        self.present_fields() == 0
    }

    /// Number of optional fields that carry a value
    pub fn present_fields(&self) -> usize {
        [
            self.name.is_some(),
            self.institution.is_some(),
            self.role.is_some(),
            self.start_date.is_some(),
            self.email.is_some(),
            self.phone.is_some(),
            self.resolution_ref.is_some(),
            self.biography.is_some(),
        ]
        .into_iter()
        .filter(|present| *present)
        .count()
    }
}
