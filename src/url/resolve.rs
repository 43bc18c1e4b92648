//! Link resolution and detail-path filtering for listing pages

use url::Url;

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Fragment-only links
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
pub fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    let mut absolute = base_url.join(href).ok()?;
    if absolute.scheme() != "http" && absolute.scheme() != "https" {
        return None;
    }

    absolute.set_fragment(None);
    Some(absolute)
}

/// Path shape of an official's detail page
///
/// A detail path contains both an institution segment and an officials
/// segment, e.g. `/institucion/minsa/funcionarios/123-ana-perez`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailPathFilter {
    pub institution_segment: String,
    pub officials_segment: String,
}

impl Default for DetailPathFilter {
    fn default() -> Self {
        Self {
            institution_segment: "/institucion/".to_string(),
            officials_segment: "/funcionarios/".to_string(),
        }
    }
}

impl DetailPathFilter {
    /// Returns true if the URL path has the detail-page shape
    pub fn matches(&self, url: &Url) -> bool {
        let path = url.path();
        path.contains(&self.institution_segment) && path.contains(&self.officials_segment)
    }
}
