//! Field extraction from official detail pages
//!
//! A [`FieldMap`] pairs every logical record field with a CSS selector and the
//! rules for turning the matched text nodes into one value. Extraction is a
//! pure function of the document: missing fields are simply absent.

use crate::config::SiteVariant;
use crate::extract::date::normalize_date;
use crate::extract::parse_selector;
use crate::state::DirectoryRecord;
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeMap;
use std::fmt;

/// Logical fields of a directory record
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Name,
    Institution,
    Role,
    StartDate,
    Email,
    Phone,
    ResolutionRef,
    Biography,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Institution => "institution",
            Self::Role => "role",
            Self::StartDate => "start_date",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::ResolutionRef => "resolution_ref",
            Self::Biography => "biography",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which text nodes of a matched element are read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextScope {
    /// Direct child text nodes only
    Own,
    /// Every text node below the element
    Descendants,
}

/// How several matching text nodes become one value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Take {
    /// First non-blank node
    First,
    /// All non-blank nodes joined with a single space
    Joined,
}

/// Extraction rule for one field
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub field: Field,
    pub css: String,
    selector: Selector,
    pub scope: TextScope,
    pub take: Take,
    /// Only text nodes containing this needle qualify
    pub contains: Option<String>,
    /// Collapse inner whitespace and non-breaking spaces
    pub collapse_whitespace: bool,
}

impl FieldSpec {
    /// Creates a rule reading the element's own text
    ///
    /// Email and phone selectors tend to match near-duplicate nodes, so those
    /// two fields default to taking the first match.
    pub fn new(field: Field, css: &str) -> crate::Result<Self> {
        let take = match field {
            Field::Email | Field::Phone => Take::First,
            _ => Take::Joined,
        };

        Ok(Self {
            field,
            css: css.to_string(),
            selector: parse_selector(css)?,
            scope: TextScope::Own,
            take,
            contains: None,
            collapse_whitespace: false,
        })
    }

    pub fn descendants(mut self) -> Self {
        self.scope = TextScope::Descendants;
        self
    }

    pub fn first(mut self) -> Self {
        self.take = Take::First;
        self
    }

    pub fn containing(mut self, needle: &str) -> Self {
        self.contains = Some(needle.to_string());
        self
    }

    pub fn collapse_whitespace(mut self) -> Self {
        self.collapse_whitespace = true;
        self
    }

    /// Extracts this field's value from a document
    pub fn extract(&self, document: &Html) -> Option<String> {
        let mut values = document
            .select(&self.selector)
            .flat_map(|element| self.text_nodes(element))
            .map(|text| self.clean(text))
            .filter(|text| !text.is_empty())
            .filter(|text| {
                self.contains
                    .as_deref()
                    .map_or(true, |needle| text.contains(needle))
            });

        match self.take {
            Take::First => values.next(),
            Take::Joined => {
                let parts: Vec<String> = values.collect();
                if parts.is_empty() {
                    None
                } else {
                    Some(parts.join(" "))
                }
            }
        }
    }

    fn text_nodes<'a>(&self, element: ElementRef<'a>) -> Vec<&'a str> {
        match self.scope {
            TextScope::Own => element
                .children()
                .filter_map(|node| node.value().as_text())
                .map(|text| &**text)
                .collect(),
            TextScope::Descendants => element.text().collect(),
        }
    }

    fn clean(&self, text: &str) -> String {
        if self.collapse_whitespace {
            text.replace('\u{a0}', " ")
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
        } else {
            text.trim().to_string()
        }
    }
}

/// Field-to-selector mapping for one page layout
#[derive(Debug, Clone)]
pub struct FieldMap {
    specs: Vec<FieldSpec>,
}

impl FieldMap {
    pub fn new(specs: Vec<FieldSpec>) -> Self {
        Self { specs }
    }

    /// Selector preset of the given site variant
    pub fn for_variant(variant: SiteVariant) -> crate::Result<Self> {
        match variant {
            SiteVariant::Current => Self::current(),
            SiteVariant::Legacy => Self::legacy(),
        }
    }

    /// Current detail page layout
    pub fn current() -> crate::Result<Self> {
        Ok(Self::new(vec![
            FieldSpec::new(Field::Name, r#"h1[class="text-2xl leading-8"]"#)?,
            FieldSpec::new(Field::Institution, r#"h2[class*="text-base"] a"#)?,
            FieldSpec::new(Field::Role, r#"h1 ~ div[class="mt-2"]"#)?.first(),
            FieldSpec::new(Field::StartDate, r#"span[class="ml-1"]"#)?,
            FieldSpec::new(Field::Email, "span")?.containing("@"),
            FieldSpec::new(Field::Phone, r#"a[aria-label*="Llamar al número"]"#)?,
            FieldSpec::new(Field::ResolutionRef, r#"div[class*="mt-3 font-bold"] div"#)?,
            FieldSpec::new(Field::Biography, r#"div[class="leading-6"]"#)?
                .descendants()
                .collapse_whitespace(),
        ]))
    }

    /// Older detail page layout
    pub fn legacy() -> crate::Result<Self> {
        Ok(Self::new(vec![
            FieldSpec::new(Field::Institution, r#"h1[class*="text-base"] a"#)?,
            FieldSpec::new(Field::Name, r#"h2[class="md:text-4xl mt-3"]"#)?,
            FieldSpec::new(Field::Role, r#"div[class="mt-4"]"#)?,
            FieldSpec::new(Field::StartDate, r#"span[class="ml-1"]"#)?,
            FieldSpec::new(Field::Email, r#"a[class*="track-ga-click"] span"#)?,
            FieldSpec::new(Field::Phone, r#"a[class*="icon-text"][href^="tel:"]"#)?,
            FieldSpec::new(Field::ResolutionRef, r#"div[class*="mt-3 font-bold"] div"#)?,
            FieldSpec::new(Field::Biography, "#biography-showhide")?
                .descendants()
                .collapse_whitespace(),
        ]))
    }

    pub fn specs(&self) -> &[FieldSpec] {
        &self.specs
    }

    pub fn get(&self, field: Field) -> Option<&FieldSpec> {
        self.specs.iter().find(|spec| spec.field == field)
    }
}

/// Raw extracted values keyed by field
pub type ExtractedFields = BTreeMap<Field, String>;

/// Extracts every mapped field from a document
///
/// Fields whose selector matches nothing are absent from the result.
pub fn extract_fields(document: &Html, map: &FieldMap) -> ExtractedFields {
    map.specs()
        .iter()
        .filter_map(|spec| spec.extract(document).map(|value| (spec.field, value)))
        .collect()
}

/// Builds a record from extracted values, normalizing the start date
pub fn record_from_fields(source_url: &str, fields: &ExtractedFields) -> DirectoryRecord {
    let get = |field: Field| fields.get(&field).cloned();

    let start_date = fields.get(&Field::StartDate).and_then(|raw| {
        let parsed = normalize_date(raw);
        if parsed.is_none() {
            tracing::debug!(url = source_url, raw = raw.as_str(), "Unparseable start date");
        }
        parsed
    });

    DirectoryRecord {
        name: get(Field::Name),
        institution: get(Field::Institution),
        role: get(Field::Role),
        start_date,
        email: get(Field::Email),
        phone: get(Field::Phone),
        resolution_ref: get(Field::ResolutionRef),
        source_url: source_url.to_string(),
        biography: get(Field::Biography),
    }
}

/// Parses a detail page and extracts its record
pub fn extract_record(html: &str, source_url: &str, map: &FieldMap) -> DirectoryRecord {
    let document = Html::parse_document(html);
    let fields = extract_fields(&document, map);
    record_from_fields(source_url, &fields)
}
