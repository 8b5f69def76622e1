//! Date markup.
//!
//! A date cell comes with an attribute cell such as `single exact date`
//! or `multiple circa date`. The attribute tokens select:
//!
//! | token      | effect                                            |
//! |------------|---------------------------------------------------|
//! | `multiple` | value is `;`-separated, one `<date>` per entry    |
//! | `circa`    | `certainty="circa"` instead of `exact`            |
//! | `range`    | `from`/`to` attributes taken from the value       |
//!
//! Ranges are `YYYY-YYYY` (2 parts) or `YYYY-MM-DD-YYYY-MM-DD` (6 parts,
//! the years are used for `from`/`to`).

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CodecError, CodecResult};

/// Era attribute written on every fragment.
pub const DATE_ERA: &str = "ad";

const RANGE_SEPARATOR: char = '-';
const MULTIPLE_SEPARATOR: char = ';';

static FRAGMENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^<date certainty="(exact|circa)" era="([^"]*)"(?: from="([^"]*)" to="([^"]*)")?>(.*)</date>$"#,
    )
    .expect("valid date fragment pattern")
});

// =============================================================================
// Attributes
// =============================================================================

/// Exact or approximate date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Certainty {
    #[default]
    Exact,
    Circa,
}

impl Certainty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Certainty::Exact => "exact",
            Certainty::Circa => "circa",
        }
    }
}

impl fmt::Display for Certainty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One date or a `;`-separated list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DateCount {
    #[default]
    Single,
    Multiple,
}

/// A point in time or a from/to range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DateShape {
    #[default]
    Point,
    Range,
}

/// Parsed attribute flags of a date cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DateAttributes {
    pub count: DateCount,
    pub certainty: Certainty,
    pub shape: DateShape,
}

impl DateAttributes {
    /// Read flags from free text; absent tokens fall back to
    /// single / exact / point.
    pub fn parse(flags: &str) -> Self {
        let flags = flags.to_lowercase();
        Self {
            count: if flags.contains("multiple") {
                DateCount::Multiple
            } else {
                DateCount::Single
            },
            certainty: if flags.contains("circa") {
                Certainty::Circa
            } else {
                Certainty::Exact
            },
            shape: if flags.contains("range") {
                DateShape::Range
            } else {
                DateShape::Point
            },
        }
    }
}

// =============================================================================
// Fragments
// =============================================================================

/// One `<date>` element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateFragment {
    pub certainty: Certainty,
    /// `(from, to)` for ranges.
    pub range: Option<(String, String)>,
    pub value: String,
}

impl DateFragment {
    /// Render as markup.
    pub fn render(&self) -> String {
        match &self.range {
            Some((from, to)) => format!(
                r#"<date certainty="{}" era="{}" from="{}" to="{}">{}</date>"#,
                self.certainty, DATE_ERA, from, to, self.value
            ),
            None => format!(
                r#"<date certainty="{}" era="{}">{}</date>"#,
                self.certainty, DATE_ERA, self.value
            ),
        }
    }

    /// Read back a fragment produced by [`DateFragment::render`].
    pub fn parse(markup: &str) -> Option<Self> {
        let caps = FRAGMENT_RE.captures(markup.trim())?;
        let certainty = match &caps[1] {
            "circa" => Certainty::Circa,
            _ => Certainty::Exact,
        };
        let range = match (caps.get(3), caps.get(4)) {
            (Some(from), Some(to)) => Some((from.as_str().to_string(), to.as_str().to_string())),
            _ => None,
        };
        Some(Self {
            certainty,
            range,
            value: caps[5].to_string(),
        })
    }
}

/// Encode a date value into one or more fragments.
///
/// A point date always gives one fragment per `;` entry, empty entries
/// included. An empty range value is an unsupported shape.
pub fn encode_date(value: &str, attributes: &DateAttributes) -> CodecResult<Vec<DateFragment>> {
    let value = value.trim();

    if attributes.shape == DateShape::Range {
        let parts: Vec<&str> = value.split(RANGE_SEPARATOR).map(str::trim).collect();
        let (from, to) = match parts.len() {
            2 => (parts[0], parts[1]),
            6 => (parts[0], parts[4]),
            n => {
                return Err(CodecError::UnsupportedDateShape {
                    value: value.to_string(),
                    parts: n,
                })
            }
        };
        return Ok(vec![DateFragment {
            certainty: attributes.certainty,
            range: Some((from.to_string(), to.to_string())),
            value: value.to_string(),
        }]);
    }

    let fragment = |v: &str| DateFragment {
        certainty: attributes.certainty,
        range: None,
        value: v.to_string(),
    };

    match attributes.count {
        DateCount::Multiple => Ok(value
            .split(MULTIPLE_SEPARATOR)
            .map(str::trim)
            .map(fragment)
            .collect()),
        DateCount::Single => Ok(vec![fragment(value)]),
    }
}

/// Encode and render, one fragment per line.
pub fn date_markup(value: &str, flags: &str) -> CodecResult<String> {
    let fragments = encode_date(value, &DateAttributes::parse(flags))?;
    Ok(fragments
        .iter()
        .map(DateFragment::render)
        .collect::<Vec<_>>()
        .join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_attributes() {
        let attrs = DateAttributes::parse("Multiple Circa Date");
        assert_eq!(attrs.count, DateCount::Multiple);
        assert_eq!(attrs.certainty, Certainty::Circa);
        assert_eq!(attrs.shape, DateShape::Point);

        assert_eq!(DateAttributes::parse(""), DateAttributes::default());
    }

    #[test]
    fn test_single_exact_date() {
        let markup = date_markup("1965-05-01", "single exact date").unwrap();
        assert_eq!(markup, r#"<date certainty="exact" era="ad">1965-05-01</date>"#);
    }

    #[test]
    fn test_circa_year_range() {
        let markup = date_markup("1950-1959", "single circa range").unwrap();
        assert_eq!(
            markup,
            r#"<date certainty="circa" era="ad" from="1950" to="1959">1950-1959</date>"#
        );
    }

    #[test]
    fn test_full_date_range_uses_years() {
        let fragments = encode_date(
            "1970-01-15-1972-06-30",
            &DateAttributes::parse("exact range"),
        )
        .unwrap();
        assert_eq!(fragments.len(), 1);
        assert_eq!(
            fragments[0].range,
            Some(("1970".to_string(), "1972".to_string()))
        );
    }

    #[test]
    fn test_unsupported_range_shape() {
        let err = encode_date("1970-01-1972", &DateAttributes::parse("range")).unwrap_err();
        assert_eq!(
            err,
            CodecError::UnsupportedDateShape {
                value: "1970-01-1972".to_string(),
                parts: 3
            }
        );
        assert!(encode_date("1970", &DateAttributes::parse("range")).is_err());
    }

    #[test]
    fn test_multiple_dates() {
        let markup = date_markup("1961; 1963 ;1964", "multiple exact date").unwrap();
        let lines: Vec<&str> = markup.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], r#"<date certainty="exact" era="ad">1963</date>"#);
    }

    #[test]
    fn test_empty_entries_are_kept() {
        let fragments = encode_date("1961;;1963", &DateAttributes::parse("multiple exact date")).unwrap();
        assert_eq!(fragments.len(), 3);
        assert_eq!(fragments[1].value, "");
    }

    #[test]
    fn test_empty_point_date() {
        assert_eq!(
            date_markup("", "single exact date").unwrap(),
            r#"<date certainty="exact" era="ad"></date>"#
        );
    }

    #[test]
    fn test_empty_range_is_unsupported() {
        let err = encode_date("", &DateAttributes::parse("single exact range")).unwrap_err();
        assert_eq!(
            err,
            CodecError::UnsupportedDateShape {
                value: String::new(),
                parts: 1
            }
        );
    }

    #[test]
    fn test_fragment_round_trip_classification() {
        let cases = [
            ("1960", "single exact date", Certainty::Exact, false),
            ("1960", "single circa date", Certainty::Circa, false),
            ("1960-1969", "single exact range", Certainty::Exact, true),
            ("1960-1969", "single circa range", Certainty::Circa, true),
        ];

        for (value, flags, certainty, is_range) in cases {
            let attrs = DateAttributes::parse(flags);
            for fragment in encode_date(value, &attrs).unwrap() {
                let parsed = DateFragment::parse(&fragment.render()).unwrap();
                assert_eq!(parsed.certainty, certainty, "{}", flags);
                assert_eq!(parsed.range.is_some(), is_range, "{}", flags);
                assert_eq!(parsed, fragment);
            }
        }
    }
}
