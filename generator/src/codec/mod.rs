//! Field codec.
//!
//! Encodes raw cell values into the literal text substituted into FOXML
//! templates:
//!
//! - [`duration`] - `H:MM:SS` run times to decimal minutes
//! - [`date`] - date values plus certainty flags to `<date>` markup
//! - [`strip_inch_mark`] - reel sizes lose their trailing `"`

pub mod date;
pub mod duration;

pub use date::{
    date_markup, encode_date, Certainty, DateAttributes, DateCount, DateFragment, DateShape,
    DATE_ERA,
};
pub use duration::{convert_duration, duration_literal, format_minutes, round_minutes};

/// Remove one trailing inch mark from a reel size (`7"` -> `7`).
pub fn strip_inch_mark(value: &str) -> &str {
    value.strip_suffix('"').unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_inch_mark() {
        assert_eq!(strip_inch_mark("7\""), "7");
        assert_eq!(strip_inch_mark("10.5"), "10.5");
        assert_eq!(strip_inch_mark(""), "");
        // Only the last one goes
        assert_eq!(strip_inch_mark("7\"\""), "7\"");
    }
}
