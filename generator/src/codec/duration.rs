//! Run time conversion.
//!
//! Run times arrive as `H:MM:SS` and are recorded in FOXML as decimal
//! minutes with two places. Values are kept as [`Decimal`] so group totals
//! are exact sums of the rounded part values.
//!
//! Rounding is half away from zero. With whole seconds the third decimal
//! of `S/60` is never exactly 5, so the choice only matters for callers of
//! [`round_minutes`] with arbitrary decimals.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{CodecError, CodecResult};

/// Decimal places kept for minutes.
pub const MINUTES_SCALE: u32 = 2;

/// Convert `H:MM:SS` into decimal minutes.
///
/// Empty input is not an error: it yields `Ok(None)` so that a part
/// without a run time contributes nothing to its group.
///
/// # Example
/// ```ignore
/// use xmlgen::codec::convert_duration;
/// use rust_decimal::Decimal;
///
/// assert_eq!(convert_duration("01:30:00").unwrap(), Some(Decimal::new(9000, 2)));
/// assert_eq!(convert_duration("").unwrap(), None);
/// ```
pub fn convert_duration(text: &str) -> CodecResult<Option<Decimal>> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }

    let malformed = || CodecError::MalformedDuration(text.to_string());

    let components: Vec<&str> = text.split(':').collect();
    if components.len() < 3 {
        return Err(malformed());
    }

    let mut numbers = [0u64; 3];
    for (slot, component) in numbers.iter_mut().zip(&components) {
        *slot = component.trim().parse::<u64>().map_err(|_| malformed())?;
    }
    let [hours, minutes, seconds] = numbers;

    let whole = hours
        .checked_mul(60)
        .and_then(|m| m.checked_add(minutes))
        .ok_or_else(malformed)?;
    let total = Decimal::from(whole) + Decimal::from(seconds) / Decimal::from(60u64);

    Ok(Some(round_minutes(total)))
}

/// Round to [`MINUTES_SCALE`] places, half away from zero.
pub fn round_minutes(minutes: Decimal) -> Decimal {
    minutes.round_dp_with_strategy(MINUTES_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Render minutes with exactly two decimals (`15.5` -> `"15.50"`).
pub fn format_minutes(minutes: Decimal) -> String {
    let mut rounded = round_minutes(minutes);
    rounded.rescale(MINUTES_SCALE);
    rounded.to_string()
}

/// Document literal for a duration cell: formatted minutes, or `""` when
/// the cell is empty.
pub fn duration_literal(text: &str) -> CodecResult<String> {
    Ok(convert_duration(text)?.map(format_minutes).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minutes(text: &str) -> String {
        format_minutes(convert_duration(text).unwrap().unwrap())
    }

    #[test]
    fn test_convert_whole_hours() {
        assert_eq!(minutes("01:30:00"), "90.00");
        assert_eq!(convert_duration("01:30:00").unwrap(), Some(Decimal::new(9000, 2)));
    }

    #[test]
    fn test_convert_seconds_only() {
        assert_eq!(minutes("00:00:45"), "0.75");
        assert_eq!(minutes("00:05:30"), "5.50");
    }

    #[test]
    fn test_convert_rounds_to_two_places() {
        // 1/60 = 0.01666...
        assert_eq!(minutes("0:00:01"), "0.02");
        // 20/60 = 0.333...
        assert_eq!(minutes("0:00:20"), "0.33");
        assert_eq!(minutes("2:03:59"), "123.98");
    }

    #[test]
    fn test_rounding_is_half_away_from_zero() {
        assert_eq!(round_minutes(Decimal::new(1245, 3)), Decimal::new(125, 2));
        assert_eq!(round_minutes(Decimal::new(1235, 3)), Decimal::new(124, 2));
        assert_eq!(format_minutes(Decimal::new(1245, 3)), "1.25");
    }

    #[test]
    fn test_empty_passes_through() {
        assert_eq!(convert_duration("").unwrap(), None);
        assert_eq!(convert_duration("   ").unwrap(), None);
        assert_eq!(duration_literal("").unwrap(), "");
    }

    #[test]
    fn test_too_few_components() {
        assert_eq!(
            convert_duration("10:00"),
            Err(CodecError::MalformedDuration("10:00".to_string()))
        );
        assert!(convert_duration("45").is_err());
    }

    #[test]
    fn test_non_numeric_components() {
        assert!(convert_duration("1:xx:00").is_err());
        assert!(convert_duration("-1:00:00").is_err());
        assert!(convert_duration("1::00").is_err());
    }

    #[test]
    fn test_extra_components_ignored() {
        assert_eq!(minutes("0:10:00:99"), "10.00");
    }

    #[test]
    fn test_format_pads_scale() {
        assert_eq!(format_minutes(Decimal::from(15)), "15.00");
        assert_eq!(format_minutes(Decimal::new(155, 1)), "15.50");
        assert_eq!(format_minutes(Decimal::ZERO), "0.00");
    }

    #[test]
    fn test_duration_literal() {
        assert_eq!(duration_literal("00:10:00").unwrap(), "10.00");
    }
}
