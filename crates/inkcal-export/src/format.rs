//! Culture-independent number rendering for table cells.
//!
//! Decimals use `.` and at most [`MAX_FRACTION_DIGITS`] fractional digits
//! with trailing zeros trimmed. Infinities render as `Infinity` /
//! `-Infinity`.

/// Maximum number of fractional digits in a rendered cell.
pub const MAX_FRACTION_DIGITS: usize = 8;

/// Cell value used for positive infinity.
pub const INFINITY: &str = "Infinity";

/// Render a float for a table cell.
#[must_use]
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 {
            INFINITY.to_string()
        } else {
            format!("-{INFINITY}")
        };
    }

    let fixed = format!("{value:.prec$}", prec = MAX_FRACTION_DIGITS);
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Render a boolean flag as `1` / `0`.
#[must_use]
pub fn format_flag(flag: bool) -> String {
    u8::from(flag).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_trailing_zeros() {
        assert_eq!(format_number(1.0), "1");
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(0.1), "0.1");
        assert_eq!(format_number(12.25), "12.25");
    }

    #[test]
    fn rounds_to_eight_digits() {
        assert_eq!(format_number(1.0 / 3.0), "0.33333333");
        assert_eq!(format_number(2.0 / 3.0), "0.66666667");
        assert_eq!(format_number(1e-9), "0");
    }

    #[test]
    fn negative_zero_and_tiny_negatives_render_as_zero() {
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(-1e-12), "0");
        assert_eq!(format_number(-2.5), "-2.5");
    }

    #[test]
    fn infinities() {
        assert_eq!(format_number(f64::INFINITY), "Infinity");
        assert_eq!(format_number(f64::NEG_INFINITY), "-Infinity");
        assert_eq!(format_number(f64::NAN), "NaN");
    }

    #[test]
    fn flags() {
        assert_eq!(format_flag(true), "1");
        assert_eq!(format_flag(false), "0");
    }
}
