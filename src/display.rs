// SPDX: CC0-1.0

//! Axis-label formatting.
//!
//! Labels adapt between fixed and scientific notation by magnitude, with
//! significant figures capped at 5. Formatting never feeds back into the
//! stored bounds; it is display-only.

use crate::Number;

/// Significant decimal digits of a value: its digit string with leading
/// and trailing zeros stripped.
fn sig_digits(num: Number) -> usize {
    let text = format!("{num}");
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    digits.trim_start_matches('0').trim_end_matches('0').len()
}

/// Round for display. `dec_places` is the viewport's label granularity
/// hint (the negated grid-step exponent).
pub fn round_display(num: Number, dec_places: i32) -> String {
    let a = num.abs();
    if a < 1e-6 {
        return String::from("0");
    }

    let sigfigs = sig_digits(num).clamp(1, 5);
    if a >= 1e4 {
        return format!("{:.*e}", sigfigs - 1, num);
    }
    if a >= 2.0 {
        // fixed notation rounded to `sigfigs` significant figures
        let exponent = a.log10().floor() as i32;
        let decimals = (sigfigs as i32 - 1 - exponent).max(0) as usize;
        return format!("{:.*}", decimals, num);
    }

    let decimals = dec_places.clamp(0, 5) as usize;
    if a > 1e-1 {
        format!("{:.*}", decimals, num)
    } else {
        format!("{:.*e}", decimals, num)
    }
}
