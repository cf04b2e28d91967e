// SPDX-License-Identifier: GPL-3.0-only

//! Conversions between byte counts and human-readable size strings
//!
//! Several backends parse sizes out of tool output ("128 MiB", "1.5 GB")
//! and format byte counts back for diagnostics. Binary units (KiB..EiB)
//! use factor 1024, decimal units (KB..EB) use factor 1000; a bare number
//! is a byte count.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SizeParseError {
    #[error("Invalid size value: {0}")]
    InvalidValue(String),

    #[error("Invalid size unit: {0}")]
    InvalidUnit(String),

    #[error("Size is negative: {0}")]
    Negative(String),
}

const BINARY_UNITS: [&str; 7] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB", "EiB"];
const DECIMAL_UNITS: [&str; 7] = ["B", "KB", "MB", "GB", "TB", "PB", "EB"];

fn unit_factor(unit: &str) -> Option<f64> {
    if let Some(step) = BINARY_UNITS.iter().position(|u| u.eq_ignore_ascii_case(unit)) {
        return Some(1024_f64.powi(step as i32));
    }
    if let Some(step) = DECIMAL_UNITS.iter().position(|u| u.eq_ignore_ascii_case(unit)) {
        return Some(1000_f64.powi(step as i32));
    }
    None
}

/// Parse a human-readable size ("128 MiB", "1.5GB", "4096") into bytes.
pub fn parse_size(input: &str) -> Result<u64, SizeParseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(SizeParseError::InvalidValue(input.to_string()));
    }

    let split_at = trimmed
        .find(|c: char| !c.is_ascii_digit() && c != '.' && c != '-' && c != '+')
        .unwrap_or(trimmed.len());
    let (number, unit) = trimmed.split_at(split_at);
    let unit = unit.trim();

    let value: f64 = number
        .trim()
        .parse()
        .map_err(|_| SizeParseError::InvalidValue(input.to_string()))?;
    if value < 0.0 {
        return Err(SizeParseError::Negative(input.to_string()));
    }

    let factor = if unit.is_empty() {
        1.0
    } else {
        unit_factor(unit).ok_or_else(|| SizeParseError::InvalidUnit(unit.to_string()))?
    };

    Ok((value * factor) as u64)
}

/// Format a byte count using binary units ("1.50 GiB").
///
/// Whole-unit values drop the fraction ("128 MiB", not "128.00 MiB").
pub fn format_size(bytes: u64) -> String {
    let mut step = 0;
    let mut value = bytes as f64;

    while value >= 1024.0 && step < BINARY_UNITS.len() - 1 {
        value /= 1024.0;
        step += 1;
    }

    if value.fract() == 0.0 {
        format!("{} {}", value as u64, BINARY_UNITS[step])
    } else {
        format!("{:.2} {}", value, BINARY_UNITS[step])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_binary_and_decimal_units() {
        assert_eq!(parse_size("128 MiB").unwrap(), 128 * 1024 * 1024);
        assert_eq!(parse_size("128MiB").unwrap(), 128 * 1024 * 1024);
        assert_eq!(parse_size("1.5 GB").unwrap(), 1_500_000_000);
        assert_eq!(parse_size("2 KiB").unwrap(), 2048);
        assert_eq!(parse_size("4096").unwrap(), 4096);
        assert_eq!(parse_size("0").unwrap(), 0);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(matches!(
            parse_size("ten MiB"),
            Err(SizeParseError::InvalidValue(_))
        ));
        assert!(matches!(
            parse_size("10 parsecs"),
            Err(SizeParseError::InvalidUnit(_))
        ));
        assert!(matches!(
            parse_size("-4 KiB"),
            Err(SizeParseError::Negative(_))
        ));
        assert!(parse_size("").is_err());
    }

    #[test]
    fn formats_whole_and_fractional_values() {
        assert_eq!(format_size(4096), "4 KiB");
        assert_eq!(format_size(128 * 1024 * 1024), "128 MiB");
        assert_eq!(format_size(1_610_612_736), "1.50 GiB");
        assert_eq!(format_size(999), "999 B");
    }

    #[test]
    fn round_trips_whole_units() {
        for bytes in [512_u64, 4096, 1024 * 1024, 128 * 1024 * 1024] {
            assert_eq!(parse_size(&format_size(bytes)).unwrap(), bytes);
        }
    }
}
