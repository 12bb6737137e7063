//! Common utilities and helper functions
//!
//! This module provides the small text conversions shared by the parser and
//! the model builder.

pub mod error;

use regex::Regex;
use std::sync::OnceLock;

use crate::utils::error::ParseError;

/// Normalize whitespace in text
pub fn normalize_whitespace(text: &str) -> String {
    static WHITESPACE_RE: OnceLock<Regex> = OnceLock::new();

    let re = WHITESPACE_RE.get_or_init(|| Regex::new(r"\s+").expect("Invalid regex pattern"));

    re.replace_all(text.trim(), " ").to_string()
}

/// Convert a human-readable byte count as printed by the console into bytes
///
/// Apache formats traffic counters with `apr_strfsize`, e.g. `"  0 "`,
/// `"512 "`, `"1.2K"`, `" 12M"`. Units are powers of 1024.
///
/// # Errors
///
/// Returns `ParseError::InvalidField` naming `field` when the text is not a
/// size.
pub fn parse_human_size(field: &str, text: &str) -> Result<u64, ParseError> {
    const UNITS: &[char] = &['K', 'M', 'G', 'T', 'P', 'E'];

    let trimmed = text.trim();
    let invalid = || ParseError::invalid(field, text);

    let (number, exponent) = match trimmed.chars().last() {
        Some(c) => match UNITS.iter().position(|u| u.eq_ignore_ascii_case(&c)) {
            Some(idx) => (trimmed[..trimmed.len() - 1].trim_end(), idx as i32 + 1),
            None => (trimmed, 0),
        },
        None => return Err(invalid()),
    };

    if exponent == 0 {
        return number.parse::<u64>().map_err(|_| invalid());
    }

    let value = number.parse::<f64>().map_err(|_| invalid())?;
    if !value.is_finite() || value < 0.0 {
        return Err(invalid());
    }

    Ok((value * 1024f64.powi(exponent)) as u64)
}

/// Parse a numeric field, trimming surrounding whitespace
pub fn parse_number<T: std::str::FromStr>(field: &str, text: &str) -> Result<T, ParseError> {
    text.trim()
        .parse::<T>()
        .map_err(|_| ParseError::invalid(field, text))
}

/// Parse an `On`/`Off` or `Yes`/`No` console flag
pub fn parse_switch(field: &str, text: &str) -> Result<bool, ParseError> {
    match text.trim().to_ascii_lowercase().as_str() {
        "on" | "yes" => Ok(true),
        "off" | "no" => Ok(false),
        _ => Err(ParseError::invalid(field, text)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  Init   Ok \n"), "Init Ok");
        assert_eq!(normalize_whitespace(""), "");
    }

    #[test]
    fn test_parse_human_size() {
        assert_eq!(parse_human_size("to", "  0 ").unwrap(), 0);
        assert_eq!(parse_human_size("to", "512 ").unwrap(), 512);
        assert_eq!(parse_human_size("to", "1.0K").unwrap(), 1024);
        assert_eq!(parse_human_size("to", "1.2K").unwrap(), 1228);
        assert_eq!(parse_human_size("to", " 12M").unwrap(), 12 * 1024 * 1024);
        assert_eq!(parse_human_size("to", "2.0G").unwrap(), 2 * 1024 * 1024 * 1024);
    }

    #[test]
    fn test_parse_human_size_rejects_garbage() {
        assert!(matches!(
            parse_human_size("from", "lots"),
            Err(ParseError::InvalidField { ref field, .. }) if field == "from"
        ));
        assert!(parse_human_size("from", "").is_err());
        assert!(parse_human_size("from", "K").is_err());
    }

    #[test]
    fn test_parse_switch() {
        assert!(parse_switch("active", "Yes").unwrap());
        assert!(!parse_switch("disable_failover", " Off ").unwrap());
        assert!(parse_switch("active", "maybe").is_err());
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number::<u32>("set", " 3 ").unwrap(), 3);
        assert!(parse_number::<u32>("set", "-1").is_err());
    }

    proptest! {
        #[test]
        fn prop_plain_byte_counts_round_trip(n in 0u64..1024) {
            prop_assert_eq!(parse_human_size("to", &format!("{n} ")).unwrap(), n);
        }

        #[test]
        fn prop_kilobytes_scale(n in 1u64..1000) {
            prop_assert_eq!(parse_human_size("to", &format!("{n}K")).unwrap(), n * 1024);
        }
    }
}
