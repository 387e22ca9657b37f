// SPDX-License-Identifier: Apache-2.0
//! The four value kinds a fixture attribute may carry (spec.md §6):
//! base-prefixed unsigned/signed integers, decimal Q16.16 (exact ×0x10000
//! then banker's-rounded), and symbolic names hashed by [`dominium_hash::h32`].

use dominium_fixed::{Q16_16, Q48_16};

use crate::error::FixtureError;

fn malformed(key: &str, value: &str, line: usize) -> FixtureError {
    FixtureError::MalformedValue {
        line,
        key: key.to_string(),
        value: value.to_string(),
    }
}

/// Parses `text` as a base-prefixed unsigned 64-bit integer: `0x…` hex,
/// a leading `0` followed only by octal digits, or plain decimal —
/// mirroring `strtoul(text, &end, 0)` in the original fixture CLI.
fn parse_u64_prefixed(key: &str, text: &str, line: usize) -> Result<u64, FixtureError> {
    let trimmed = text.trim();
    let err = || malformed(key, text, line);
    if let Some(hex) = trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
        return u64::from_str_radix(hex, 16).map_err(|_| err());
    }
    if trimmed.len() > 1 && trimmed.starts_with('0') && trimmed.as_bytes()[1..].iter().all(u8::is_ascii_digit) {
        return u64::from_str_radix(&trimmed[1..], 8).map_err(|_| err());
    }
    trimmed.parse::<u64>().map_err(|_| err())
}

/// Parses an unsigned 32-bit integer.
pub fn parse_u32(key: &str, text: &str, line: usize) -> Result<u32, FixtureError> {
    u32::try_from(parse_u64_prefixed(key, text, line)?).map_err(|_| malformed(key, text, line))
}

/// Parses an unsigned 16-bit integer (schema versions).
pub fn parse_u16(key: &str, text: &str, line: usize) -> Result<u16, FixtureError> {
    u16::try_from(parse_u64_prefixed(key, text, line)?).map_err(|_| malformed(key, text, line))
}

/// The schema revision this parser accepts. A fixture that omits
/// `*_schema_version` entirely (the field defaults to `0`) is treated as
/// "unversioned" and always accepted; one that sets it explicitly must
/// match this value exactly.
pub const CURRENT_SCHEMA_VERSION: u16 = 1;

/// Rejects an entity whose `schema_version` was set to neither `0`
/// (unversioned) nor [`CURRENT_SCHEMA_VERSION`].
pub fn check_schema_version(got: u16, line: usize) -> Result<(), FixtureError> {
    if got == 0 || got == CURRENT_SCHEMA_VERSION {
        Ok(())
    } else {
        Err(FixtureError::IncompatibleSchemaVersion {
            line,
            expected: CURRENT_SCHEMA_VERSION,
            got,
        })
    }
}

/// Parses an unsigned 64-bit integer (ticks).
pub fn parse_u64(key: &str, text: &str, line: usize) -> Result<u64, FixtureError> {
    parse_u64_prefixed(key, text, line)
}

/// Parses a signed 32-bit integer: an optional leading `-`/`+` followed
/// by [`parse_u64_prefixed`]'s grammar on the magnitude.
pub fn parse_i32(key: &str, text: &str, line: usize) -> Result<i32, FixtureError> {
    let trimmed = text.trim();
    let err = || malformed(key, text, line);
    if let Some(rest) = trimmed.strip_prefix('-') {
        let magnitude = parse_u64_prefixed(key, rest, line)?;
        i32::try_from(magnitude).map(|v| -v).map_err(|_| err())
    } else {
        let rest = trimmed.strip_prefix('+').unwrap_or(trimmed);
        i32::try_from(parse_u64_prefixed(key, rest, line)?).map_err(|_| err())
    }
}

/// A `u32` reference field: a plain integer if `text` parses as one,
/// otherwise the symbolic-name hash of `text` (spec.md §6 "symbolic
/// names"; mirrors the original fixture CLI's parse-then-hash fallback).
#[must_use]
pub fn parse_ref(text: &str) -> u32 {
    // `key`/`line` are only used for the discarded error path here.
    parse_u32("ref", text, 0).unwrap_or_else(|_| dominium_hash::h32(text))
}

const FRAC_BITS: u32 = 16;
/// `10^16`: large enough that dividing any `magnitude * scale` product by
/// `2^16` (which always evenly divides a power of ten this large) is
/// exact, so [`format_q`] never loses a bit re-emitting a parsed value.
const FRAC_DECIMALS: u32 = 16;

/// Converts a decimal string into a `raw * 2^FRAC_BITS` fixed-point value
/// using exact integer arithmetic (never `f64`), rounding the final
/// division with round-half-to-even (spec.md §6 "banker's rounding to
/// keep symmetric behavior").
fn decimal_to_raw(key: &str, text: &str, line: usize) -> Result<i128, FixtureError> {
    let err = || malformed(key, text, line);
    let trimmed = text.trim();
    let (negative, magnitude_text) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };

    let mut parts = magnitude_text.splitn(2, '.');
    let int_part = parts.next().unwrap_or("");
    let frac_part = parts.next().unwrap_or("");
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(err());
    }
    if !int_part.chars().all(|c| c.is_ascii_digit()) || !frac_part.chars().all(|c| c.is_ascii_digit()) {
        return Err(err());
    }

    let int_value: i128 = if int_part.is_empty() {
        0
    } else {
        int_part.parse().map_err(|_| err())?
    };
    let frac_value: i128 = if frac_part.is_empty() {
        0
    } else {
        frac_part.parse().map_err(|_| err())?
    };
    let scale: i128 = 10_i128
        .checked_pow(u32::try_from(frac_part.len()).map_err(|_| err())?)
        .ok_or_else(err)?;

    let scaled = int_value
        .checked_mul(scale)
        .and_then(|v| v.checked_add(frac_value))
        .ok_or_else(err)?;
    let numerator = scaled
        .checked_mul(1_i128 << FRAC_BITS)
        .ok_or_else(err)?;

    let quotient = numerator / scale;
    let remainder = numerator % scale;
    let twice = remainder * 2;
    let rounded = if twice > scale {
        quotient + 1
    } else if twice < scale {
        quotient
    } else if quotient % 2 == 0 {
        quotient
    } else {
        quotient + 1
    };

    Ok(if negative { -rounded } else { rounded })
}

/// Parses a decimal string into `Q16_16`.
pub fn parse_q16_16(key: &str, text: &str, line: usize) -> Result<Q16_16, FixtureError> {
    let raw = decimal_to_raw(key, text, line)?;
    i32::try_from(raw)
        .map(Q16_16::from_raw)
        .map_err(|_| malformed(key, text, line))
}

/// Parses a decimal string into `Q48_16`.
pub fn parse_q48_16(key: &str, text: &str, line: usize) -> Result<Q48_16, FixtureError> {
    let raw = decimal_to_raw(key, text, line)?;
    i64::try_from(raw)
        .map(Q48_16::from_raw)
        .map_err(|_| malformed(key, text, line))
}

/// Formats a `raw * 2^FRAC_BITS` fixed-point value back to the shortest
/// exact decimal string `parse_q16_16`/`parse_q48_16` would re-parse to
/// the same raw value — the canonical re-emit form (spec.md §8 "parse,
/// emit back, parse again → structurally identical").
fn format_raw(raw: i128) -> String {
    let negative = raw < 0;
    let magnitude = raw.unsigned_abs();
    let scale: u128 = 1_u128 << FRAC_BITS;
    let int_part = magnitude / scale;
    let frac_part = magnitude % scale;
    let sign = if negative { "-" } else { "" };
    if frac_part == 0 {
        return format!("{sign}{int_part}");
    }
    let frac_decimal = frac_part * 10_u128.pow(FRAC_DECIMALS) / scale;
    let mut frac_str = format!("{frac_decimal:0width$}", width = FRAC_DECIMALS as usize);
    while frac_str.ends_with('0') {
        frac_str.pop();
    }
    format!("{sign}{int_part}.{frac_str}")
}

/// Canonical decimal form of a `Q16_16`.
#[must_use]
pub fn format_q16_16(value: Q16_16) -> String {
    format_raw(i128::from(value.raw()))
}

/// Canonical decimal form of a `Q48_16`.
#[must_use]
pub fn format_q48_16(value: Q48_16) -> String {
    format_raw(i128::from(value.raw()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_and_octal_prefixes_parse() {
        assert_eq!(parse_u32("k", "0x1F", 1).unwrap(), 31);
        assert_eq!(parse_u32("k", "017", 1).unwrap(), 15);
        assert_eq!(parse_u32("k", "17", 1).unwrap(), 17);
    }

    #[test]
    fn negative_integers_parse() {
        assert_eq!(parse_i32("k", "-42", 1).unwrap(), -42);
        assert_eq!(parse_i32("k", "-0x2A", 1).unwrap(), -42);
    }

    #[test]
    fn decimal_tie_rounds_to_the_nearest_even_quotient() {
        // 1/131072 = half of 1/65536: the pre-rounding quotient is 0
        // (even), so the tie stays at 0.
        assert_eq!(decimal_to_raw("k", "0.00000762939453125", 1).unwrap(), 0);
        // 3/131072: the pre-rounding quotient is 1 (odd), so the tie
        // rounds up to the nearest even value, 2.
        assert_eq!(decimal_to_raw("k", "0.00002288818359375", 1).unwrap(), 2);
    }

    #[test]
    fn q16_16_round_trips_through_its_own_formatter() {
        for raw in [0_i32, 1, -1, 65536, -65536, 12345, -54321, i32::MAX, i32::MIN] {
            let value = Q16_16::from_raw(raw);
            let text = format_q16_16(value);
            let reparsed = parse_q16_16("k", &text, 1).unwrap();
            assert_eq!(reparsed.raw(), raw, "round trip of {text} should preserve {raw}");
        }
    }

    #[test]
    fn q48_16_round_trips_through_its_own_formatter() {
        for raw in [0_i64, 1, -1, 1_000_000_000, -1_000_000_000] {
            let value = Q48_16::from_raw(raw);
            let text = format_q48_16(value);
            let reparsed = parse_q48_16("k", &text, 1).unwrap();
            assert_eq!(reparsed.raw(), raw);
        }
    }

    #[test]
    fn symbolic_names_hash_when_not_integers() {
        assert_eq!(parse_ref("alpha_side"), dominium_hash::h32("alpha_side"));
        assert_eq!(parse_ref("42"), 42);
    }

    #[test]
    fn malformed_value_is_reported_not_panicked() {
        assert!(parse_u32("k", "not_a_number", 3).is_err());
        assert!(parse_q16_16("k", "1.2.3", 3).is_err());
    }
}
