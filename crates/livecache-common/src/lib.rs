//! Common numeric decoding for livecache records
//!
//! The cache service sends every number as text: amounts as base-10 strings
//! and token ids as hex strings of arbitrary width. Both decoders here are
//! total. A malformed amount decodes to zero, a malformed token id decodes to
//! `None`, so "no token" stays distinguishable from "token 0".

use num_bigint::{BigInt, BigUint};

/// Signed arbitrary-precision balance amount.
pub type Amount = BigInt;

/// Unsigned arbitrary-precision token identifier (e.g. a 256-bit NFT id).
pub type TokenId = BigUint;

// ===== Amount decoding =====

/// Decode a base-10 amount, falling back to zero on malformed input.
pub fn decode_amount(text: &str) -> Amount {
    parse_decimal(text).unwrap_or_default()
}

/// Same as [`decode_amount`], treating a missing field as malformed.
pub fn decode_amount_field(text: Option<&str>) -> Amount {
    text.map(decode_amount).unwrap_or_default()
}

fn parse_decimal(text: &str) -> Option<Amount> {
    let trimmed = text.trim();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    // num-bigint accepts `_` separators, the cache format does not
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let magnitude = BigInt::from(BigUint::parse_bytes(digits.as_bytes(), 10)?);
    Some(if negative { -magnitude } else { magnitude })
}

// ===== Token id decoding =====

/// Decode a hex token id, with or without a `0x` prefix.
///
/// Returns `None` when the text is not hex, never zero. No digits at all
/// (`""`, a bare `0x`) reads as token zero; only a missing field is absent.
pub fn decode_token_id(text: &str) -> Option<TokenId> {
    let trimmed = text.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    if digits.is_empty() {
        return Some(TokenId::default());
    }
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }

    BigUint::parse_bytes(digits.as_bytes(), 16)
}

/// Same as [`decode_token_id`], treating a missing field as malformed.
pub fn decode_token_id_field(text: Option<&str>) -> Option<TokenId> {
    text.and_then(decode_token_id)
}

/// Render a token id the way the cache expects it in query parameters.
pub fn format_token_id(token: &TokenId) -> String {
    format!("{token:#x}")
}
