//! Hex text ↔ bytes for captured packets.
//!
//! Accepts the formats packet captures are usually pasted in: contiguous
//! digits (`4000000001...`), space- or colon-separated pairs
//! (`40 00 00 00` / `40:00:00:00`), and an optional leading `0x`.

use crate::error::InspectError;

/// Parses one packet written as hex.
///
/// `input` names the source in error messages (e.g. `"line 3"`).
///
/// # Errors
///
/// [`InspectError::InvalidHex`] for non-hex characters, an odd number of
/// digits, or no digits at all.
pub fn parse_hex(text: &str, input: &str) -> Result<Vec<u8>, InspectError> {
    let text = text.trim();
    let text = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);

    let mut digits = Vec::with_capacity(text.len());
    for (i, c) in text.char_indices() {
        if c.is_ascii_whitespace() || c == ':' {
            continue;
        }
        match c.to_digit(16) {
            Some(d) => digits.push(d as u8),
            None => {
                return Err(InspectError::InvalidHex {
                    input: input.to_string(),
                    reason: format!("unexpected character {c:?} at column {}", i + 1),
                })
            }
        }
    }

    if digits.is_empty() {
        return Err(InspectError::InvalidHex {
            input: input.to_string(),
            reason: "no hex digits".to_string(),
        });
    }
    if digits.len() % 2 != 0 {
        return Err(InspectError::InvalidHex {
            input: input.to_string(),
            reason: format!("odd number of hex digits ({})", digits.len()),
        });
    }

    Ok(digits.chunks_exact(2).map(|p| (p[0] << 4) | p[1]).collect())
}

/// Parses a capture file with one packet per line.
///
/// Blank lines and lines starting with `#` are skipped.  Returns
/// `(line number, bytes)` pairs, numbered from 1.
///
/// # Errors
///
/// The first [`InspectError::InvalidHex`] encountered.
pub fn parse_hex_lines(text: &str) -> Result<Vec<(usize, Vec<u8>)>, InspectError> {
    let mut frames = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let number = index + 1;
        frames.push((number, parse_hex(trimmed, &format!("line {number}"))?));
    }
    Ok(frames)
}

/// Lowercase hex without separators.
pub fn to_hex(bytes: &[u8]) -> String {
    use std::fmt::Write;

    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{b:02x}");
    }
    out
}
