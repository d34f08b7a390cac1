//! Variable-width message identifiers.
//!
//! Every message body starts with an identifier whose width depends on the
//! message's declared *frequency class*.  Frequently sent messages get the
//! shortest prefix:
//!
//! ```text
//! High    [n]                      n in 0x01..=0xFE
//! Medium  [0xFF][n]                n in 0x01..=0xFE
//! Low     [0xFF][0xFF][lo][hi]     n in 0x0001..=0xFFFF, lo != 0xFF
//! Fixed   [0xFF][0xFF][0xFF][xx]   n in 0xFFFFFF00..=0xFFFFFFFF, big-endian
//! ```
//!
//! The decoder needs no prior knowledge of the message type: the escape
//! bytes alone tell it which class follows.  That only works because no
//! High or Medium number is `0xFF`, no Low number has `0xFF` in its first
//! wire byte, and Fixed identifiers are written most-significant byte first
//! so their `FF FF FF` lead-in comes before the distinguishing byte.
//!
//! Numbers are unique *within* a class only; `High 15` and `Medium 15` are
//! different messages.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::protocol::codec::CodecError;
use crate::protocol::cursor::{ReadCursor, WriteCursor};

/// Escape byte that introduces a Medium, Low, or Fixed identifier.
pub const ESCAPE: u8 = 0xFF;

/// Lowest valid Fixed identifier.
pub const FIXED_BASE: u32 = 0xFFFF_FF00;

/// Frequency class of a message type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Frequency {
    High,
    Medium,
    Low,
    Fixed,
}

impl Frequency {
    /// Width in bytes of the identifier prefix for this class.
    pub const fn prefix_len(self) -> usize {
        match self {
            Frequency::High => 1,
            Frequency::Medium => 2,
            Frequency::Low | Frequency::Fixed => 4,
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Frequency::High => "High",
            Frequency::Medium => "Medium",
            Frequency::Low => "Low",
            Frequency::Fixed => "Fixed",
        };
        f.write_str(name)
    }
}

/// A message identity: frequency class plus number within that class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageId {
    pub frequency: Frequency,
    pub number: u32,
}

impl MessageId {
    pub const fn high(number: u8) -> Self {
        Self { frequency: Frequency::High, number: number as u32 }
    }

    pub const fn medium(number: u8) -> Self {
        Self { frequency: Frequency::Medium, number: number as u32 }
    }

    pub const fn low(number: u16) -> Self {
        Self { frequency: Frequency::Low, number: number as u32 }
    }

    pub const fn fixed(number: u32) -> Self {
        Self { frequency: Frequency::Fixed, number }
    }

    /// Builds an identifier, rejecting numbers outside the class range.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::InvalidIdentifier`] when `number` cannot be
    /// represented unambiguously in `frequency`'s prefix.
    pub fn new(frequency: Frequency, number: u32) -> Result<Self, CodecError> {
        let id = Self { frequency, number };
        id.validate()?;
        Ok(id)
    }

    /// Width in bytes of this identifier on the wire.
    pub const fn prefix_len(&self) -> usize {
        self.frequency.prefix_len()
    }

    /// Checks that the number fits its class without colliding with an
    /// escape pattern.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::InvalidIdentifier`] for out-of-range numbers.
    pub fn validate(&self) -> Result<(), CodecError> {
        let n = self.number;
        let ok = match self.frequency {
            Frequency::High | Frequency::Medium => (0x01..=0xFE).contains(&n),
            Frequency::Low => (0x0001..=0xFFFF).contains(&n) && (n & 0xFF) != 0xFF,
            Frequency::Fixed => n >= FIXED_BASE,
        };
        if ok {
            Ok(())
        } else {
            Err(CodecError::InvalidIdentifier {
                frequency: self.frequency,
                number: n,
            })
        }
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.frequency {
            Frequency::Fixed => write!(f, "Fixed 0x{:08X}", self.number),
            freq => write!(f, "{freq} {}", self.number),
        }
    }
}

// ── Cursor integration ────────────────────────────────────────────────────────

impl WriteCursor<'_> {
    /// Validates `id` and writes its prefix.
    ///
    /// # Errors
    ///
    /// [`CodecError::InvalidIdentifier`] or [`CodecError::BufferTooSmall`].
    pub fn write_message_id(&mut self, id: MessageId) -> Result<(), CodecError> {
        id.validate()?;
        match id.frequency {
            Frequency::High => self.write_u8(id.number as u8),
            Frequency::Medium => self.write_fixed(&[ESCAPE, id.number as u8]),
            Frequency::Low => {
                let [lo, hi] = (id.number as u16).to_le_bytes();
                self.write_fixed(&[ESCAPE, ESCAPE, lo, hi])
            }
            Frequency::Fixed => self.write_fixed(&id.number.to_be_bytes()),
        }
    }
}

impl ReadCursor<'_> {
    /// Decodes an identifier prefix, advancing past it.
    ///
    /// The cursor only moves if the whole prefix is present and valid.
    ///
    /// # Errors
    ///
    /// [`CodecError::OutOfBounds`] if the prefix is truncated,
    /// [`CodecError::InvalidIdentifier`] if it decodes to a number no
    /// conforming sender could produce.
    pub fn read_message_id(&mut self) -> Result<MessageId, CodecError> {
        let id = self.peek_message_id()?;
        self.skip(id.prefix_len())?;
        Ok(id)
    }

    /// Decodes an identifier prefix without advancing.
    ///
    /// # Errors
    ///
    /// Same as [`ReadCursor::read_message_id`].
    pub fn peek_message_id(&self) -> Result<MessageId, CodecError> {
        let b0 = self.peek_u8(0)?;
        if b0 != ESCAPE {
            return MessageId::new(Frequency::High, u32::from(b0));
        }
        let b1 = self.peek_u8(1)?;
        if b1 != ESCAPE {
            return MessageId::new(Frequency::Medium, u32::from(b1));
        }
        let b2 = self.peek_u8(2)?;
        let b3 = self.peek_u8(3)?;
        if b2 != ESCAPE {
            return MessageId::new(Frequency::Low, u32::from(u16::from_le_bytes([b2, b3])));
        }
        Ok(MessageId::fixed(u32::from_be_bytes([b0, b1, b2, b3])))
    }
}

/// Decodes the identifier at `offset` in `buf[..limit]` without consuming it.
///
/// Returns the identifier and its prefix width.
///
/// # Errors
///
/// See [`ReadCursor::peek_message_id`].
pub fn peek_message_id(buf: &[u8], offset: usize, limit: usize) -> Result<(MessageId, usize), CodecError> {
    let cursor = ReadCursor::window(buf, offset, limit)?;
    let id = cursor.peek_message_id()?;
    Ok((id, id.prefix_len()))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(id: MessageId) -> Vec<u8> {
        let mut buf = vec![0u8; 4];
        let mut w = WriteCursor::new(&mut buf);
        w.write_message_id(id).expect("encode id");
        let n = w.position();
        buf.truncate(n);
        buf
    }

    fn decode(bytes: &[u8]) -> Result<MessageId, CodecError> {
        let mut r = ReadCursor::new(bytes);
        let id = r.read_message_id()?;
        assert_eq!(r.position(), id.prefix_len());
        Ok(id)
    }

    #[test]
    fn test_high_identifier_is_single_byte() {
        assert_eq!(encode(MessageId::high(29)), vec![29]);
    }

    #[test]
    fn test_medium_identifier_has_one_escape_byte() {
        assert_eq!(encode(MessageId::medium(15)), vec![0xFF, 15]);
    }

    #[test]
    fn test_low_identifier_is_little_endian_after_two_escapes() {
        assert_eq!(encode(MessageId::low(0x0194)), vec![0xFF, 0xFF, 0x94, 0x01]);
    }

    #[test]
    fn test_fixed_identifier_is_most_significant_first() {
        assert_eq!(
            encode(MessageId::fixed(0xFFFF_FFFB)),
            vec![0xFF, 0xFF, 0xFF, 0xFB]
        );
    }

    #[test]
    fn test_every_valid_high_and_medium_identifier_round_trips() {
        for n in 0x01..=0xFEu8 {
            for id in [MessageId::high(n), MessageId::medium(n)] {
                assert_eq!(decode(&encode(id)).unwrap(), id);
            }
        }
    }

    #[test]
    fn test_every_valid_low_identifier_round_trips() {
        for n in 1..=u16::MAX {
            let id = MessageId::low(n);
            if id.validate().is_err() {
                continue;
            }
            assert_eq!(decode(&encode(id)).unwrap(), id);
        }
    }

    #[test]
    fn test_every_fixed_identifier_round_trips() {
        for low in 0x00..=0xFFu32 {
            let id = MessageId::fixed(FIXED_BASE | low);
            assert_eq!(decode(&encode(id)).unwrap(), id);
        }
    }

    #[test]
    fn test_no_high_identifier_collides_with_escape_byte() {
        for n in 0..=u8::MAX {
            let id = MessageId::high(n);
            if id.validate().is_ok() {
                assert_ne!(encode(id)[0], ESCAPE);
            }
        }
        assert!(MessageId::high(0xFF).validate().is_err());
    }

    #[test]
    fn test_same_number_in_different_classes_are_distinct() {
        let high = decode(&encode(MessageId::high(15))).unwrap();
        let medium = decode(&encode(MessageId::medium(15))).unwrap();
        assert_ne!(high, medium);
        assert_eq!(high.number, medium.number);
    }

    #[test]
    fn test_invalid_numbers_are_rejected() {
        assert!(MessageId::new(Frequency::High, 0).is_err());
        assert!(MessageId::new(Frequency::High, 0x1FF).is_err());
        assert!(MessageId::new(Frequency::Medium, 0xFF).is_err());
        assert!(MessageId::new(Frequency::Low, 0).is_err());
        assert!(MessageId::new(Frequency::Low, 0x01FF).is_err());
        assert!(MessageId::new(Frequency::Low, 0x1_0000).is_err());
        assert!(MessageId::new(Frequency::Fixed, 0xFFFE_FFFF).is_err());
    }

    #[test]
    fn test_encoding_invalid_identifier_writes_nothing() {
        let mut buf = [0xAAu8; 4];
        let mut w = WriteCursor::new(&mut buf);
        let result = w.write_message_id(MessageId::high(0));
        assert!(matches!(result, Err(CodecError::InvalidIdentifier { .. })));
        assert_eq!(w.position(), 0);
        assert_eq!(buf, [0xAA; 4]);
    }

    #[test]
    fn test_truncated_prefix_is_out_of_bounds() {
        for bytes in [&[][..], &[0xFF][..], &[0xFF, 0xFF][..], &[0xFF, 0xFF, 0x10][..]] {
            let result = decode(bytes);
            assert!(
                matches!(result, Err(CodecError::OutOfBounds { .. })),
                "prefix {bytes:02X?} should be truncated, got {result:?}"
            );
        }
    }

    #[test]
    fn test_zero_high_byte_is_invalid_on_decode() {
        assert!(matches!(
            decode(&[0x00]),
            Err(CodecError::InvalidIdentifier { frequency: Frequency::High, number: 0 })
        ));
    }

    #[test]
    fn test_peek_does_not_consume() {
        let bytes = [0xFF, 0x11, 0x22];
        let r = ReadCursor::new(&bytes);
        assert_eq!(r.peek_message_id().unwrap(), MessageId::medium(0x11));
        assert_eq!(r.position(), 0);

        let (id, width) = peek_message_id(&bytes, 0, bytes.len()).unwrap();
        assert_eq!(id, MessageId::medium(0x11));
        assert_eq!(width, 2);
    }

    #[test]
    fn test_display_formats_fixed_in_hex() {
        assert_eq!(MessageId::fixed(0xFFFF_FFFB).to_string(), "Fixed 0xFFFFFFFB");
        assert_eq!(MessageId::low(139).to_string(), "Low 139");
    }
}
