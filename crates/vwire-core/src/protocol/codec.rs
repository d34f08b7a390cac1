//! Packet framing: header, identifier prefix, and body.
//!
//! Wire format:
//! ```text
//! [flags:1][sequence:4 LE][extra_len:1][extra:extra_len][message id:1|2|4][body]
//! ```
//!
//! Encoding is two-phase.  [`Packet::serialized_len`] validates every
//! length constraint and returns the exact size; [`Packet::serialize`] then
//! refuses to start unless that many bytes fit, so a failed serialize
//! leaves the destination untouched.
//!
//! Decoding resolves the identifier through a [`MessageRegistry`] and runs
//! the concrete decoder inside the caller's window.  Anything after the
//! body (transport-appended acknowledgements, for instance) is left to the
//! caller: the returned byte count stops at the end of the body.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::protocol::cursor::{ReadCursor, WriteCursor};
use crate::protocol::header::{PacketFlags, PacketHeader};
use crate::protocol::identifier::{Frequency, MessageId};
use crate::protocol::messages::Message;
use crate::protocol::registry::MessageRegistry;

/// Errors that can occur during packet encoding or decoding.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CodecError {
    /// A read would pass the end of the window.
    #[error("out of bounds: need {needed} bytes, {available} available")]
    OutOfBounds { needed: usize, available: usize },

    /// The destination region cannot hold the encoded packet.
    #[error("buffer too small: need {needed} bytes, {available} available")]
    BufferTooSmall { needed: usize, available: usize },

    /// No decoder is registered for the identifier.
    #[error("unknown message: {id}")]
    UnknownMessage { id: MessageId },

    /// The number is outside the range its frequency class can carry.
    #[error("invalid {frequency} message number: {number}")]
    InvalidIdentifier { frequency: Frequency, number: u32 },

    /// A string, byte block, or the extra header exceeds its length prefix.
    #[error("field {field} is {len} bytes, at most {max} allowed")]
    FieldTooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    /// A repeated block has more entries than its count byte can express.
    #[error("block {field} has {count} entries, at most 255 allowed")]
    CountOverflow { field: &'static str, count: usize },

    /// A field value could not be interpreted (bad UTF-8, unknown enum value, ...).
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// The frame carries the zero-coded flag.
    #[error("zero-coded frames are not supported")]
    ZeroCodingUnsupported,

    /// A registry builder saw the same identifier twice.
    #[error("duplicate registration for {id}")]
    DuplicateRegistration { id: MessageId },
}

/// A header plus one typed message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Packet {
    pub header: PacketHeader,
    pub message: Message,
}

/// Header and identifier of a frame, decoded without touching the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramePrefix {
    pub header: PacketHeader,
    pub id: MessageId,
    /// Absolute index of the first body byte.
    pub body_offset: usize,
}

impl Packet {
    pub fn new(header: PacketHeader, message: impl Into<Message>) -> Self {
        Self {
            header,
            message: message.into(),
        }
    }

    /// Exact number of bytes [`serialize`](Self::serialize) writes.
    ///
    /// # Errors
    ///
    /// [`CodecError::FieldTooLong`], [`CodecError::CountOverflow`], or
    /// [`CodecError::InvalidIdentifier`] if the packet cannot be encoded.
    pub fn serialized_len(&self) -> Result<usize, CodecError> {
        let id = self.message.id();
        id.validate()?;
        Ok(self.header.encoded_len()? + id.prefix_len() + self.message.body_len()?)
    }

    /// Writes the packet into `buf[offset..limit]` and returns the number of
    /// bytes written.
    ///
    /// Nothing is written unless the whole packet fits.
    ///
    /// # Errors
    ///
    /// - [`CodecError::ZeroCodingUnsupported`] if the header asks for zero-coding.
    /// - [`CodecError::BufferTooSmall`] if the region is too small or lies
    ///   outside `buf`.
    /// - Any error from [`serialized_len`](Self::serialized_len).
    pub fn serialize(&self, buf: &mut [u8], offset: usize, limit: usize) -> Result<usize, CodecError> {
        if self.header.flags.is_zero_coded() {
            return Err(CodecError::ZeroCodingUnsupported);
        }
        let len = self.serialized_len()?;
        let mut w = WriteCursor::window(buf, offset, limit)?;
        if len > w.remaining() {
            return Err(CodecError::BufferTooSmall {
                needed: len,
                available: w.remaining(),
            });
        }

        self.header.encode(&mut w)?;
        w.write_message_id(self.message.id())?;
        self.message.encode_body(&mut w)?;

        debug_assert_eq!(w.position() - offset, len);
        Ok(len)
    }

    /// Decodes one packet from `buf[offset..offset + length]`.
    ///
    /// Returns the packet and the number of bytes consumed, counted from
    /// `offset`.
    ///
    /// # Errors
    ///
    /// - [`CodecError::OutOfBounds`] on truncation or a window outside `buf`.
    /// - [`CodecError::ZeroCodingUnsupported`] for zero-coded frames.
    /// - [`CodecError::InvalidIdentifier`] / [`CodecError::UnknownMessage`]
    ///   if the identifier cannot be resolved.
    /// - [`CodecError::MalformedPayload`] from the concrete decoder.
    pub fn deserialize(
        registry: &MessageRegistry,
        buf: &[u8],
        offset: usize,
        length: usize,
    ) -> Result<(Packet, usize), CodecError> {
        let mut r = window(buf, offset, length)?;
        let header = read_header(&mut r)?;
        let id = r.read_message_id()?;
        let message = registry.decode(id, &mut r)?;
        Ok((Packet { header, message }, r.position() - offset))
    }
}

/// Decodes the header and identifier of the frame in
/// `buf[offset..offset + length]`, leaving the body unread.
///
/// Lets callers route or log frames whose identifier is not registered.
///
/// # Errors
///
/// As [`Packet::deserialize`], minus the registry and body errors.
pub fn read_frame_prefix(buf: &[u8], offset: usize, length: usize) -> Result<FramePrefix, CodecError> {
    let mut r = window(buf, offset, length)?;
    let header = read_header(&mut r)?;
    let id = r.read_message_id()?;
    Ok(FramePrefix {
        header,
        id,
        body_offset: r.position(),
    })
}

/// Encodes `packet` into a freshly allocated, exactly-sized vector.
///
/// # Errors
///
/// As [`Packet::serialize`].
///
/// # Examples
///
/// ```rust
/// use vwire_core::protocol::{decode_packet, default_registry, encode_packet, Packet, PacketFlags, PacketHeader};
/// use vwire_core::protocol::messages::CompletePingCheckMessage;
///
/// let packet = Packet::new(
///     PacketHeader::new(PacketFlags::empty(), 7),
///     CompletePingCheckMessage { ping_id: 3 },
/// );
/// let bytes = encode_packet(&packet).unwrap();
/// let (decoded, n) = decode_packet(default_registry(), &bytes).unwrap();
/// assert_eq!(decoded, packet);
/// assert_eq!(n, bytes.len());
/// ```
pub fn encode_packet(packet: &Packet) -> Result<Vec<u8>, CodecError> {
    let len = packet.serialized_len()?;
    let mut buf = vec![0u8; len];
    packet.serialize(&mut buf, 0, len)?;
    Ok(buf)
}

/// Decodes one packet from the start of `bytes`.
///
/// # Errors
///
/// As [`Packet::deserialize`].
pub fn decode_packet(registry: &MessageRegistry, bytes: &[u8]) -> Result<(Packet, usize), CodecError> {
    Packet::deserialize(registry, bytes, 0, bytes.len())
}

fn window(buf: &[u8], offset: usize, length: usize) -> Result<ReadCursor<'_>, CodecError> {
    let limit = offset.checked_add(length).ok_or(CodecError::OutOfBounds {
        needed: usize::MAX,
        available: buf.len(),
    })?;
    ReadCursor::window(buf, offset, limit)
}

fn read_header(r: &mut ReadCursor<'_>) -> Result<PacketHeader, CodecError> {
    let header = PacketHeader::decode(r)?;
    if header.flags.0 & PacketFlags::ZERO_CODED != 0 {
        return Err(CodecError::ZeroCodingUnsupported);
    }
    Ok(header)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
