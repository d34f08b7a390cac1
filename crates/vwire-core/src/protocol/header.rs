//! Per-packet header: flags, sequence number, and the optional extra header.
//!
//! ```text
//! [flags:1][sequence:4 LE][extra_len:1][extra:extra_len]
//! ```
//!
//! The codec carries these fields for the transport layer and never
//! interprets them, with one exception: it refuses zero-coded frames (see
//! [`PacketFlags::ZERO_CODED`]).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::protocol::codec::CodecError;
use crate::protocol::cursor::{LengthPrefix, ReadCursor, WriteCursor};

/// Size of the header when the extra block is empty.
pub const MIN_HEADER_SIZE: usize = 6;

/// Largest extra header the one-byte length field can describe.
pub const MAX_EXTRA_HEADER: usize = u8::MAX as usize;

/// Packet flag bits.
///
/// Bit layout (one byte):
/// - Bit 7: body is zero-coded (run-length compressed zeros)
/// - Bit 6: sender wants a reliable delivery acknowledgement
/// - Bit 5: this is a retransmission
/// - Bit 4: acknowledgements are requested / appended by the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub struct PacketFlags(pub u8);

impl PacketFlags {
    pub const ZERO_CODED: u8 = 0x80;
    pub const RELIABLE: u8 = 0x40;
    pub const RESENT: u8 = 0x20;
    pub const ACK_REQUEST: u8 = 0x10;

    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn is_zero_coded(&self) -> bool {
        self.0 & Self::ZERO_CODED != 0
    }

    pub fn is_reliable(&self) -> bool {
        self.0 & Self::RELIABLE != 0
    }

    pub fn is_resent(&self) -> bool {
        self.0 & Self::RESENT != 0
    }

    pub fn wants_ack(&self) -> bool {
        self.0 & Self::ACK_REQUEST != 0
    }

    /// Returns a copy with `bits` set.
    #[must_use]
    pub const fn with(self, bits: u8) -> Self {
        Self(self.0 | bits)
    }
}

impl fmt::Display for PacketFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = Vec::new();
        if self.is_zero_coded() {
            names.push("ZEROCODED");
        }
        if self.is_reliable() {
            names.push("RELIABLE");
        }
        if self.is_resent() {
            names.push("RESENT");
        }
        if self.wants_ack() {
            names.push("ACK");
        }
        if names.is_empty() {
            f.write_str("-")
        } else {
            f.write_str(&names.join("|"))
        }
    }
}

/// Header fields carried by every packet.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PacketHeader {
    pub flags: PacketFlags,
    /// Sender-assigned counter; opaque to the codec.
    pub sequence: u32,
    /// Opaque bytes placed between the header and the message identifier.
    pub extra: Vec<u8>,
}

impl PacketHeader {
    pub fn new(flags: PacketFlags, sequence: u32) -> Self {
        Self {
            flags,
            sequence,
            extra: Vec::new(),
        }
    }

    /// Encoded size of the header.
    ///
    /// # Errors
    ///
    /// [`CodecError::FieldTooLong`] if the extra block exceeds 255 bytes.
    pub fn encoded_len(&self) -> Result<usize, CodecError> {
        if self.extra.len() > MAX_EXTRA_HEADER {
            return Err(CodecError::FieldTooLong {
                field: "extra_header",
                len: self.extra.len(),
                max: MAX_EXTRA_HEADER,
            });
        }
        Ok(MIN_HEADER_SIZE + self.extra.len())
    }

    pub(crate) fn encode(&self, w: &mut WriteCursor<'_>) -> Result<(), CodecError> {
        w.write_u8(self.flags.0)?;
        w.write_u32(self.sequence)?;
        w.write_bytes("extra_header", &self.extra, LengthPrefix::U8)
    }

    pub(crate) fn decode(r: &mut ReadCursor<'_>) -> Result<Self, CodecError> {
        let flags = PacketFlags(r.read_u8()?);
        let sequence = r.read_u32()?;
        let extra = r.read_bytes(LengthPrefix::U8)?;
        Ok(Self {
            flags,
            sequence,
            extra,
        })
    }
}
