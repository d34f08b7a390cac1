//! Circuit-control messages: pings, acknowledgements, open/close.
//!
//! The transport layer owns what these messages *mean*; this module only
//! owns their byte layout.

use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

use crate::protocol::codec::CodecError;
use crate::protocol::cursor::{count_len, ReadCursor, WriteCursor};
use crate::protocol::identifier::MessageId;
use crate::protocol::messages::MessageBody;

/// StartPingCheck (High 1): latency probe from either end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartPingCheckMessage {
    pub ping_id: u8,
    /// Oldest sequence number the sender is still waiting to have acked.
    pub oldest_unacked: u32,
}

impl MessageBody for StartPingCheckMessage {
    const ID: MessageId = MessageId::high(1);
    const NAME: &'static str = "StartPingCheck";

    fn body_len(&self) -> Result<usize, CodecError> {
        Ok(1 + 4)
    }

    fn encode_body(&self, w: &mut WriteCursor<'_>) -> Result<(), CodecError> {
        w.write_u8(self.ping_id)?;
        w.write_u32(self.oldest_unacked)
    }

    fn decode_body(r: &mut ReadCursor<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            ping_id: r.read_u8()?,
            oldest_unacked: r.read_u32()?,
        })
    }
}

/// CompletePingCheck (High 2): echoes the ping id back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletePingCheckMessage {
    pub ping_id: u8,
}

impl MessageBody for CompletePingCheckMessage {
    const ID: MessageId = MessageId::high(2);
    const NAME: &'static str = "CompletePingCheck";

    fn body_len(&self) -> Result<usize, CodecError> {
        Ok(1)
    }

    fn encode_body(&self, w: &mut WriteCursor<'_>) -> Result<(), CodecError> {
        w.write_u8(self.ping_id)
    }

    fn decode_body(r: &mut ReadCursor<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            ping_id: r.read_u8()?,
        })
    }
}

/// PacketAck (Fixed 0xFFFFFFFB): explicit acknowledgement of reliable packets.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PacketAckMessage {
    /// Sequence numbers being acknowledged.
    pub packets: Vec<u32>,
}

impl MessageBody for PacketAckMessage {
    const ID: MessageId = MessageId::fixed(0xFFFF_FFFB);
    const NAME: &'static str = "PacketAck";

    fn body_len(&self) -> Result<usize, CodecError> {
        Ok(count_len("PacketAck.Packets", self.packets.len())? + 4 * self.packets.len())
    }

    fn encode_body(&self, w: &mut WriteCursor<'_>) -> Result<(), CodecError> {
        w.write_count("PacketAck.Packets", self.packets.len())?;
        for id in &self.packets {
            w.write_u32(*id)?;
        }
        Ok(())
    }

    fn decode_body(r: &mut ReadCursor<'_>) -> Result<Self, CodecError> {
        let count = r.read_count()?;
        let mut packets = Vec::with_capacity(count);
        for _ in 0..count {
            packets.push(r.read_u32()?);
        }
        Ok(Self { packets })
    }
}

/// OpenCircuit (Fixed 0xFFFFFFFC): announces the endpoint a circuit binds to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenCircuitMessage {
    pub ip: Ipv4Addr,
    pub port: u16,
}

impl MessageBody for OpenCircuitMessage {
    const ID: MessageId = MessageId::fixed(0xFFFF_FFFC);
    const NAME: &'static str = "OpenCircuit";

    fn body_len(&self) -> Result<usize, CodecError> {
        Ok(4 + 2)
    }

    fn encode_body(&self, w: &mut WriteCursor<'_>) -> Result<(), CodecError> {
        // octets in network order, as they appear in the address
        w.write_fixed(&self.ip.octets())?;
        w.write_u16(self.port)
    }

    fn decode_body(r: &mut ReadCursor<'_>) -> Result<Self, CodecError> {
        let octets = r.take(4)?;
        let ip = Ipv4Addr::new(octets[0], octets[1], octets[2], octets[3]);
        Ok(Self {
            ip,
            port: r.read_u16()?,
        })
    }
}

/// CloseCircuit (Fixed 0xFFFFFFFD): empty body.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CloseCircuitMessage;

impl MessageBody for CloseCircuitMessage {
    const ID: MessageId = MessageId::fixed(0xFFFF_FFFD);
    const NAME: &'static str = "CloseCircuit";

    fn body_len(&self) -> Result<usize, CodecError> {
        Ok(0)
    }

    fn encode_body(&self, _w: &mut WriteCursor<'_>) -> Result<(), CodecError> {
        Ok(())
    }

    fn decode_body(_r: &mut ReadCursor<'_>) -> Result<Self, CodecError> {
        Ok(Self)
    }
}
