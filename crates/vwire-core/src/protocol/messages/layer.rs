//! Terrain, water, wind and cloud patch data.

use serde::{Deserialize, Serialize};

use crate::protocol::codec::CodecError;
use crate::protocol::cursor::{LengthPrefix, ReadCursor, WriteCursor};
use crate::protocol::identifier::MessageId;
use crate::protocol::messages::MessageBody;

/// Which layer a [`LayerDataMessage`] patch belongs to.
///
/// Values are the ASCII letters/digits the simulator uses on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum LayerType {
    Land = 0x4C,
    LandExtended = 0x4D,
    Water = 0x57,
    WaterExtended = 0x58,
    Wind = 0x37,
    WindExtended = 0x39,
    Cloud = 0x38,
    CloudExtended = 0x3A,
}

impl TryFrom<u8> for LayerType {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x4C => Ok(LayerType::Land),
            0x4D => Ok(LayerType::LandExtended),
            0x57 => Ok(LayerType::Water),
            0x58 => Ok(LayerType::WaterExtended),
            0x37 => Ok(LayerType::Wind),
            0x39 => Ok(LayerType::WindExtended),
            0x38 => Ok(LayerType::Cloud),
            0x3A => Ok(LayerType::CloudExtended),
            _ => Err(()),
        }
    }
}

/// LayerData (High 11): one compressed patch group.
///
/// The patch bitstream is carried opaque.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerDataMessage {
    pub layer_type: LayerType,
    pub data: Vec<u8>,
}

impl MessageBody for LayerDataMessage {
    const ID: MessageId = MessageId::high(11);
    const NAME: &'static str = "LayerData";

    fn body_len(&self) -> Result<usize, CodecError> {
        Ok(1 + LengthPrefix::U16.encoded_len("LayerData.Data", self.data.len())?)
    }

    fn encode_body(&self, w: &mut WriteCursor<'_>) -> Result<(), CodecError> {
        w.write_u8(self.layer_type as u8)?;
        w.write_bytes("LayerData.Data", &self.data, LengthPrefix::U16)
    }

    fn decode_body(r: &mut ReadCursor<'_>) -> Result<Self, CodecError> {
        let raw = r.read_u8()?;
        let layer_type = LayerType::try_from(raw)
            .map_err(|_| CodecError::MalformedPayload(format!("unknown layer type: 0x{raw:02X}")))?;
        Ok(Self {
            layer_type,
            data: r.read_bytes(LengthPrefix::U16)?,
        })
    }
}
