//! Viewer-side visual effects (look-at targets, beams, pointing).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::vector::Color4;
use crate::protocol::codec::CodecError;
use crate::protocol::cursor::{count_len, LengthPrefix, ReadCursor, WriteCursor};
use crate::protocol::identifier::MessageId;
use crate::protocol::messages::MessageBody;

/// One effect in a [`ViewerEffectMessage`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewerEffectEntry {
    pub id: Uuid,
    pub agent_id: Uuid,
    pub effect_type: u8,
    /// Seconds.
    pub duration: f32,
    pub color: Color4,
    /// Effect-specific payload, opaque to the codec.
    pub type_data: Vec<u8>,
}

impl ViewerEffectEntry {
    fn encoded_len(&self) -> Result<usize, CodecError> {
        Ok(16 + 16 + 1 + 4 + 4
            + LengthPrefix::U8.encoded_len("ViewerEffect.TypeData", self.type_data.len())?)
    }
}

/// ViewerEffect (Medium 17).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewerEffectMessage {
    pub agent_id: Uuid,
    pub session_id: Uuid,
    pub effects: Vec<ViewerEffectEntry>,
}

impl MessageBody for ViewerEffectMessage {
    const ID: MessageId = MessageId::medium(17);
    const NAME: &'static str = "ViewerEffect";

    fn body_len(&self) -> Result<usize, CodecError> {
        let mut len = 16 + 16 + count_len("ViewerEffect.Effect", self.effects.len())?;
        for effect in &self.effects {
            len += effect.encoded_len()?;
        }
        Ok(len)
    }

    fn encode_body(&self, w: &mut WriteCursor<'_>) -> Result<(), CodecError> {
        w.write_uuid(&self.agent_id)?;
        w.write_uuid(&self.session_id)?;
        w.write_count("ViewerEffect.Effect", self.effects.len())?;
        for effect in &self.effects {
            w.write_uuid(&effect.id)?;
            w.write_uuid(&effect.agent_id)?;
            w.write_u8(effect.effect_type)?;
            w.write_f32(effect.duration)?;
            w.write_color(&effect.color)?;
            w.write_bytes("ViewerEffect.TypeData", &effect.type_data, LengthPrefix::U8)?;
        }
        Ok(())
    }

    fn decode_body(r: &mut ReadCursor<'_>) -> Result<Self, CodecError> {
        let agent_id = r.read_uuid()?;
        let session_id = r.read_uuid()?;
        let count = r.read_count()?;
        let mut effects = Vec::with_capacity(count);
        for _ in 0..count {
            effects.push(ViewerEffectEntry {
                id: r.read_uuid()?,
                agent_id: r.read_uuid()?,
                effect_type: r.read_u8()?,
                duration: r.read_f32()?,
                color: r.read_color()?,
                type_data: r.read_bytes(LengthPrefix::U8)?,
            });
        }
        Ok(Self {
            agent_id,
            session_id,
            effects,
        })
    }
}
