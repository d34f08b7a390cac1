//! Sound playback messages.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::vector::Vector3;
use crate::protocol::codec::CodecError;
use crate::protocol::cursor::{count_len, ReadCursor, WriteCursor};
use crate::protocol::identifier::MessageId;
use crate::protocol::messages::MessageBody;

/// SoundTrigger (High 29): play a one-shot sound at a position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoundTriggerMessage {
    pub sound_id: Uuid,
    pub owner_id: Uuid,
    pub object_id: Uuid,
    pub parent_id: Uuid,
    /// Region the position is relative to.
    pub handle: u64,
    pub position: Vector3,
    pub gain: f32,
}

impl MessageBody for SoundTriggerMessage {
    const ID: MessageId = MessageId::high(29);
    const NAME: &'static str = "SoundTrigger";

    fn body_len(&self) -> Result<usize, CodecError> {
        Ok(4 * 16 + 8 + 12 + 4)
    }

    fn encode_body(&self, w: &mut WriteCursor<'_>) -> Result<(), CodecError> {
        w.write_uuid(&self.sound_id)?;
        w.write_uuid(&self.owner_id)?;
        w.write_uuid(&self.object_id)?;
        w.write_uuid(&self.parent_id)?;
        w.write_u64(self.handle)?;
        w.write_vector3(&self.position)?;
        w.write_f32(self.gain)
    }

    fn decode_body(r: &mut ReadCursor<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            sound_id: r.read_uuid()?,
            owner_id: r.read_uuid()?,
            object_id: r.read_uuid()?,
            parent_id: r.read_uuid()?,
            handle: r.read_u64()?,
            position: r.read_vector3()?,
            gain: r.read_f32()?,
        })
    }
}

/// AttachedSound (Medium 13): loop a sound on an object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttachedSoundMessage {
    pub sound_id: Uuid,
    pub object_id: Uuid,
    pub owner_id: Uuid,
    pub gain: f32,
    pub flags: u8,
}

impl MessageBody for AttachedSoundMessage {
    const ID: MessageId = MessageId::medium(13);
    const NAME: &'static str = "AttachedSound";

    fn body_len(&self) -> Result<usize, CodecError> {
        Ok(3 * 16 + 4 + 1)
    }

    fn encode_body(&self, w: &mut WriteCursor<'_>) -> Result<(), CodecError> {
        w.write_uuid(&self.sound_id)?;
        w.write_uuid(&self.object_id)?;
        w.write_uuid(&self.owner_id)?;
        w.write_f32(self.gain)?;
        w.write_u8(self.flags)
    }

    fn decode_body(r: &mut ReadCursor<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            sound_id: r.read_uuid()?,
            object_id: r.read_uuid()?,
            owner_id: r.read_uuid()?,
            gain: r.read_f32()?,
            flags: r.read_u8()?,
        })
    }
}

/// One sound asset the viewer should fetch ahead of playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreloadSoundEntry {
    pub object_id: Uuid,
    pub owner_id: Uuid,
    pub sound_id: Uuid,
}

impl PreloadSoundEntry {
    pub const WIRE_SIZE: usize = 48;
}

/// PreloadSound (Medium 15): a batch of sounds to prefetch.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PreloadSoundMessage {
    pub entries: Vec<PreloadSoundEntry>,
}

impl MessageBody for PreloadSoundMessage {
    const ID: MessageId = MessageId::medium(15);
    const NAME: &'static str = "PreloadSound";

    fn body_len(&self) -> Result<usize, CodecError> {
        Ok(count_len("PreloadSound.DataBlock", self.entries.len())?
            + self.entries.len() * PreloadSoundEntry::WIRE_SIZE)
    }

    fn encode_body(&self, w: &mut WriteCursor<'_>) -> Result<(), CodecError> {
        w.write_count("PreloadSound.DataBlock", self.entries.len())?;
        for entry in &self.entries {
            w.write_uuid(&entry.object_id)?;
            w.write_uuid(&entry.owner_id)?;
            w.write_uuid(&entry.sound_id)?;
        }
        Ok(())
    }

    fn decode_body(r: &mut ReadCursor<'_>) -> Result<Self, CodecError> {
        let count = r.read_count()?;
        let mut entries = Vec::with_capacity(count);
        for _ in 0..count {
            entries.push(PreloadSoundEntry {
                object_id: r.read_uuid()?,
                owner_id: r.read_uuid()?,
                sound_id: r.read_uuid()?,
            });
        }
        Ok(Self { entries })
    }
}
