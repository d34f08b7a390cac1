//! Local chat in both directions.

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::domain::vector::Vector3;
use crate::protocol::codec::CodecError;
use crate::protocol::cursor::{LengthPrefix, ReadCursor, WriteCursor};
use crate::protocol::identifier::MessageId;
use crate::protocol::messages::MessageBody;

// ── Enumerated fields ─────────────────────────────────────────────────────────

/// Who produced a chat line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum ChatSourceType {
    System = 0,
    Agent = 1,
    Object = 2,
}

impl TryFrom<u8> for ChatSourceType {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ChatSourceType::System),
            1 => Ok(ChatSourceType::Agent),
            2 => Ok(ChatSourceType::Object),
            _ => Err(()),
        }
    }
}

/// Volume / kind of a chat line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum ChatType {
    Whisper = 0,
    Normal = 1,
    Shout = 2,
    StartTyping = 4,
    StopTyping = 5,
    Debug = 6,
    OwnerSay = 8,
}

impl TryFrom<u8> for ChatType {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ChatType::Whisper),
            1 => Ok(ChatType::Normal),
            2 => Ok(ChatType::Shout),
            4 => Ok(ChatType::StartTyping),
            5 => Ok(ChatType::StopTyping),
            6 => Ok(ChatType::Debug),
            8 => Ok(ChatType::OwnerSay),
            _ => Err(()),
        }
    }
}

/// How well the receiving agent can hear the speaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i8)]
pub enum ChatAudible {
    Not = -1,
    Barely = 0,
    Fully = 1,
}

impl TryFrom<i8> for ChatAudible {
    type Error = ();

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(ChatAudible::Not),
            0 => Ok(ChatAudible::Barely),
            1 => Ok(ChatAudible::Fully),
            _ => Err(()),
        }
    }
}

// ── ChatFromSimulator ─────────────────────────────────────────────────────────

/// ChatFromSimulator (Low 139): a chat line heard by this agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatFromSimulatorMessage {
    pub from_name: String,
    pub source_id: Uuid,
    pub owner_id: Uuid,
    pub source_type: ChatSourceType,
    pub chat_type: ChatType,
    pub audible: ChatAudible,
    /// Speaker position, region-local.
    pub position: Vector3,
    pub message: String,
}

impl MessageBody for ChatFromSimulatorMessage {
    const ID: MessageId = MessageId::low(139);
    const NAME: &'static str = "ChatFromSimulator";

    fn body_len(&self) -> Result<usize, CodecError> {
        Ok(LengthPrefix::U8.encoded_len("ChatFromSimulator.FromName", self.from_name.len())?
            + 16
            + 16
            + 1
            + 1
            + 1
            + 12
            + LengthPrefix::U16.encoded_len("ChatFromSimulator.Message", self.message.len())?)
    }

    fn encode_body(&self, w: &mut WriteCursor<'_>) -> Result<(), CodecError> {
        w.write_string("ChatFromSimulator.FromName", &self.from_name, LengthPrefix::U8)?;
        w.write_uuid(&self.source_id)?;
        w.write_uuid(&self.owner_id)?;
        w.write_u8(self.source_type as u8)?;
        w.write_u8(self.chat_type as u8)?;
        w.write_i8(self.audible as i8)?;
        w.write_vector3(&self.position)?;
        w.write_string("ChatFromSimulator.Message", &self.message, LengthPrefix::U16)
    }

    fn decode_body(r: &mut ReadCursor<'_>) -> Result<Self, CodecError> {
        let from_name = r.read_string(LengthPrefix::U8)?;
        let source_id = r.read_uuid()?;
        let owner_id = r.read_uuid()?;
        let raw = r.read_u8()?;
        let source_type = ChatSourceType::try_from(raw)
            .map_err(|_| CodecError::MalformedPayload(format!("unknown chat source type: {raw}")))?;
        let raw = r.read_u8()?;
        let chat_type = ChatType::try_from(raw)
            .map_err(|_| CodecError::MalformedPayload(format!("unknown chat type: {raw}")))?;
        let raw = r.read_i8()?;
        let audible = ChatAudible::try_from(raw)
            .map_err(|_| CodecError::MalformedPayload(format!("unknown audible level: {raw}")))?;
        let position = r.read_vector3()?;
        let message = r.read_string(LengthPrefix::U16)?;

        let msg = Self {
            from_name,
            source_id,
            owner_id,
            source_type,
            chat_type,
            audible,
            position,
            message,
        };
        debug!(
            from = %msg.from_name,
            source = %msg.source_id,
            owner = %msg.owner_id,
            source_type = ?msg.source_type,
            chat_type = ?msg.chat_type,
            audible = ?msg.audible,
            position = ?msg.position,
            text = %msg.message,
            "decoded ChatFromSimulator"
        );
        Ok(msg)
    }
}

// ── ChatFromViewer ────────────────────────────────────────────────────────────

/// ChatFromViewer (Low 80): a chat line sent by this agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatFromViewerMessage {
    pub agent_id: Uuid,
    pub session_id: Uuid,
    pub message: String,
    pub chat_type: ChatType,
    /// 0 is public chat; other channels are script-visible only.
    pub channel: i32,
}

impl MessageBody for ChatFromViewerMessage {
    const ID: MessageId = MessageId::low(80);
    const NAME: &'static str = "ChatFromViewer";

    fn body_len(&self) -> Result<usize, CodecError> {
        Ok(16 + 16
            + LengthPrefix::U16.encoded_len("ChatFromViewer.Message", self.message.len())?
            + 1
            + 4)
    }

    fn encode_body(&self, w: &mut WriteCursor<'_>) -> Result<(), CodecError> {
        w.write_uuid(&self.agent_id)?;
        w.write_uuid(&self.session_id)?;
        w.write_string("ChatFromViewer.Message", &self.message, LengthPrefix::U16)?;
        w.write_u8(self.chat_type as u8)?;
        w.write_i32(self.channel)
    }

    fn decode_body(r: &mut ReadCursor<'_>) -> Result<Self, CodecError> {
        let agent_id = r.read_uuid()?;
        let session_id = r.read_uuid()?;
        let message = r.read_string(LengthPrefix::U16)?;
        let raw = r.read_u8()?;
        let chat_type = ChatType::try_from(raw)
            .map_err(|_| CodecError::MalformedPayload(format!("unknown chat type: {raw}")))?;
        let channel = r.read_i32()?;
        Ok(Self {
            agent_id,
            session_id,
            message,
            chat_type,
            channel,
        })
    }
}
