//! Region handshake exchanged when an agent enters a region.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::protocol::codec::CodecError;
use crate::protocol::cursor::{LengthPrefix, ReadCursor, WriteCursor};
use crate::protocol::identifier::MessageId;
use crate::protocol::messages::MessageBody;

/// Number of terrain texture layers described by a handshake.
pub const TERRAIN_LAYERS: usize = 4;

/// RegionHandshake (Low 148): region description sent by the simulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionHandshakeMessage {
    pub region_flags: u32,
    pub sim_access: u8,
    pub sim_name: String,
    pub sim_owner: Uuid,
    pub is_estate_manager: bool,
    pub water_height: f32,
    pub billable_factor: f32,
    pub cache_id: Uuid,
    pub terrain_base: [Uuid; TERRAIN_LAYERS],
    pub terrain_detail: [Uuid; TERRAIN_LAYERS],
    /// Per-corner terrain start heights (SW, NW, SE, NE).
    pub terrain_start_height: [f32; TERRAIN_LAYERS],
    pub terrain_height_range: [f32; TERRAIN_LAYERS],
    pub region_id: Uuid,
    pub cpu_class_id: i32,
    pub cpu_ratio: i32,
    pub colo_name: String,
    pub product_sku: String,
    pub product_name: String,
}

impl Default for RegionHandshakeMessage {
    fn default() -> Self {
        Self {
            region_flags: 0,
            sim_access: 0,
            sim_name: String::new(),
            sim_owner: Uuid::nil(),
            is_estate_manager: false,
            water_height: 0.0,
            billable_factor: 0.0,
            cache_id: Uuid::nil(),
            terrain_base: [Uuid::nil(); TERRAIN_LAYERS],
            terrain_detail: [Uuid::nil(); TERRAIN_LAYERS],
            terrain_start_height: [0.0; TERRAIN_LAYERS],
            terrain_height_range: [0.0; TERRAIN_LAYERS],
            region_id: Uuid::nil(),
            cpu_class_id: 0,
            cpu_ratio: 0,
            colo_name: String::new(),
            product_sku: String::new(),
            product_name: String::new(),
        }
    }
}

impl MessageBody for RegionHandshakeMessage {
    const ID: MessageId = MessageId::low(148);
    const NAME: &'static str = "RegionHandshake";

    fn body_len(&self) -> Result<usize, CodecError> {
        let fixed = 4 + 1 + 16 + 1 + 4 + 4 + 16
            + TERRAIN_LAYERS * (16 + 16 + 4 + 4)
            + 16
            + 4
            + 4;
        Ok(fixed
            + LengthPrefix::U8.encoded_len("RegionHandshake.SimName", self.sim_name.len())?
            + LengthPrefix::U8.encoded_len("RegionHandshake.ColoName", self.colo_name.len())?
            + LengthPrefix::U8.encoded_len("RegionHandshake.ProductSKU", self.product_sku.len())?
            + LengthPrefix::U8
                .encoded_len("RegionHandshake.ProductName", self.product_name.len())?)
    }

    fn encode_body(&self, w: &mut WriteCursor<'_>) -> Result<(), CodecError> {
        w.write_u32(self.region_flags)?;
        w.write_u8(self.sim_access)?;
        w.write_string("RegionHandshake.SimName", &self.sim_name, LengthPrefix::U8)?;
        w.write_uuid(&self.sim_owner)?;
        w.write_bool(self.is_estate_manager)?;
        w.write_f32(self.water_height)?;
        w.write_f32(self.billable_factor)?;
        w.write_uuid(&self.cache_id)?;
        for id in self.terrain_base.iter().chain(&self.terrain_detail) {
            w.write_uuid(id)?;
        }
        for h in self.terrain_start_height.iter().chain(&self.terrain_height_range) {
            w.write_f32(*h)?;
        }
        w.write_uuid(&self.region_id)?;
        w.write_i32(self.cpu_class_id)?;
        w.write_i32(self.cpu_ratio)?;
        w.write_string("RegionHandshake.ColoName", &self.colo_name, LengthPrefix::U8)?;
        w.write_string("RegionHandshake.ProductSKU", &self.product_sku, LengthPrefix::U8)?;
        w.write_string("RegionHandshake.ProductName", &self.product_name, LengthPrefix::U8)
    }

    fn decode_body(r: &mut ReadCursor<'_>) -> Result<Self, CodecError> {
        let region_flags = r.read_u32()?;
        let sim_access = r.read_u8()?;
        let sim_name = r.read_string(LengthPrefix::U8)?;
        let sim_owner = r.read_uuid()?;
        let is_estate_manager = r.read_bool()?;
        let water_height = r.read_f32()?;
        let billable_factor = r.read_f32()?;
        let cache_id = r.read_uuid()?;

        let mut terrain_base = [Uuid::nil(); TERRAIN_LAYERS];
        for id in &mut terrain_base {
            *id = r.read_uuid()?;
        }
        let mut terrain_detail = [Uuid::nil(); TERRAIN_LAYERS];
        for id in &mut terrain_detail {
            *id = r.read_uuid()?;
        }
        let mut terrain_start_height = [0.0f32; TERRAIN_LAYERS];
        for h in &mut terrain_start_height {
            *h = r.read_f32()?;
        }
        let mut terrain_height_range = [0.0f32; TERRAIN_LAYERS];
        for h in &mut terrain_height_range {
            *h = r.read_f32()?;
        }

        Ok(Self {
            region_flags,
            sim_access,
            sim_name,
            sim_owner,
            is_estate_manager,
            water_height,
            billable_factor,
            cache_id,
            terrain_base,
            terrain_detail,
            terrain_start_height,
            terrain_height_range,
            region_id: r.read_uuid()?,
            cpu_class_id: r.read_i32()?,
            cpu_ratio: r.read_i32()?,
            colo_name: r.read_string(LengthPrefix::U8)?,
            product_sku: r.read_string(LengthPrefix::U8)?,
            product_name: r.read_string(LengthPrefix::U8)?,
        })
    }
}

/// RegionHandshakeReply (Low 149): the viewer's acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionHandshakeReplyMessage {
    pub agent_id: Uuid,
    pub session_id: Uuid,
    pub flags: u32,
}

impl MessageBody for RegionHandshakeReplyMessage {
    const ID: MessageId = MessageId::low(149);
    const NAME: &'static str = "RegionHandshakeReply";

    fn body_len(&self) -> Result<usize, CodecError> {
        Ok(16 + 16 + 4)
    }

    fn encode_body(&self, w: &mut WriteCursor<'_>) -> Result<(), CodecError> {
        w.write_uuid(&self.agent_id)?;
        w.write_uuid(&self.session_id)?;
        w.write_u32(self.flags)
    }

    fn decode_body(r: &mut ReadCursor<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            agent_id: r.read_uuid()?,
            session_id: r.read_uuid()?,
            flags: r.read_u32()?,
        })
    }
}
