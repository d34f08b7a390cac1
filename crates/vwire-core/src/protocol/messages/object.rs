//! Compact object motion updates.
//!
//! An [`ImprovedTerseObjectUpdateMessage`] carries one opaque `data` blob
//! per object.  [`TerseObjectData`] decodes and builds that blob: motion
//! fields are quantized to 16 bits over fixed ranges.
//!
//! ```text
//! local_id u32 | state u8 | is_avatar u8 | [collision_plane 16B, avatars only]
//! position 12B | velocity 3×u16 | acceleration 3×u16 | rotation 4×u16
//! angular_velocity 3×u16
//! ```

use serde::{Deserialize, Serialize};

use crate::domain::vector::{Quaternion, Vector3, Vector4};
use crate::protocol::codec::CodecError;
use crate::protocol::cursor::{count_len, LengthPrefix, ReadCursor, WriteCursor};
use crate::protocol::identifier::MessageId;
use crate::protocol::messages::MessageBody;
use crate::protocol::quantize::{float_to_u16, u16_to_float};

const VELOCITY_RANGE: f32 = 128.0;
const ACCELERATION_RANGE: f32 = 64.0;
const ROTATION_RANGE: f32 = 1.0;
const ANGULAR_VELOCITY_RANGE: f32 = 64.0;

/// One object entry of a terse update.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TerseObjectBlock {
    /// Packed [`TerseObjectData`].
    pub data: Vec<u8>,
    pub texture_entry: Vec<u8>,
}

/// ImprovedTerseObjectUpdate (High 15).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ImprovedTerseObjectUpdateMessage {
    pub region_handle: u64,
    /// Quantized over `[0, 1]`; see [`Self::time_dilation_f32`].
    pub time_dilation: u16,
    pub objects: Vec<TerseObjectBlock>,
}

impl ImprovedTerseObjectUpdateMessage {
    /// Simulator time dilation as a fraction of real time.
    pub fn time_dilation_f32(&self) -> f32 {
        u16_to_float(self.time_dilation, 0.0, 1.0)
    }
}

impl MessageBody for ImprovedTerseObjectUpdateMessage {
    const ID: MessageId = MessageId::high(15);
    const NAME: &'static str = "ImprovedTerseObjectUpdate";

    fn body_len(&self) -> Result<usize, CodecError> {
        let mut len = 8 + 2 + count_len("ImprovedTerseObjectUpdate.ObjectData", self.objects.len())?;
        for block in &self.objects {
            len += LengthPrefix::U8.encoded_len("ImprovedTerseObjectUpdate.Data", block.data.len())?;
            len += LengthPrefix::U16
                .encoded_len("ImprovedTerseObjectUpdate.TextureEntry", block.texture_entry.len())?;
        }
        Ok(len)
    }

    fn encode_body(&self, w: &mut WriteCursor<'_>) -> Result<(), CodecError> {
        w.write_u64(self.region_handle)?;
        w.write_u16(self.time_dilation)?;
        w.write_count("ImprovedTerseObjectUpdate.ObjectData", self.objects.len())?;
        for block in &self.objects {
            w.write_bytes("ImprovedTerseObjectUpdate.Data", &block.data, LengthPrefix::U8)?;
            w.write_bytes(
                "ImprovedTerseObjectUpdate.TextureEntry",
                &block.texture_entry,
                LengthPrefix::U16,
            )?;
        }
        Ok(())
    }

    fn decode_body(r: &mut ReadCursor<'_>) -> Result<Self, CodecError> {
        let region_handle = r.read_u64()?;
        let time_dilation = r.read_u16()?;
        let count = r.read_count()?;
        let mut objects = Vec::with_capacity(count);
        for _ in 0..count {
            objects.push(TerseObjectBlock {
                data: r.read_bytes(LengthPrefix::U8)?,
                texture_entry: r.read_bytes(LengthPrefix::U16)?,
            });
        }
        Ok(Self {
            region_handle,
            time_dilation,
            objects,
        })
    }
}

/// Decoded contents of a [`TerseObjectBlock::data`] blob.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TerseObjectData {
    pub local_id: u32,
    pub state: u8,
    /// Avatars only.
    pub collision_plane: Option<Vector4>,
    pub position: Vector3,
    pub velocity: Vector3,
    pub acceleration: Vector3,
    pub rotation: Quaternion,
    pub angular_velocity: Vector3,
}

impl TerseObjectData {
    /// Blob size for a non-avatar object.
    pub const PRIM_SIZE: usize = 44;
    /// Blob size for an avatar (adds the collision plane).
    pub const AVATAR_SIZE: usize = 60;

    pub fn is_avatar(&self) -> bool {
        self.collision_plane.is_some()
    }

    pub fn encoded_len(&self) -> usize {
        if self.is_avatar() {
            Self::AVATAR_SIZE
        } else {
            Self::PRIM_SIZE
        }
    }

    /// Decodes a terse data blob.
    ///
    /// # Errors
    ///
    /// [`CodecError::OutOfBounds`] if the blob is shorter than its avatar
    /// flag implies, [`CodecError::MalformedPayload`] if it is longer.
    pub fn parse(data: &[u8]) -> Result<Self, CodecError> {
        let mut r = ReadCursor::new(data);
        let local_id = r.read_u32()?;
        let state = r.read_u8()?;
        let is_avatar = r.read_bool()?;
        let collision_plane = if is_avatar {
            Some(r.read_vector4()?)
        } else {
            None
        };
        let position = r.read_vector3()?;
        let velocity = read_quantized_vector(&mut r, VELOCITY_RANGE)?;
        let acceleration = read_quantized_vector(&mut r, ACCELERATION_RANGE)?;
        let rotation = Quaternion::new(
            u16_to_float(r.read_u16()?, -ROTATION_RANGE, ROTATION_RANGE),
            u16_to_float(r.read_u16()?, -ROTATION_RANGE, ROTATION_RANGE),
            u16_to_float(r.read_u16()?, -ROTATION_RANGE, ROTATION_RANGE),
            u16_to_float(r.read_u16()?, -ROTATION_RANGE, ROTATION_RANGE),
        );
        let angular_velocity = read_quantized_vector(&mut r, ANGULAR_VELOCITY_RANGE)?;

        if r.remaining() != 0 {
            return Err(CodecError::MalformedPayload(format!(
                "terse object data has {} trailing bytes",
                r.remaining()
            )));
        }

        Ok(Self {
            local_id,
            state,
            collision_plane,
            position,
            velocity,
            acceleration,
            rotation,
            angular_velocity,
        })
    }

    /// Packs the blob, quantizing the motion fields.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        out.extend_from_slice(&self.local_id.to_le_bytes());
        out.push(self.state);
        out.push(u8::from(self.is_avatar()));
        if let Some(plane) = &self.collision_plane {
            for c in [plane.x, plane.y, plane.z, plane.w] {
                out.extend_from_slice(&c.to_le_bytes());
            }
        }
        for c in [self.position.x, self.position.y, self.position.z] {
            out.extend_from_slice(&c.to_le_bytes());
        }
        push_quantized_vector(&mut out, &self.velocity, VELOCITY_RANGE);
        push_quantized_vector(&mut out, &self.acceleration, ACCELERATION_RANGE);
        let q = &self.rotation;
        for c in [q.x, q.y, q.z, q.w] {
            out.extend_from_slice(&float_to_u16(c, -ROTATION_RANGE, ROTATION_RANGE).to_le_bytes());
        }
        push_quantized_vector(&mut out, &self.angular_velocity, ANGULAR_VELOCITY_RANGE);
        out
    }

    /// Wraps the packed blob in a block with an empty texture entry.
    pub fn to_block(&self) -> TerseObjectBlock {
        TerseObjectBlock {
            data: self.to_bytes(),
            texture_entry: Vec::new(),
        }
    }
}

fn read_quantized_vector(r: &mut ReadCursor<'_>, range: f32) -> Result<Vector3, CodecError> {
    Ok(Vector3::new(
        u16_to_float(r.read_u16()?, -range, range),
        u16_to_float(r.read_u16()?, -range, range),
        u16_to_float(r.read_u16()?, -range, range),
    ))
}

fn push_quantized_vector(out: &mut Vec<u8>, v: &Vector3, range: f32) {
    for c in [v.x, v.y, v.z] {
        out.extend_from_slice(&float_to_u16(c, -range, range).to_le_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::messages::tests::body_round_trip;

    fn close(a: f32, b: f32, range: f32) -> bool {
        (a - b).abs() <= 2.0 * range / f32::from(u16::MAX)
    }

    fn sample_prim() -> TerseObjectData {
        TerseObjectData {
            local_id: 0x0102_0304,
            state: 0,
            collision_plane: None,
            position: Vector3::new(128.0, 128.0, 25.5),
            velocity: Vector3::new(1.5, -2.25, 0.0),
            acceleration: Vector3::new(0.0, 0.0, -9.8),
            rotation: Quaternion::IDENTITY,
            angular_velocity: Vector3::ZERO,
        }
    }

    #[test]
    fn test_prim_blob_is_44_bytes_and_avatar_blob_is_60() {
        let prim = sample_prim();
        let avatar = TerseObjectData {
            collision_plane: Some(Vector4::new(0.0, 0.0, 1.0, -20.0)),
            ..sample_prim()
        };
        assert_eq!(prim.to_bytes().len(), TerseObjectData::PRIM_SIZE);
        assert_eq!(avatar.to_bytes().len(), TerseObjectData::AVATAR_SIZE);
        assert_eq!(avatar.to_bytes()[5], 1);
    }

    #[test]
    fn test_terse_data_round_trip_within_quantization_error() {
        // Arrange
        let original = TerseObjectData {
            collision_plane: Some(Vector4::new(0.0, 0.0, 1.0, -20.0)),
            ..sample_prim()
        };

        // Act
        let parsed = TerseObjectData::parse(&original.to_bytes()).unwrap();

        // Assert: unquantized fields are exact
        assert_eq!(parsed.local_id, original.local_id);
        assert_eq!(parsed.collision_plane, original.collision_plane);
        assert_eq!(parsed.position, original.position);
        assert!(close(parsed.velocity.x, 1.5, VELOCITY_RANGE));
        assert!(close(parsed.velocity.y, -2.25, VELOCITY_RANGE));
        assert_eq!(parsed.velocity.z, 0.0);
        assert!(close(parsed.acceleration.z, -9.8, ACCELERATION_RANGE));
        assert_eq!(parsed.rotation.x, 0.0);
        assert!(close(parsed.rotation.w, 1.0, ROTATION_RANGE));
        assert_eq!(parsed.angular_velocity, Vector3::ZERO);
    }

    #[test]
    fn test_truncated_terse_data_is_out_of_bounds() {
        let bytes = sample_prim().to_bytes();
        assert!(matches!(
            TerseObjectData::parse(&bytes[..40]),
            Err(CodecError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_terse_data_with_trailing_bytes_is_malformed() {
        let mut bytes = sample_prim().to_bytes();
        bytes.push(0);
        assert!(matches!(
            TerseObjectData::parse(&bytes),
            Err(CodecError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_terse_update_round_trip() {
        let msg = ImprovedTerseObjectUpdateMessage {
            region_handle: 0x0003_E800_0003_E900,
            time_dilation: u16::MAX,
            objects: vec![
                sample_prim().to_block(),
                TerseObjectBlock {
                    data: vec![1, 2, 3],
                    texture_entry: vec![9; 300],
                },
            ],
        };
        assert_eq!(msg.body_len().unwrap(), 11 + (1 + 44 + 2) + (1 + 3 + 2 + 300));
        assert_eq!(body_round_trip(&msg), msg);
        assert!((msg.time_dilation_f32() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_time_dilation_is_exact_zero() {
        let msg = ImprovedTerseObjectUpdateMessage::default();
        assert_eq!(msg.time_dilation_f32(), 0.0);
    }
}
