//! Bounded cursors and the wire primitives read and written through them.
//!
//! All multi-byte integers and floats are little-endian.  Strings and byte
//! blocks carry a 1- or 2-byte length prefix whose width is fixed by the
//! message definition, not by the data, so the encoder and decoder for a
//! field must agree on it out of band (see [`LengthPrefix`]).
//!
//! # Bounds
//!
//! A cursor owns a `(buffer, position, limit)` triple.  `limit` is an
//! absolute index into the buffer and every access checks against it, so a
//! length field that claims more data than the window holds fails with
//! [`CodecError::OutOfBounds`] instead of reading past the frame.  Failed
//! operations leave the position where it was.

use uuid::Uuid;

use crate::domain::vector::{Color4, Quaternion, Vector3, Vector3d, Vector4};
use crate::protocol::codec::CodecError;

/// Maximum number of entries in a count-prefixed repeated block.
pub const MAX_BLOCK_COUNT: usize = u8::MAX as usize;

/// Width of the length field in front of a variable-length string or block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthPrefix {
    /// One length byte, at most 255 bytes of data.
    U8,
    /// Two length bytes (little-endian), at most 65 535 bytes of data.
    U16,
}

impl LengthPrefix {
    /// Size of the length field itself.
    pub const fn width(self) -> usize {
        match self {
            LengthPrefix::U8 => 1,
            LengthPrefix::U16 => 2,
        }
    }

    /// Largest data length the prefix can describe.
    pub const fn max_len(self) -> usize {
        match self {
            LengthPrefix::U8 => u8::MAX as usize,
            LengthPrefix::U16 => u16::MAX as usize,
        }
    }

    /// On-wire size of a field of `len` data bytes, prefix included.
    ///
    /// # Errors
    ///
    /// [`CodecError::FieldTooLong`] if `len` does not fit the prefix.
    pub fn encoded_len(self, field: &'static str, len: usize) -> Result<usize, CodecError> {
        if len > self.max_len() {
            return Err(CodecError::FieldTooLong {
                field,
                len,
                max: self.max_len(),
            });
        }
        Ok(self.width() + len)
    }
}

/// Checks a repeated-block count and returns the size of its count byte.
///
/// # Errors
///
/// [`CodecError::CountOverflow`] for more than [`MAX_BLOCK_COUNT`] entries.
pub fn count_len(field: &'static str, count: usize) -> Result<usize, CodecError> {
    if count > MAX_BLOCK_COUNT {
        return Err(CodecError::CountOverflow { field, count });
    }
    Ok(1)
}

// ── Read cursor ───────────────────────────────────────────────────────────────

/// Sequential reader over `buf[position..limit]`.
#[derive(Debug, Clone)]
pub struct ReadCursor<'a> {
    buf: &'a [u8],
    position: usize,
    limit: usize,
}

impl<'a> ReadCursor<'a> {
    /// Reads the whole of `buf`.
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            position: 0,
            limit: buf.len(),
        }
    }

    /// Reads `buf[offset..limit]`.
    ///
    /// # Errors
    ///
    /// [`CodecError::OutOfBounds`] if the window does not lie inside `buf`.
    pub fn window(buf: &'a [u8], offset: usize, limit: usize) -> Result<Self, CodecError> {
        if limit > buf.len() {
            return Err(CodecError::OutOfBounds {
                needed: limit,
                available: buf.len(),
            });
        }
        if offset > limit {
            return Err(CodecError::OutOfBounds {
                needed: offset,
                available: limit,
            });
        }
        Ok(Self {
            buf,
            position: offset,
            limit,
        })
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Bytes left before the limit.
    pub fn remaining(&self) -> usize {
        self.limit - self.position
    }

    /// The unread part of the window.
    pub fn rest(&self) -> &'a [u8] {
        &self.buf[self.position..self.limit]
    }

    fn ensure(&self, n: usize) -> Result<(), CodecError> {
        if n > self.remaining() {
            Err(CodecError::OutOfBounds {
                needed: n,
                available: self.remaining(),
            })
        } else {
            Ok(())
        }
    }

    /// Returns the next `n` bytes and advances past them.
    ///
    /// # Errors
    ///
    /// [`CodecError::OutOfBounds`] if fewer than `n` bytes remain.
    pub fn take(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        self.ensure(n)?;
        let start = self.position;
        self.position += n;
        Ok(&self.buf[start..start + n])
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    /// Advances `n` bytes without interpreting them.
    ///
    /// # Errors
    ///
    /// [`CodecError::OutOfBounds`] if fewer than `n` bytes remain.
    pub fn skip(&mut self, n: usize) -> Result<(), CodecError> {
        self.take(n).map(|_| ())
    }

    /// Looks at the byte `at` positions ahead without advancing.
    ///
    /// # Errors
    ///
    /// [`CodecError::OutOfBounds`] if that byte lies beyond the limit.
    pub fn peek_u8(&self, at: usize) -> Result<u8, CodecError> {
        self.ensure(at + 1)?;
        Ok(self.buf[self.position + at])
    }

    pub fn read_u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.take_array::<1>()?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8, CodecError> {
        Ok(self.read_u8()? as i8)
    }

    /// Any non-zero byte is `true`.
    pub fn read_bool(&mut self) -> Result<bool, CodecError> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_u16(&mut self) -> Result<u16, CodecError> {
        self.take_array().map(u16::from_le_bytes)
    }

    pub fn read_i16(&mut self) -> Result<i16, CodecError> {
        self.take_array().map(i16::from_le_bytes)
    }

    pub fn read_u32(&mut self) -> Result<u32, CodecError> {
        self.take_array().map(u32::from_le_bytes)
    }

    pub fn read_i32(&mut self) -> Result<i32, CodecError> {
        self.take_array().map(i32::from_le_bytes)
    }

    pub fn read_u64(&mut self) -> Result<u64, CodecError> {
        self.take_array().map(u64::from_le_bytes)
    }

    pub fn read_i64(&mut self) -> Result<i64, CodecError> {
        self.take_array().map(i64::from_le_bytes)
    }

    pub fn read_f32(&mut self) -> Result<f32, CodecError> {
        self.take_array().map(f32::from_le_bytes)
    }

    pub fn read_f64(&mut self) -> Result<f64, CodecError> {
        self.take_array().map(f64::from_le_bytes)
    }

    /// Reads a raw 16-byte UUID.
    pub fn read_uuid(&mut self) -> Result<Uuid, CodecError> {
        self.take_array().map(Uuid::from_bytes)
    }

    pub fn read_vector3(&mut self) -> Result<Vector3, CodecError> {
        self.ensure(12)?;
        Ok(Vector3 {
            x: self.read_f32()?,
            y: self.read_f32()?,
            z: self.read_f32()?,
        })
    }

    pub fn read_vector3d(&mut self) -> Result<Vector3d, CodecError> {
        self.ensure(24)?;
        Ok(Vector3d {
            x: self.read_f64()?,
            y: self.read_f64()?,
            z: self.read_f64()?,
        })
    }

    pub fn read_vector4(&mut self) -> Result<Vector4, CodecError> {
        self.ensure(16)?;
        Ok(Vector4 {
            x: self.read_f32()?,
            y: self.read_f32()?,
            z: self.read_f32()?,
            w: self.read_f32()?,
        })
    }

    pub fn read_quaternion(&mut self) -> Result<Quaternion, CodecError> {
        let v = self.read_vector4()?;
        Ok(Quaternion::new(v.x, v.y, v.z, v.w))
    }

    pub fn read_color(&mut self) -> Result<Color4, CodecError> {
        let [r, g, b, a] = self.take_array()?;
        Ok(Color4 { r, g, b, a })
    }

    /// Reads a length-prefixed byte block.
    ///
    /// # Errors
    ///
    /// [`CodecError::OutOfBounds`] if the prefix or the declared data runs
    /// past the limit.  The cursor does not move in that case.
    pub fn read_bytes(&mut self, prefix: LengthPrefix) -> Result<Vec<u8>, CodecError> {
        let start = self.position;
        let len = match prefix {
            LengthPrefix::U8 => usize::from(self.read_u8()?),
            LengthPrefix::U16 => usize::from(self.read_u16()?),
        };
        match self.take(len) {
            Ok(data) => Ok(data.to_vec()),
            Err(e) => {
                self.position = start;
                Err(e)
            }
        }
    }

    /// Reads a length-prefixed UTF-8 string.
    ///
    /// # Errors
    ///
    /// As [`ReadCursor::read_bytes`], plus [`CodecError::MalformedPayload`]
    /// for invalid UTF-8.
    pub fn read_string(&mut self, prefix: LengthPrefix) -> Result<String, CodecError> {
        let start = self.position;
        let bytes = self.read_bytes(prefix)?;
        String::from_utf8(bytes).map_err(|e| {
            self.position = start;
            CodecError::MalformedPayload(format!("invalid UTF-8 in string field: {e}"))
        })
    }

    /// Reads the count byte of a repeated block.
    pub fn read_count(&mut self) -> Result<usize, CodecError> {
        self.read_u8().map(usize::from)
    }
}

// ── Write cursor ──────────────────────────────────────────────────────────────

/// Sequential writer into `buf[position..limit]`.
#[derive(Debug)]
pub struct WriteCursor<'a> {
    buf: &'a mut [u8],
    position: usize,
    limit: usize,
}

impl<'a> WriteCursor<'a> {
    /// Writes into the whole of `buf`.
    pub fn new(buf: &'a mut [u8]) -> Self {
        let limit = buf.len();
        Self {
            buf,
            position: 0,
            limit,
        }
    }

    /// Writes into `buf[offset..limit]`.
    ///
    /// # Errors
    ///
    /// [`CodecError::BufferTooSmall`] if the window does not lie inside `buf`.
    pub fn window(buf: &'a mut [u8], offset: usize, limit: usize) -> Result<Self, CodecError> {
        if limit > buf.len() || offset > limit {
            return Err(CodecError::BufferTooSmall {
                needed: limit.max(offset),
                available: buf.len(),
            });
        }
        Ok(Self {
            buf,
            position: offset,
            limit,
        })
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Bytes left before the limit.
    pub fn remaining(&self) -> usize {
        self.limit - self.position
    }

    /// Copies `bytes` verbatim.
    ///
    /// # Errors
    ///
    /// [`CodecError::BufferTooSmall`] if they do not fit; nothing is written.
    pub fn write_fixed(&mut self, bytes: &[u8]) -> Result<(), CodecError> {
        if bytes.len() > self.remaining() {
            return Err(CodecError::BufferTooSmall {
                needed: bytes.len(),
                available: self.remaining(),
            });
        }
        let end = self.position + bytes.len();
        self.buf[self.position..end].copy_from_slice(bytes);
        self.position = end;
        Ok(())
    }

    pub fn write_u8(&mut self, v: u8) -> Result<(), CodecError> {
        self.write_fixed(&[v])
    }

    pub fn write_i8(&mut self, v: i8) -> Result<(), CodecError> {
        self.write_fixed(&v.to_le_bytes())
    }

    pub fn write_bool(&mut self, v: bool) -> Result<(), CodecError> {
        self.write_u8(u8::from(v))
    }

    pub fn write_u16(&mut self, v: u16) -> Result<(), CodecError> {
        self.write_fixed(&v.to_le_bytes())
    }

    pub fn write_i16(&mut self, v: i16) -> Result<(), CodecError> {
        self.write_fixed(&v.to_le_bytes())
    }

    pub fn write_u32(&mut self, v: u32) -> Result<(), CodecError> {
        self.write_fixed(&v.to_le_bytes())
    }

    pub fn write_i32(&mut self, v: i32) -> Result<(), CodecError> {
        self.write_fixed(&v.to_le_bytes())
    }

    pub fn write_u64(&mut self, v: u64) -> Result<(), CodecError> {
        self.write_fixed(&v.to_le_bytes())
    }

    pub fn write_i64(&mut self, v: i64) -> Result<(), CodecError> {
        self.write_fixed(&v.to_le_bytes())
    }

    pub fn write_f32(&mut self, v: f32) -> Result<(), CodecError> {
        self.write_fixed(&v.to_le_bytes())
    }

    pub fn write_f64(&mut self, v: f64) -> Result<(), CodecError> {
        self.write_fixed(&v.to_le_bytes())
    }

    pub fn write_uuid(&mut self, v: &Uuid) -> Result<(), CodecError> {
        self.write_fixed(v.as_bytes())
    }

    pub fn write_vector3(&mut self, v: &Vector3) -> Result<(), CodecError> {
        let mut raw = [0u8; 12];
        raw[0..4].copy_from_slice(&v.x.to_le_bytes());
        raw[4..8].copy_from_slice(&v.y.to_le_bytes());
        raw[8..12].copy_from_slice(&v.z.to_le_bytes());
        self.write_fixed(&raw)
    }

    pub fn write_vector3d(&mut self, v: &Vector3d) -> Result<(), CodecError> {
        let mut raw = [0u8; 24];
        raw[0..8].copy_from_slice(&v.x.to_le_bytes());
        raw[8..16].copy_from_slice(&v.y.to_le_bytes());
        raw[16..24].copy_from_slice(&v.z.to_le_bytes());
        self.write_fixed(&raw)
    }

    pub fn write_vector4(&mut self, v: &Vector4) -> Result<(), CodecError> {
        let mut raw = [0u8; 16];
        raw[0..4].copy_from_slice(&v.x.to_le_bytes());
        raw[4..8].copy_from_slice(&v.y.to_le_bytes());
        raw[8..12].copy_from_slice(&v.z.to_le_bytes());
        raw[12..16].copy_from_slice(&v.w.to_le_bytes());
        self.write_fixed(&raw)
    }

    pub fn write_quaternion(&mut self, q: &Quaternion) -> Result<(), CodecError> {
        self.write_vector4(&Vector4::new(q.x, q.y, q.z, q.w))
    }

    pub fn write_color(&mut self, c: &Color4) -> Result<(), CodecError> {
        self.write_fixed(&[c.r, c.g, c.b, c.a])
    }

    /// Writes a length-prefixed byte block.
    ///
    /// # Errors
    ///
    /// [`CodecError::FieldTooLong`] if `data` does not fit `prefix`, or
    /// [`CodecError::BufferTooSmall`].  Nothing is written on error.
    pub fn write_bytes(
        &mut self,
        field: &'static str,
        data: &[u8],
        prefix: LengthPrefix,
    ) -> Result<(), CodecError> {
        let total = prefix.encoded_len(field, data.len())?;
        if total > self.remaining() {
            return Err(CodecError::BufferTooSmall {
                needed: total,
                available: self.remaining(),
            });
        }
        match prefix {
            LengthPrefix::U8 => self.write_u8(data.len() as u8)?,
            LengthPrefix::U16 => self.write_u16(data.len() as u16)?,
        }
        self.write_fixed(data)
    }

    /// Writes a length-prefixed UTF-8 string.
    ///
    /// # Errors
    ///
    /// As [`WriteCursor::write_bytes`].
    pub fn write_string(
        &mut self,
        field: &'static str,
        s: &str,
        prefix: LengthPrefix,
    ) -> Result<(), CodecError> {
        self.write_bytes(field, s.as_bytes(), prefix)
    }

    /// Writes the count byte of a repeated block.
    ///
    /// # Errors
    ///
    /// [`CodecError::CountOverflow`] above [`MAX_BLOCK_COUNT`].
    pub fn write_count(&mut self, field: &'static str, count: usize) -> Result<(), CodecError> {
        count_len(field, count)?;
        self.write_u8(count as u8)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integers_are_little_endian() {
        // Arrange
        let mut buf = [0u8; 14];
        let mut w = WriteCursor::new(&mut buf);

        // Act
        w.write_u16(0x0102).unwrap();
        w.write_u32(0x0304_0506).unwrap();
        w.write_u64(0x0708_090A_0B0C_0D0E).unwrap();

        // Assert
        assert_eq!(
            buf,
            [0x02, 0x01, 0x06, 0x05, 0x04, 0x03, 0x0E, 0x0D, 0x0C, 0x0B, 0x0A, 0x09, 0x08, 0x07]
        );
    }

    #[test]
    fn test_signed_and_float_values_round_trip() {
        let mut buf = [0u8; 1 + 2 + 4 + 8 + 4 + 8];
        let mut w = WriteCursor::new(&mut buf);
        w.write_i8(-5).unwrap();
        w.write_i16(-300).unwrap();
        w.write_i32(-70_000).unwrap();
        w.write_i64(i64::MIN).unwrap();
        w.write_f32(-1.5).unwrap();
        w.write_f64(std::f64::consts::PI).unwrap();
        assert_eq!(w.remaining(), 0);

        let mut r = ReadCursor::new(&buf);
        assert_eq!(r.read_i8().unwrap(), -5);
        assert_eq!(r.read_i16().unwrap(), -300);
        assert_eq!(r.read_i32().unwrap(), -70_000);
        assert_eq!(r.read_i64().unwrap(), i64::MIN);
        assert_eq!(r.read_f32().unwrap(), -1.5);
        assert_eq!(r.read_f64().unwrap(), std::f64::consts::PI);
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn test_uuid_is_sixteen_raw_bytes() {
        let id = Uuid::from_bytes([7u8; 16]);
        let mut buf = [0u8; 16];
        WriteCursor::new(&mut buf).write_uuid(&id).unwrap();
        assert_eq!(buf, [7u8; 16]);
        assert_eq!(ReadCursor::new(&buf).read_uuid().unwrap(), id);
    }

    #[test]
    fn test_vectors_and_color_round_trip() {
        let v3 = Vector3::new(1.0, -2.0, 3.5);
        let v3d = Vector3d::new(256_000.25, 512_000.5, 21.0);
        let q = Quaternion::new(0.0, 0.0, 0.7071, 0.7071);
        let c = Color4::new(255, 128, 0, 64);

        let mut buf = [0u8; 12 + 24 + 16 + 4];
        let mut w = WriteCursor::new(&mut buf);
        w.write_vector3(&v3).unwrap();
        w.write_vector3d(&v3d).unwrap();
        w.write_quaternion(&q).unwrap();
        w.write_color(&c).unwrap();

        let mut r = ReadCursor::new(&buf);
        assert_eq!(r.read_vector3().unwrap(), v3);
        assert_eq!(r.read_vector3d().unwrap(), v3d);
        assert_eq!(r.read_quaternion().unwrap(), q);
        assert_eq!(r.read_color().unwrap(), c);
    }

    #[test]
    fn test_nan_is_carried_unchanged() {
        let mut buf = [0u8; 12];
        WriteCursor::new(&mut buf)
            .write_vector3(&Vector3::new(f32::NAN, f32::INFINITY, 0.0))
            .unwrap();
        let v = ReadCursor::new(&buf).read_vector3().unwrap();
        assert!(v.x.is_nan());
        assert_eq!(v.y, f32::INFINITY);
    }

    #[test]
    fn test_string_with_one_byte_prefix() {
        let mut buf = [0u8; 6];
        WriteCursor::new(&mut buf)
            .write_string("name", "Alice", LengthPrefix::U8)
            .unwrap();
        assert_eq!(buf, [5, b'A', b'l', b'i', b'c', b'e']);
        assert_eq!(
            ReadCursor::new(&buf).read_string(LengthPrefix::U8).unwrap(),
            "Alice"
        );
    }

    #[test]
    fn test_string_with_two_byte_prefix() {
        let mut buf = [0u8; 4];
        WriteCursor::new(&mut buf)
            .write_string("text", "hi", LengthPrefix::U16)
            .unwrap();
        assert_eq!(buf, [2, 0, b'h', b'i']);
    }

    #[test]
    fn test_empty_string_is_just_the_prefix() {
        let mut buf = [0xEEu8; 2];
        WriteCursor::new(&mut buf)
            .write_string("text", "", LengthPrefix::U16)
            .unwrap();
        assert_eq!(buf, [0, 0]);
        assert_eq!(ReadCursor::new(&buf).read_string(LengthPrefix::U16).unwrap(), "");
    }

    #[test]
    fn test_string_too_long_for_prefix_is_rejected() {
        let long = "x".repeat(256);
        let mut buf = vec![0u8; 300];
        let mut w = WriteCursor::new(&mut buf);
        let result = w.write_string("name", &long, LengthPrefix::U8);
        assert_eq!(
            result,
            Err(CodecError::FieldTooLong { field: "name", len: 256, max: 255 })
        );
        assert_eq!(w.position(), 0);
    }

    #[test]
    fn test_declared_length_past_limit_is_out_of_bounds() {
        // Arrange: prefix claims 10 bytes, only 3 follow
        let buf = [10u8, b'a', b'b', b'c'];
        let mut r = ReadCursor::new(&buf);

        // Act
        let result = r.read_string(LengthPrefix::U8);

        // Assert
        assert!(matches!(result, Err(CodecError::OutOfBounds { needed: 10, available: 3 })));
        assert_eq!(r.position(), 0, "failed read must not move the cursor");
    }

    #[test]
    fn test_window_limit_is_respected_even_if_buffer_is_longer() {
        let buf = [1u8, 2, 3, 4, 5, 6, 7, 8];
        let mut r = ReadCursor::window(&buf, 2, 5).unwrap();
        assert_eq!(r.read_u16().unwrap(), u16::from_le_bytes([3, 4]));
        assert!(matches!(r.read_u16(), Err(CodecError::OutOfBounds { .. })));
        assert_eq!(r.read_u8().unwrap(), 5);
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn test_window_outside_buffer_is_rejected() {
        let buf = [0u8; 4];
        assert!(ReadCursor::window(&buf, 0, 5).is_err());
        assert!(ReadCursor::window(&buf, 3, 2).is_err());
    }

    #[test]
    fn test_invalid_utf8_is_malformed() {
        let buf = [2u8, 0xC3, 0x28];
        let mut r = ReadCursor::new(&buf);
        assert!(matches!(
            r.read_string(LengthPrefix::U8),
            Err(CodecError::MalformedPayload(_))
        ));
        assert_eq!(r.position(), 0);
    }

    #[test]
    fn test_write_past_limit_is_buffer_too_small() {
        let mut buf = [0u8; 3];
        let mut w = WriteCursor::new(&mut buf);
        assert_eq!(
            w.write_u32(1),
            Err(CodecError::BufferTooSmall { needed: 4, available: 3 })
        );
        assert_eq!(buf, [0, 0, 0]);
    }

    #[test]
    fn test_count_above_255_overflows() {
        assert_eq!(count_len("Blocks", 255), Ok(1));
        assert_eq!(
            count_len("Blocks", 256),
            Err(CodecError::CountOverflow { field: "Blocks", count: 256 })
        );
    }

    #[test]
    fn test_bool_reads_any_nonzero_as_true() {
        let buf = [0u8, 1, 7];
        let mut r = ReadCursor::new(&buf);
        assert!(!r.read_bool().unwrap());
        assert!(r.read_bool().unwrap());
        assert!(r.read_bool().unwrap());
    }
}
