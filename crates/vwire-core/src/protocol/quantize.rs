//! Fixed-point encoding of bounded floats into 8 or 16 bits.
//!
//! A quantized field maps the integer range `0..=MAX` linearly onto
//! `lower..=upper`.  Decoding snaps any result within one quantization step
//! of zero to exactly `0.0`, so the integer that stands for "no offset"
//! comes back as a true zero rather than a tiny residue.

/// Decodes an 8-bit quantized value into `lower..=upper`.
pub fn u8_to_float(value: u8, lower: f32, upper: f32) -> f32 {
    dequantize(f32::from(value), f32::from(u8::MAX), lower, upper)
}

/// Decodes a 16-bit quantized value into `lower..=upper`.
pub fn u16_to_float(value: u16, lower: f32, upper: f32) -> f32 {
    dequantize(f32::from(value), f32::from(u16::MAX), lower, upper)
}

/// Encodes `value` as 8 bits; inputs outside the range are clamped.
pub fn float_to_u8(value: f32, lower: f32, upper: f32) -> u8 {
    quantize(value, f32::from(u8::MAX), lower, upper) as u8
}

/// Encodes `value` as 16 bits; inputs outside the range are clamped.
pub fn float_to_u16(value: f32, lower: f32, upper: f32) -> u16 {
    quantize(value, f32::from(u16::MAX), lower, upper) as u16
}

fn dequantize(value: f32, max: f32, lower: f32, upper: f32) -> f32 {
    let delta = upper - lower;
    let mut val = value * (1.0 / max);
    val = val * delta + lower;

    // one quantization step
    let error = delta / max;
    if val.abs() < error {
        val = 0.0;
    }
    val
}

fn quantize(value: f32, max: f32, lower: f32, upper: f32) -> f32 {
    let delta = upper - lower;
    if delta <= 0.0 || value.is_nan() {
        return 0.0;
    }
    let clamped = value.clamp(lower, upper);
    ((clamped - lower) * (max / delta)).round().clamp(0.0, max)
}
