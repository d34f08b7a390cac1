//! Value types shared by the codec and its callers.
//!
//! Nothing in here knows about byte layouts; the wire representation of each
//! type lives in [`crate::protocol::cursor`].

pub mod vector;

pub use vector::{Color4, Quaternion, Vector3, Vector3d, Vector4};
