//! # vwire-core
//!
//! Message codec for a virtual-world UDP protocol.
//!
//! The crate turns typed messages into the exact byte layout the protocol
//! expects and back again.  It owns no sockets and no retransmission
//! logic: a transport hands it `(bytes, offset, length)` on the way in and
//! a destination region on the way out.
//!
//! - **`protocol`**: bounded cursors and wire primitives, quantized
//!   floats, variable-width message identifiers, packet framing, the
//!   identifier → decoder registry, and the concrete message types.
//! - **`domain`**: the small vector and colour value types that appear
//!   inside message bodies.
//!
//! ```rust
//! use vwire_core::{decode_packet, default_registry, encode_packet, Message, Packet, PacketHeader};
//! use vwire_core::protocol::messages::StartPingCheckMessage;
//!
//! let packet = Packet::new(
//!     PacketHeader::default(),
//!     StartPingCheckMessage { ping_id: 1, oldest_unacked: 0 },
//! );
//! let bytes = encode_packet(&packet).unwrap();
//! let (decoded, _) = decode_packet(default_registry(), &bytes).unwrap();
//! assert!(matches!(decoded.message, Message::StartPingCheck(_)));
//! ```

pub mod domain;
pub mod protocol;

pub use domain::vector::{Color4, Quaternion, Vector3, Vector3d, Vector4};
pub use protocol::codec::{decode_packet, encode_packet, CodecError, Packet};
pub use protocol::header::{PacketFlags, PacketHeader};
pub use protocol::identifier::{Frequency, MessageId};
pub use protocol::messages::{Message, MessageBody};
pub use protocol::registry::{default_registry, MessageRegistry, RegistryBuilder};
