//! Wire protocol: primitives, identifiers, framing, registry, and messages.

pub mod codec;
pub mod cursor;
pub mod header;
pub mod identifier;
pub mod messages;
pub mod quantize;
pub mod registry;
pub mod sequence;

pub use codec::{decode_packet, encode_packet, read_frame_prefix, CodecError, FramePrefix, Packet};
pub use cursor::{LengthPrefix, ReadCursor, WriteCursor};
pub use header::{PacketFlags, PacketHeader};
pub use identifier::{peek_message_id, Frequency, MessageId};
pub use messages::{Message, MessageBody};
pub use registry::{default_registry, DecodeFn, MessageRegistry, RegistryBuilder};
pub use sequence::SequenceCounter;
