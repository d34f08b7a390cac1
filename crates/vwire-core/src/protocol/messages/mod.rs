//! Concrete message types and the [`Message`] enum that unifies them.
//!
//! Each concrete type implements [`MessageBody`], which ties it to its
//! identifier and gives the codec a length computation, an encoder, and a
//! decoder for the body that follows the identifier prefix.  Decoding
//! reads fields in exactly the order encoding writes them; there is no
//! per-field tagging.

pub mod chat;
pub mod circuit;
pub mod effect;
pub mod layer;
pub mod object;
pub mod region;
pub mod sound;

use serde::{Deserialize, Serialize};

use crate::protocol::codec::CodecError;
use crate::protocol::cursor::{ReadCursor, WriteCursor};
use crate::protocol::identifier::MessageId;

pub use chat::{
    ChatAudible, ChatFromSimulatorMessage, ChatFromViewerMessage, ChatSourceType, ChatType,
};
pub use circuit::{
    CloseCircuitMessage, CompletePingCheckMessage, OpenCircuitMessage, PacketAckMessage,
    StartPingCheckMessage,
};
pub use effect::{ViewerEffectEntry, ViewerEffectMessage};
pub use layer::{LayerDataMessage, LayerType};
pub use object::{ImprovedTerseObjectUpdateMessage, TerseObjectBlock, TerseObjectData};
pub use region::{RegionHandshakeMessage, RegionHandshakeReplyMessage};
pub use sound::{
    AttachedSoundMessage, PreloadSoundEntry, PreloadSoundMessage, SoundTriggerMessage,
};

/// Contract every concrete message type fulfils.
pub trait MessageBody: Sized {
    /// Identifier written before the body.
    const ID: MessageId;
    /// Human-readable type name, used in logs and inspector output.
    const NAME: &'static str;

    /// Exact number of body bytes [`encode_body`](Self::encode_body) writes.
    ///
    /// Checks every length and count constraint up front, so once this
    /// succeeds encoding into a region of at least this size cannot fail.
    ///
    /// # Errors
    ///
    /// [`CodecError::FieldTooLong`] or [`CodecError::CountOverflow`].
    fn body_len(&self) -> Result<usize, CodecError>;

    /// Writes the body at the cursor.
    ///
    /// # Errors
    ///
    /// Any [`CodecError`] from the cursor.
    fn encode_body(&self, w: &mut WriteCursor<'_>) -> Result<(), CodecError>;

    /// Reads the body at the cursor.
    ///
    /// # Errors
    ///
    /// [`CodecError::OutOfBounds`] on truncation, or
    /// [`CodecError::MalformedPayload`] for invalid field values.
    fn decode_body(r: &mut ReadCursor<'_>) -> Result<Self, CodecError>;
}

// ── Top-level message enum ────────────────────────────────────────────────────

macro_rules! message_enum {
    ($($variant:ident($ty:ty)),+ $(,)?) => {
        /// Every message type this crate can encode and decode.
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        pub enum Message {
            $($variant($ty),)+
        }

        impl Message {
            /// Identifier of the contained message.
            pub fn id(&self) -> MessageId {
                match self {
                    $(Message::$variant(_) => <$ty as MessageBody>::ID,)+
                }
            }

            /// Type name of the contained message.
            pub fn name(&self) -> &'static str {
                match self {
                    $(Message::$variant(_) => <$ty as MessageBody>::NAME,)+
                }
            }

            /// See [`MessageBody::body_len`].
            ///
            /// # Errors
            ///
            /// As [`MessageBody::body_len`].
            pub fn body_len(&self) -> Result<usize, CodecError> {
                match self {
                    $(Message::$variant(m) => m.body_len(),)+
                }
            }

            /// See [`MessageBody::encode_body`].
            ///
            /// # Errors
            ///
            /// As [`MessageBody::encode_body`].
            pub fn encode_body(&self, w: &mut WriteCursor<'_>) -> Result<(), CodecError> {
                match self {
                    $(Message::$variant(m) => m.encode_body(w),)+
                }
            }
        }

        $(
            impl From<$ty> for Message {
                fn from(msg: $ty) -> Self {
                    Message::$variant(msg)
                }
            }
        )+
    };
}

message_enum! {
    StartPingCheck(StartPingCheckMessage),
    CompletePingCheck(CompletePingCheckMessage),
    LayerData(LayerDataMessage),
    ImprovedTerseObjectUpdate(ImprovedTerseObjectUpdateMessage),
    SoundTrigger(SoundTriggerMessage),
    AttachedSound(AttachedSoundMessage),
    PreloadSound(PreloadSoundMessage),
    ViewerEffect(ViewerEffectMessage),
    ChatFromViewer(ChatFromViewerMessage),
    ChatFromSimulator(ChatFromSimulatorMessage),
    RegionHandshake(RegionHandshakeMessage),
    RegionHandshakeReply(RegionHandshakeReplyMessage),
    PacketAck(PacketAckMessage),
    OpenCircuit(OpenCircuitMessage),
    CloseCircuit(CloseCircuitMessage),
}
