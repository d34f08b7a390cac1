//! Identifier → decoder lookup.
//!
//! A [`MessageRegistry`] is built once with a [`RegistryBuilder`] and is
//! immutable afterwards, so it can be shared freely between threads.  Most
//! callers want [`default_registry`], which holds every built-in message
//! type.

use std::collections::HashMap;
use std::sync::OnceLock;

use tracing::trace;

use crate::protocol::codec::CodecError;
use crate::protocol::cursor::ReadCursor;
use crate::protocol::identifier::MessageId;
use crate::protocol::messages::{
    AttachedSoundMessage, ChatFromSimulatorMessage, ChatFromViewerMessage, CloseCircuitMessage,
    CompletePingCheckMessage, ImprovedTerseObjectUpdateMessage, LayerDataMessage, Message,
    MessageBody, OpenCircuitMessage, PacketAckMessage, PreloadSoundMessage,
    RegionHandshakeMessage, RegionHandshakeReplyMessage, SoundTriggerMessage,
    StartPingCheckMessage, ViewerEffectMessage,
};

/// Decodes a message body positioned at the cursor.
pub type DecodeFn = fn(&mut ReadCursor<'_>) -> Result<Message, CodecError>;

#[derive(Clone, Copy)]
struct Entry {
    name: &'static str,
    decode: DecodeFn,
}

impl std::fmt::Debug for Entry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entry").field("name", &self.name).finish_non_exhaustive()
    }
}

/// Immutable identifier → decoder table.
#[derive(Debug, Clone, Default)]
pub struct MessageRegistry {
    entries: HashMap<MessageId, Entry>,
}

impl MessageRegistry {
    /// Starts an empty builder.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Looks up the decoder for `id`.
    ///
    /// # Errors
    ///
    /// [`CodecError::UnknownMessage`] if nothing is registered under `id`.
    pub fn resolve(&self, id: MessageId) -> Result<DecodeFn, CodecError> {
        match self.entries.get(&id) {
            Some(entry) => Ok(entry.decode),
            None => {
                trace!(%id, "no decoder registered");
                Err(CodecError::UnknownMessage { id })
            }
        }
    }

    /// Resolves `id` and decodes the body at the cursor.
    ///
    /// # Errors
    ///
    /// [`CodecError::UnknownMessage`], or whatever the decoder returns.
    pub fn decode(&self, id: MessageId, r: &mut ReadCursor<'_>) -> Result<Message, CodecError> {
        let decode = self.resolve(id)?;
        decode(r)
    }

    /// Registered type name for `id`.
    pub fn name_of(&self, id: MessageId) -> Option<&'static str> {
        self.entries.get(&id).map(|e| e.name)
    }

    pub fn contains(&self, id: MessageId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered identifiers, sorted.
    pub fn ids(&self) -> Vec<MessageId> {
        let mut ids: Vec<MessageId> = self.entries.keys().copied().collect();
        ids.sort();
        ids
    }
}

/// Collects registrations and rejects conflicts.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    entries: HashMap<MessageId, Entry>,
}

fn decode_as<T>(r: &mut ReadCursor<'_>) -> Result<Message, CodecError>
where
    T: MessageBody + Into<Message>,
{
    T::decode_body(r).map(Into::into)
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a concrete message type under its own identifier.
    ///
    /// # Errors
    ///
    /// [`CodecError::DuplicateRegistration`] or [`CodecError::InvalidIdentifier`].
    pub fn register<T>(self) -> Result<Self, CodecError>
    where
        T: MessageBody + Into<Message>,
    {
        self.register_fn(T::ID, T::NAME, decode_as::<T>)
    }

    /// Registers an arbitrary decoder under `id`.
    ///
    /// # Errors
    ///
    /// [`CodecError::DuplicateRegistration`] if `id` is taken,
    /// [`CodecError::InvalidIdentifier`] if it cannot appear on the wire.
    pub fn register_fn(
        mut self,
        id: MessageId,
        name: &'static str,
        decode: DecodeFn,
    ) -> Result<Self, CodecError> {
        id.validate()?;
        if self.entries.contains_key(&id) {
            return Err(CodecError::DuplicateRegistration { id });
        }
        self.entries.insert(id, Entry { name, decode });
        Ok(self)
    }

    /// Registers every message type defined in this crate.
    ///
    /// # Errors
    ///
    /// [`CodecError::DuplicateRegistration`] if any of them is already present.
    pub fn with_builtin_messages(self) -> Result<Self, CodecError> {
        self.register::<StartPingCheckMessage>()?
            .register::<CompletePingCheckMessage>()?
            .register::<LayerDataMessage>()?
            .register::<ImprovedTerseObjectUpdateMessage>()?
            .register::<SoundTriggerMessage>()?
            .register::<AttachedSoundMessage>()?
            .register::<PreloadSoundMessage>()?
            .register::<ViewerEffectMessage>()?
            .register::<ChatFromViewerMessage>()?
            .register::<ChatFromSimulatorMessage>()?
            .register::<RegionHandshakeMessage>()?
            .register::<RegionHandshakeReplyMessage>()?
            .register::<PacketAckMessage>()?
            .register::<OpenCircuitMessage>()?
            .register::<CloseCircuitMessage>()
    }

    pub fn build(self) -> MessageRegistry {
        MessageRegistry {
            entries: self.entries,
        }
    }
}

/// Shared registry holding every built-in message type.
///
/// Built on first use; later calls are a plain load.
pub fn default_registry() -> &'static MessageRegistry {
    static REGISTRY: OnceLock<MessageRegistry> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        RegistryBuilder::new()
            .with_builtin_messages()
            .map(RegistryBuilder::build)
            .unwrap_or_else(|e| {
                // only reachable if two built-ins share an identifier
                tracing::error!(error = %e, "built-in message registration failed");
                MessageRegistry::default()
            })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::identifier::Frequency;

    fn decode_nothing(_r: &mut ReadCursor<'_>) -> Result<Message, CodecError> {
        Ok(CloseCircuitMessage.into())
    }

    #[test]
    fn test_builtin_registration_succeeds() {
        let registry = RegistryBuilder::new().with_builtin_messages().unwrap().build();
        assert_eq!(registry.len(), 15);
        assert_eq!(default_registry().len(), 15);
    }

    #[test]
    fn test_same_number_in_different_classes_are_distinct() {
        let registry = default_registry();
        // High 15 is the terse update; Medium 15 is PreloadSound.
        assert_eq!(registry.name_of(MessageId::high(15)), Some("ImprovedTerseObjectUpdate"));
        assert_eq!(registry.name_of(MessageId::medium(15)), Some("PreloadSound"));
        assert_eq!(registry.name_of(MessageId::low(15)), None);
    }

    #[test]
    fn test_resolve_miss_is_unknown_message() {
        let id = MessageId::low(4000);
        assert_eq!(
            default_registry().resolve(id).err(),
            Some(CodecError::UnknownMessage { id })
        );
    }

    #[test]
    fn test_duplicate_registration_is_rejected() {
        let result = RegistryBuilder::new()
            .register::<CompletePingCheckMessage>()
            .unwrap()
            .register_fn(MessageId::high(2), "Impostor", decode_nothing);
        assert!(matches!(
            result,
            Err(CodecError::DuplicateRegistration { id }) if id == MessageId::high(2)
        ));
    }

    #[test]
    fn test_invalid_identifier_is_rejected() {
        let result = RegistryBuilder::new().register_fn(MessageId::high(0xFF), "Bad", decode_nothing);
        assert!(matches!(
            result,
            Err(CodecError::InvalidIdentifier { frequency: Frequency::High, number: 0xFF })
        ));
    }

    #[test]
    fn test_custom_decoder_is_dispatched() {
        let registry = RegistryBuilder::new()
            .register_fn(MessageId::low(600), "Custom", decode_nothing)
            .unwrap()
            .build();
        let mut r = ReadCursor::new(&[]);
        assert!(registry.contains(MessageId::low(600)));
        assert_eq!(
            registry.decode(MessageId::low(600), &mut r).unwrap(),
            Message::CloseCircuit(CloseCircuitMessage)
        );
    }

    #[test]
    fn test_default_registry_is_shared_across_threads() {
        let handles: Vec<_> = (0..4)
            .map(|_| std::thread::spawn(|| default_registry() as *const MessageRegistry as usize))
            .collect();
        let addrs: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(addrs.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn test_ids_are_sorted_by_class_then_number() {
        let ids = default_registry().ids();
        assert_eq!(ids.first(), Some(&MessageId::high(1)));
        assert_eq!(ids.last(), Some(&MessageId::fixed(0xFFFF_FFFD)));
    }
}
