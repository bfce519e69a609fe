//! Wire envelope: the serialized form of a message sent to a remote node,
//! carrying `{targetId, type, payload, senderPID?, metadata}`.
//!
//! [`crate::message::MessageEnvelope`] stays generic over `M: Message` for
//! in-process delivery; once a message crosses a node boundary the concrete
//! `M` is meaningless to the peer; it decodes `payload` back into its own
//! template's message type by convention on `message_type`.

// Layer 1: Standard library imports
use std::collections::HashMap;

// Layer 2: Third-party crate imports
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// Layer 3: Internal module imports
use crate::util::{ActorId, RemoteActorAddress};

/// An opaque, already-encoded message bound for (or arriving from) a remote
/// node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireEnvelope {
    /// The actor this envelope is addressed to, on its resident node.
    pub target_id: ActorId,

    /// The sending side's name for the payload's message type, used by the
    /// receiving template to pick a decoder. Opaque to the transport itself.
    pub message_type: String,

    /// The encoded message body (conventionally JSON, but transport-opaque).
    pub payload: Vec<u8>,

    /// The remote address to reply to, if the sender wants one.
    pub sender: Option<RemoteActorAddress>,

    /// Free-form metadata (trace ids, content-type hints, ...).
    #[serde(default)]
    pub metadata: HashMap<String, String>,

    /// When this envelope was handed to the transport.
    pub timestamp: DateTime<Utc>,
}

impl WireEnvelope {
    /// Build an envelope carrying an already-encoded payload.
    pub fn new(target_id: ActorId, message_type: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            target_id,
            message_type: message_type.into(),
            payload,
            sender: None,
            metadata: HashMap::new(),
            timestamp: Utc::now(),
        }
    }

    /// Attach a reply-to address.
    #[must_use]
    pub fn with_sender(mut self, sender: RemoteActorAddress) -> Self {
        self.sender = Some(sender);
        self
    }

    /// Attach a metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}
