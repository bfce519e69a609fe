//! Transport-level error types.

// Layer 1: Standard library
// (none)

// Layer 2: Third-party
use thiserror::Error;

// Layer 3: Internal
use crate::util::{ActorId, RemoteActorAddress};

/// Errors raised by a [`super::Transport`] provider or the RPCs layered on
/// top of it.
#[derive(Error, Debug)]
pub enum TransportError {
    /// `send`/an RPC call was made before `start()`.
    #[error("transport has not been started")]
    NotStarted,

    /// `start()` was called on an already-running transport.
    #[error("transport is already started")]
    AlreadyStarted,

    /// The peer node could not be reached at all (connection refused, DNS
    /// failure, etc.) as opposed to the peer rejecting the request.
    #[error("peer unreachable: {0}")]
    Unreachable(RemoteActorAddress),

    /// The peer was reached but responded with an error or malformed body.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// The request exceeded its deadline waiting for the peer.
    #[error("transport request timed out")]
    Timeout,

    /// Envelope or RPC payload failed to encode/decode.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The remote-hosted actor referenced by an RPC does not exist locally.
    #[error("actor not found: {0}")]
    ActorNotFound(ActorId),

    /// No template registered under the requested name (remote spawn).
    #[error("unknown actor template: {0}")]
    UnknownTemplate(String),
}
