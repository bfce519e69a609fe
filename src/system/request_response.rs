//! Correlation-id keyed pending-request registry for `ActorSystem::ask`.
//!
//! `InMemoryMessageBroker` already runs its own request/reply bookkeeping
//! for in-process `request()` calls (see `broker::in_memory`). This manager
//! is the system-level analogue used by `ActorSystem::ask`, which must work
//! the same way whether the reply comes back through the broker or, once a
//! remote transport lands, over the wire from a remote node: a fresh `Uuid`
//! correlation id is minted per call, a `oneshot` sender is registered
//! under it, and whichever path resolves the reply removes the entry and
//! fires the sender. No global/installable handler — each `ask` owns its
//! own slot.

// Layer 1: Standard library imports
use std::sync::Arc;
use std::time::Duration;

// Layer 2: Third-party crate imports
use dashmap::DashMap;
use tokio::sync::oneshot;
use uuid::Uuid;

/// Registry of in-flight `ask` requests, keyed by correlation id.
///
/// Cheaply cloneable (`Arc<DashMap<..>>`), following the same
/// M-SERVICES-CLONE pattern used by `ActorRegistry`.
pub struct RequestResponseManager<T> {
    pending: Arc<DashMap<Uuid, oneshot::Sender<T>>>,
}

impl<T> RequestResponseManager<T> {
    /// Construct an empty registry.
    pub fn new() -> Self {
        Self {
            pending: Arc::new(DashMap::new()),
        }
    }

    /// Register a fresh correlation id and its reply channel, returning the
    /// id the caller should stamp on the outgoing request and the receiver
    /// to await.
    pub fn register(&self) -> (Uuid, oneshot::Receiver<T>) {
        let correlation_id = Uuid::new_v4();
        let (tx, rx) = oneshot::channel();
        self.pending.insert(correlation_id, tx);
        (correlation_id, rx)
    }

    /// Resolve a pending request with its reply value. Returns `false` if
    /// no request is registered under `correlation_id` (already resolved,
    /// timed out, or never registered).
    pub fn resolve(&self, correlation_id: Uuid, value: T) -> bool {
        if let Some((_, tx)) = self.pending.remove(&correlation_id) {
            tx.send(value).is_ok()
        } else {
            false
        }
    }

    /// Drop a pending request's slot without resolving it (timeout cleanup).
    pub fn cancel(&self, correlation_id: &Uuid) {
        self.pending.remove(correlation_id);
    }

    /// Number of requests currently awaiting a reply.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Await a reply for `correlation_id`, giving up after `timeout` and
    /// cleaning up the registered slot on expiry (`RequestTimeout`, §7).
    pub async fn await_reply(
        &self,
        correlation_id: Uuid,
        rx: oneshot::Receiver<T>,
        timeout: Duration,
    ) -> Result<T, RequestResponseError> {
        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(_)) => {
                self.cancel(&correlation_id);
                Err(RequestResponseError::SenderDropped)
            }
            Err(_) => {
                self.cancel(&correlation_id);
                Err(RequestResponseError::Timeout(timeout))
            }
        }
    }
}

impl<T> Default for RequestResponseManager<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for RequestResponseManager<T> {
    fn clone(&self) -> Self {
        Self {
            pending: Arc::clone(&self.pending),
        }
    }
}

/// Failure modes for an outstanding `ask` (`RequestTimeout`, §7).
#[derive(Debug, Clone, thiserror::Error)]
pub enum RequestResponseError {
    /// No reply arrived within the configured timeout.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    /// The reply channel was dropped before a value was sent.
    #[error("request sender dropped without replying")]
    SenderDropped,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn register_and_resolve_delivers_value() {
        let manager: RequestResponseManager<u32> = RequestResponseManager::new();
        let (correlation_id, rx) = manager.register();

        assert!(manager.resolve(correlation_id, 42));
        let value = manager
            .await_reply(correlation_id, rx, Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn unresolved_request_times_out() {
        let manager: RequestResponseManager<u32> = RequestResponseManager::new();
        let (correlation_id, rx) = manager.register();

        let result = manager
            .await_reply(correlation_id, rx, Duration::from_millis(20))
            .await;

        assert!(matches!(result, Err(RequestResponseError::Timeout(_))));
        assert_eq!(manager.pending_count(), 0);
    }

    #[test]
    fn resolve_unknown_id_returns_false() {
        let manager: RequestResponseManager<u32> = RequestResponseManager::new();
        assert!(!manager.resolve(Uuid::new_v4(), 1));
    }

    #[test]
    fn clone_shares_the_same_registry() {
        let manager: RequestResponseManager<u32> = RequestResponseManager::new();
        let (correlation_id, _rx) = manager.register();

        let cloned = manager.clone();
        assert!(cloned.resolve(correlation_id, 7));
        assert_eq!(manager.pending_count(), 0);
    }
}
