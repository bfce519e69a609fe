//! System-priority lane layered over a user mailbox.
//!
//! The teacher's `BoundedMailbox`/`UnboundedMailbox` are single-lane `mpsc`
//! wrappers. A cell needs a second lane for control traffic (`Stop`,
//! `Restart`, `Watch`/`Unwatch`, `Terminated`) that must always be observed
//! before the next user message, per §4.1's "system lane drained before user
//! lane" invariant. `CellInbox` pairs an always-drained-first unbounded
//! `mpsc` for [`SystemMessage`] with any [`MailboxReceiver`] for the user
//! lane.

// Layer 1: Standard library imports
use std::fmt;

// Layer 2: Third-party crate imports
use tokio::sync::mpsc;

// Layer 3: Internal module imports
use super::traits::MailboxReceiver;
use crate::message::{Message, MessageEnvelope};
use crate::util::ActorAddress;

/// Control-plane message delivered on a cell's system lane.
///
/// Router management traffic (`AddRoutee`/`RemoveRoutee`) rides the same
/// lane so it cannot be reordered past user messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SystemMessage {
    /// Stop the cell; only further system messages are processed afterwards.
    Stop,
    /// Restart the cell's instance, preserving the mailbox.
    Restart,
    /// Register `watcher` to receive `Terminated` when this cell stops.
    Watch(ActorAddress),
    /// Remove a previously registered watcher.
    Unwatch(ActorAddress),
    /// Delivered to a watcher exactly once when the watched cell reaches `Stopped`.
    Terminated(ActorAddress),
    /// Router management: add a routee to the pool.
    AddRoutee(ActorAddress),
    /// Router management: remove a routee from the pool.
    RemoveRoutee(ActorAddress),
}

/// What a cell's drain loop pulled off one of its two lanes.
pub enum CellMessage<M: Message> {
    /// A system-lane message; always preferred over `User`.
    System(SystemMessage),
    /// A user-lane message envelope.
    User(MessageEnvelope<M>),
}

impl<M: Message> fmt::Debug for CellMessage<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::System(msg) => f.debug_tuple("System").field(msg).finish(),
            Self::User(_) => f.write_str("User(..)"),
        }
    }
}

/// Sender half of a cell's system lane. Cheaply cloneable.
#[derive(Clone)]
pub struct SystemMailboxSender {
    sender: mpsc::UnboundedSender<SystemMessage>,
}

impl SystemMailboxSender {
    /// Enqueue a system message. Errors only if the cell's receiver was dropped.
    pub fn send(&self, message: SystemMessage) -> Result<(), SystemMessage> {
        self.sender.send(message.clone()).map_err(|_| message)
    }
}

/// Combines a cell's system-lane receiver with its user-lane mailbox.
///
/// `recv_next` always drains the system lane first, matching §4.1 and the
/// "System lane priority" testable property (§8): if both lanes have a
/// message ready, the system message is returned first.
pub struct CellInbox<M: Message, U: MailboxReceiver<M>> {
    system_rx: mpsc::UnboundedReceiver<SystemMessage>,
    user: U,
    _marker: std::marker::PhantomData<M>,
}

impl<M: Message, U: MailboxReceiver<M>> CellInbox<M, U> {
    /// Pair a user mailbox with a fresh system lane, returning the inbox and
    /// the sender half other actors/the system use to deliver control
    /// messages to this cell.
    pub fn new(user: U) -> (Self, SystemMailboxSender) {
        let (sender, system_rx) = mpsc::unbounded_channel();
        (
            Self {
                system_rx,
                user,
                _marker: std::marker::PhantomData,
            },
            SystemMailboxSender { sender },
        )
    }

    /// Pull the next message, preferring the system lane.
    ///
    /// Returns `None` once both lanes are closed and empty (the cell has
    /// nothing left to process and should terminate).
    pub async fn recv_next(&mut self) -> Option<CellMessage<M>> {
        // Drain any system messages queued from a previous turn before
        // looking at the user lane at all.
        if let Ok(system_msg) = self.system_rx.try_recv() {
            return Some(CellMessage::System(system_msg));
        }

        tokio::select! {
            biased;
            system_msg = self.system_rx.recv() => {
                system_msg.map(CellMessage::System)
            }
            user_msg = self.user.recv() => {
                user_msg.map(CellMessage::User)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mailbox::UnboundedMailbox;

    #[derive(Debug, Clone)]
    struct TestMessage;

    impl Message for TestMessage {
        const MESSAGE_TYPE: &'static str = "test";
    }

    #[tokio::test]
    async fn system_lane_preferred_over_user_lane() {
        let (user_mailbox, user_sender) = UnboundedMailbox::<TestMessage>::new();
        let (mut inbox, system_sender) = CellInbox::new(user_mailbox);

        user_sender
            .send(MessageEnvelope::new(TestMessage))
            .await
            .unwrap();
        system_sender.send(SystemMessage::Stop).unwrap();

        match inbox.recv_next().await {
            Some(CellMessage::System(SystemMessage::Stop)) => {}
            other => panic!("expected system Stop first, got {other:?}"),
        }
        match inbox.recv_next().await {
            Some(CellMessage::User(_)) => {}
            other => panic!("expected user message second, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn closes_when_both_lanes_drop() {
        let (user_mailbox, user_sender) = UnboundedMailbox::<TestMessage>::new();
        let (mut inbox, system_sender) = CellInbox::new(user_mailbox);
        drop(user_sender);
        drop(system_sender);

        assert!(inbox.recv_next().await.is_none());
    }
}
