//! Router: a cell that forwards messages to a pool of routees.
//!
//! A `Router` is deliberately not an [`crate::actor::Actor`] impl: it never
//! runs business logic over a payload, only forwards it, so it is driven by
//! its own [`Router::run`] loop over a [`CellInbox`] instead of going through
//! `handle_message`. `AddRoutee`/`RemoveRoutee` arrive as
//! [`SystemMessage`] variants on the system lane and are applied via
//! [`Router::add_routee`]/[`Router::remove_routee`]; everything else is
//! forwarded per [`RoutingPolicy`].

// Layer 3: Internal module imports
use super::policy::RoutingPolicy;
use super::state::{HashFn, RouterState};
use crate::broker::MessageBroker;
use crate::mailbox::{CellInbox, CellMessage, MailboxReceiver, SystemMessage};
use crate::message::{Message, MessageEnvelope};
use crate::util::ActorAddress;

/// Forwards incoming envelopes to one or more routees according to a
/// [`RoutingPolicy`], routing through a [`MessageBroker`] the same way any
/// other cell does.
pub struct Router<M: Message, B: MessageBroker<M>> {
    state: RouterState<M>,
    broker: B,
}

impl<M: Message, B: MessageBroker<M>> Router<M, B> {
    /// Construct a router with a policy, initial routees, and the broker
    /// used to forward messages.
    pub fn new(policy: RoutingPolicy, routees: Vec<ActorAddress>, broker: B) -> Self {
        Self {
            state: RouterState::new(policy, routees),
            broker,
        }
    }

    /// Attach a [`RoutingPolicy::ConsistentHash`] hash function.
    pub fn with_hash_fn(mut self, hash_fn: HashFn<M>) -> Self {
        self.state = self.state.with_hash_fn(hash_fn);
        self
    }

    /// `AddRoutee(pid)`.
    pub fn add_routee(&mut self, address: ActorAddress) {
        self.state.add_routee(address);
    }

    /// `RemoveRoutee(pid)`, also called when `Terminated(pid)` is observed
    /// for a routee.
    pub fn remove_routee(&mut self, address: &ActorAddress) -> bool {
        self.state.remove_routee(address)
    }

    /// Current routee set.
    pub fn routees(&self) -> &[ActorAddress] {
        self.state.routees()
    }

    /// Forward `envelope` to the routee(s) selected by the current policy.
    ///
    /// For `Broadcast`, the payload is cloned once per routee (message
    /// delivered to every routee, exactly once each). Returns the first send
    /// error encountered, if any; routees already sent to before the failing
    /// one have still received the message.
    pub async fn forward(&mut self, envelope: MessageEnvelope<M>) -> Result<(), B::Error> {
        let targets = self.state.targets(&envelope.payload);
        for target in targets {
            let routed = envelope.clone().with_reply_to(target);
            self.broker.send(routed).await?;
        }
        Ok(())
    }

    /// Drive this router: forwards every envelope arriving on `inbox`'s user
    /// lane per policy, applies `AddRoutee`/`RemoveRoutee` arriving on its
    /// system lane, and removes a routee on its own `Terminated` the same way
    /// a manual `RemoveRoutee` would — the watch-driven half of "dead
    /// routees are removed from the set on `Terminated`". Returns once its
    /// system lane delivers `Stop` or both lanes close.
    pub async fn run<U: MailboxReceiver<M>>(mut self, mut inbox: CellInbox<M, U>) {
        loop {
            match inbox.recv_next().await {
                None | Some(CellMessage::System(SystemMessage::Stop)) => break,
                Some(CellMessage::System(SystemMessage::AddRoutee(address))) => {
                    self.add_routee(address);
                }
                Some(CellMessage::System(SystemMessage::RemoveRoutee(address)))
                | Some(CellMessage::System(SystemMessage::Terminated(address))) => {
                    self.remove_routee(&address);
                }
                Some(CellMessage::System(_)) => {}
                Some(CellMessage::User(envelope)) => {
                    let _ = self.forward(envelope).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::InMemoryMessageBroker;
    use crate::mailbox::UnboundedMailbox;
    use crate::message::MessagePriority;

    #[derive(Debug, Clone)]
    struct TestMessage;

    impl Message for TestMessage {
        const MESSAGE_TYPE: &'static str = "router_fwd_test";

        fn priority(&self) -> MessagePriority {
            MessagePriority::Normal
        }
    }

    #[tokio::test]
    async fn broadcast_forward_reaches_every_routee() {
        let broker = InMemoryMessageBroker::<TestMessage>::new();

        let mut receivers = Vec::new();
        let mut addrs = Vec::new();
        for _ in 0..3 {
            let (mailbox, sender) = UnboundedMailbox::<TestMessage>::new();
            let address = ActorAddress::anonymous();
            broker.register_actor(address.clone(), sender).unwrap();
            addrs.push(address);
            receivers.push(mailbox);
        }

        let mut router = Router::new(RoutingPolicy::Broadcast, addrs, broker);
        router
            .forward(MessageEnvelope::new(TestMessage))
            .await
            .unwrap();

        for mut mailbox in receivers {
            let received = mailbox.recv().await;
            assert!(received.is_some());
        }
    }

    #[tokio::test]
    async fn round_robin_forward_targets_one_routee_per_call() {
        let broker = InMemoryMessageBroker::<TestMessage>::new();

        let (mailbox_a, sender_a) = UnboundedMailbox::<TestMessage>::new();
        let (mut mailbox_b, sender_b) = UnboundedMailbox::<TestMessage>::new();
        let addr_a = ActorAddress::anonymous();
        let addr_b = ActorAddress::anonymous();
        broker.register_actor(addr_a.clone(), sender_a).unwrap();
        broker.register_actor(addr_b.clone(), sender_b).unwrap();

        let mut router = Router::new(RoutingPolicy::RoundRobin, vec![addr_a, addr_b], broker);
        router
            .forward(MessageEnvelope::new(TestMessage))
            .await
            .unwrap();
        router
            .forward(MessageEnvelope::new(TestMessage))
            .await
            .unwrap();

        drop(mailbox_a);
        assert!(mailbox_b.recv().await.is_some());
    }

    #[tokio::test]
    async fn run_loop_removes_routee_on_terminated_then_stops_on_stop() {
        let broker = InMemoryMessageBroker::<TestMessage>::new();

        let (mailbox_a, sender_a) = UnboundedMailbox::<TestMessage>::new();
        let (mut mailbox_b, sender_b) = UnboundedMailbox::<TestMessage>::new();
        let addr_a = ActorAddress::anonymous();
        let addr_b = ActorAddress::anonymous();
        broker.register_actor(addr_a.clone(), sender_a).unwrap();
        broker.register_actor(addr_b.clone(), sender_b).unwrap();

        let router = Router::new(RoutingPolicy::Broadcast, vec![addr_a.clone(), addr_b], broker);

        let (user_mailbox, user_sender) = UnboundedMailbox::<TestMessage>::new();
        let (inbox, system_sender) = crate::mailbox::CellInbox::new(user_mailbox);

        let handle = tokio::spawn(router.run(inbox));

        system_sender
            .send(SystemMessage::Terminated(addr_a))
            .unwrap();
        user_sender.send(MessageEnvelope::new(TestMessage)).await.unwrap();

        // Blocks until the run loop has drained the system lane (removing
        // addr_a) and forwarded the broadcast, so the ordering below is
        // race-free.
        assert!(mailbox_b.recv().await.is_some());
        assert!(mailbox_a.try_recv().is_err());

        system_sender.send(SystemMessage::Stop).unwrap();
        handle.await.unwrap();
    }
}
