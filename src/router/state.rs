//! Routee set and selection logic for a [`super::Router`].
//!
//! `RouterState` holds the routee list, selection cursor, and optional hash
//! function. Selection runs inside a single cell's turn (the
//! single-threaded-per-cell invariant, §4.1), so plain `&mut self` mutation
//! of the cursor is enough — no atomics needed.

// Layer 1: Standard library imports
use std::sync::Arc;

// Layer 2: Third-party crate imports
use rand::Rng;

// Layer 3: Internal module imports
use super::policy::RoutingPolicy;
use crate::message::Message;
use crate::util::ActorAddress;

/// Hash function used by [`RoutingPolicy::ConsistentHash`].
///
/// Stored as `Arc<dyn Fn>` rather than a generic parameter: it is supplied
/// optionally, per-instance, at router construction time, the same
/// deliberate runtime-polymorphism tradeoff as [`crate::actor::BehaviorStack`]
/// (§6.2's one documented departure from "generics over dyn").
pub type HashFn<M> = Arc<dyn Fn(&M) -> u64 + Send + Sync>;

/// Routee set and routing-policy state for a router cell.
pub struct RouterState<M: Message> {
    policy: RoutingPolicy,
    routees: Vec<ActorAddress>,
    cursor: usize,
    hash_fn: Option<HashFn<M>>,
}

impl<M: Message> RouterState<M> {
    /// Construct with a policy and initial routee set.
    pub fn new(policy: RoutingPolicy, routees: Vec<ActorAddress>) -> Self {
        Self {
            policy,
            routees,
            cursor: 0,
            hash_fn: None,
        }
    }

    /// Attach the hash function used by [`RoutingPolicy::ConsistentHash`].
    pub fn with_hash_fn(mut self, hash_fn: HashFn<M>) -> Self {
        self.hash_fn = Some(hash_fn);
        self
    }

    /// Current routing policy.
    pub fn policy(&self) -> RoutingPolicy {
        self.policy
    }

    /// Current routee set, in registration order.
    pub fn routees(&self) -> &[ActorAddress] {
        &self.routees
    }

    /// `AddRoutee(pid)` management message.
    pub fn add_routee(&mut self, address: ActorAddress) {
        if !self.routees.contains(&address) {
            self.routees.push(address);
        }
    }

    /// `RemoveRoutee(pid)` management message, also used to drop a routee
    /// on receipt of its `Terminated`.
    ///
    /// Returns whether the address was present.
    pub fn remove_routee(&mut self, address: &ActorAddress) -> bool {
        let before = self.routees.len();
        self.routees.retain(|a| a != address);
        self.routees.len() != before
    }

    /// Select the routee(s) that `message` should be delivered to.
    ///
    /// Returns one address for `RoundRobin`/`Random`/`ConsistentHash`, every
    /// routee for `Broadcast`, or an empty vec if there are no routees.
    pub fn targets(&mut self, message: &M) -> Vec<ActorAddress> {
        if self.routees.is_empty() {
            return Vec::new();
        }

        match self.policy {
            RoutingPolicy::RoundRobin => {
                let index = self.cursor % self.routees.len();
                self.cursor = self.cursor.wrapping_add(1);
                vec![self.routees[index].clone()]
            }
            RoutingPolicy::Broadcast => self.routees.clone(),
            RoutingPolicy::Random => {
                let index = rand::thread_rng().gen_range(0..self.routees.len());
                vec![self.routees[index].clone()]
            }
            RoutingPolicy::ConsistentHash => {
                let hash = self
                    .hash_fn
                    .as_ref()
                    .map(|f| f(message))
                    .unwrap_or(0);
                let index = (hash as usize) % self.routees.len();
                vec![self.routees[index].clone()]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessagePriority;

    #[derive(Debug, Clone)]
    struct TestMessage(u64);

    impl Message for TestMessage {
        const MESSAGE_TYPE: &'static str = "router_test";

        fn priority(&self) -> MessagePriority {
            MessagePriority::Normal
        }
    }

    fn routees(n: usize) -> Vec<ActorAddress> {
        (0..n).map(|_| ActorAddress::anonymous()).collect()
    }

    #[test]
    fn round_robin_cycles_through_routees() {
        let addrs = routees(3);
        let mut state = RouterState::new(RoutingPolicy::RoundRobin, addrs.clone());

        let first = state.targets(&TestMessage(0));
        let second = state.targets(&TestMessage(0));
        let third = state.targets(&TestMessage(0));
        let fourth = state.targets(&TestMessage(0));

        assert_eq!(first, vec![addrs[0].clone()]);
        assert_eq!(second, vec![addrs[1].clone()]);
        assert_eq!(third, vec![addrs[2].clone()]);
        assert_eq!(fourth, vec![addrs[0].clone()]);
    }

    #[test]
    fn broadcast_delivers_to_every_routee() {
        let addrs = routees(3);
        let mut state = RouterState::new(RoutingPolicy::Broadcast, addrs.clone());

        let targets = state.targets(&TestMessage(0));
        assert_eq!(targets.len(), 3);
        for addr in &addrs {
            assert!(targets.contains(addr));
        }
    }

    #[test]
    fn random_selects_a_registered_routee() {
        let addrs = routees(5);
        let mut state = RouterState::new(RoutingPolicy::Random, addrs.clone());

        for _ in 0..20 {
            let targets = state.targets(&TestMessage(0));
            assert_eq!(targets.len(), 1);
            assert!(addrs.contains(&targets[0]));
        }
    }

    #[test]
    fn consistent_hash_is_deterministic_for_same_key() {
        let addrs = routees(4);
        let mut state = RouterState::new(RoutingPolicy::ConsistentHash, addrs)
            .with_hash_fn(Arc::new(|msg: &TestMessage| msg.0));

        let a = state.targets(&TestMessage(7));
        let b = state.targets(&TestMessage(7));
        assert_eq!(a, b);
    }

    #[test]
    fn empty_routee_set_yields_no_targets() {
        let mut state: RouterState<TestMessage> = RouterState::new(RoutingPolicy::RoundRobin, vec![]);
        assert!(state.targets(&TestMessage(0)).is_empty());
    }

    #[test]
    fn terminated_routee_is_removed_from_the_set() {
        let addrs = routees(3);
        let mut state = RouterState::new(RoutingPolicy::Broadcast, addrs.clone());

        assert!(state.remove_routee(&addrs[1]));
        let targets = state.targets(&TestMessage(0));
        assert_eq!(targets.len(), 2);
        assert!(!targets.contains(&addrs[1]));
    }

    #[test]
    fn add_routee_is_idempotent() {
        let addr = ActorAddress::anonymous();
        let mut state: RouterState<TestMessage> =
            RouterState::new(RoutingPolicy::Broadcast, vec![addr.clone()]);
        state.add_routee(addr.clone());
        assert_eq!(state.routees().len(), 1);
    }
}
