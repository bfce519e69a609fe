//! Routing policies for distributing messages across a pool of routees.
//!
//! Generalizes [`crate::broker::PoolStrategy`] (RoundRobin/Random over a
//! named pool in the registry) to the four policies a [`super::Router`]
//! supports: `RoundRobin`, `Broadcast`, `Random`, and `ConsistentHash`.

/// How a [`super::Router`] selects routees for an incoming message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingPolicy {
    /// Cursor advances modulo `len(routees)` on each message.
    RoundRobin,
    /// The message is delivered to every routee.
    Broadcast,
    /// A routee is chosen uniformly at random.
    Random,
    /// A routee is chosen by `hash_fn(msg) % len(routees)`.
    ConsistentHash,
}
