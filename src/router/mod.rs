//! Routing pool of equivalent children.
//!
//! A router is constructed with a [`RoutingPolicy`] and an initial routee
//! set; non-management messages are distributed to routees per policy,
//! while `AddRoutee`/`RemoveRoutee`/`GetRoutees` travel on the system lane
//! so they can never be reordered past routed user messages.

pub mod policy;
pub mod router;
pub mod state;

pub use policy::RoutingPolicy;
pub use router::Router;
pub use state::{HashFn, RouterState};
