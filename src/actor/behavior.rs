//! Runtime-switchable actor behavior stack.
//!
//! The rest of the crate avoids `dyn` in favor of generic constraints (§6.2),
//! but `become`/`push`/`pop` are inherently a runtime reconfiguration of *which*
//! handler processes the next message — something the teacher's compile-time
//! dispatch style has no way to express. This is the one deliberate, documented
//! departure from that style.

// Layer 1: Standard library imports
use std::sync::Arc;

// Layer 2: Third-party crate imports
use futures::future::BoxFuture;

// Layer 3: Internal module imports
use crate::message::Message;

/// Outcome of a [`Behavior`] processing a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BehaviorDirective {
    /// The behavior consumed the message; no further dispatch is needed.
    Handled,
    /// The behavior does not recognize this message; the caller may fall
    /// back to the actor's base `handle_message` or a lower frame.
    Unhandled,
}

/// An alternate message handler an actor can switch to at runtime.
///
/// Behaviors are stored as `Arc<dyn Behavior<M>>` frames in a [`BehaviorStack`]
/// so an actor can `become` a different behavior, `push` a temporary one (e.g.
/// "awaiting confirmation"), and `pop` back to the previous one.
pub trait Behavior<M: Message>: Send + Sync {
    /// A human-readable name for this behavior, useful in logs/traces.
    fn name(&self) -> &str;

    /// Process a message under this behavior.
    fn handle<'a>(&'a self, message: &'a M) -> BoxFuture<'a, BehaviorDirective>;
}

/// A stack of [`Behavior`] frames for one actor.
///
/// - `become_(behavior)` replaces the current top frame (a permanent switch).
/// - `push(behavior)` adds a new frame on top (a temporary switch).
/// - `pop()` removes the top pushed frame, falling back to what was below it.
///
/// The stack always keeps its base frame: `pop()` on a stack with zero or one
/// frame is a no-op, mirroring the actor's default behavior being the floor
/// you can't fall beneath.
pub struct BehaviorStack<M: Message> {
    frames: Vec<Arc<dyn Behavior<M>>>,
}

impl<M: Message> BehaviorStack<M> {
    /// Create an empty stack (the actor runs with its base `handle_message`).
    pub fn new() -> Self {
        Self { frames: Vec::new() }
    }

    /// Replace the current top frame, or install the first frame if empty.
    pub fn become_(&mut self, behavior: Arc<dyn Behavior<M>>) {
        match self.frames.last_mut() {
            Some(top) => *top = behavior,
            None => self.frames.push(behavior),
        }
    }

    /// Push a new frame on top of the stack.
    pub fn push(&mut self, behavior: Arc<dyn Behavior<M>>) {
        self.frames.push(behavior);
    }

    /// Pop the top frame, keeping at least the base frame in place.
    ///
    /// Returns the popped frame, or `None` if there was nothing to pop above
    /// the base.
    pub fn pop(&mut self) -> Option<Arc<dyn Behavior<M>>> {
        if self.frames.len() <= 1 {
            return None;
        }
        self.frames.pop()
    }

    /// The currently active frame, if any behavior has been installed.
    pub fn current(&self) -> Option<&Arc<dyn Behavior<M>>> {
        self.frames.last()
    }

    /// Number of frames currently on the stack.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Whether no behavior has been installed (actor runs its base handler).
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl<M: Message> Default for BehaviorStack<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Message> Clone for BehaviorStack<M> {
    fn clone(&self) -> Self {
        Self {
            frames: self.frames.clone(),
        }
    }
}
