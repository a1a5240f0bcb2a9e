//! Action contract for the tick-driven scheduler.
//!
//! An `Action` is one unit of queued work. The scheduler ticks the head of
//! the queue once per invocation; the returned [`Step`] says whether the
//! action is finished, wants another tick, or has handed work to an
//! asynchronous continuation.

use std::time::Instant;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::host::HostMessage;

// ---------------------------------------------------------------------------
// ActionState
// ---------------------------------------------------------------------------

/// Lifecycle state of a queued action.
///
/// Transitions: `Pending → Running → Pending | Complete`, or directly
/// `Pending → Complete`. A `Running` action has a continuation in flight and
/// is not ticked again until it resolves. `Complete` actions are dequeued
/// before the next tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionState {
    Pending,
    Running,
    Complete,
}

// ---------------------------------------------------------------------------
// Step
// ---------------------------------------------------------------------------

/// Completion handler for a suspended action. Runs with exclusive access to
/// the queue once the future that produced it resolves.
pub type Resume = Box<dyn FnOnce(&mut TickContext) -> Step + Send>;

pub enum Step {
    /// Tick again on the next scheduler invocation.
    Continue,
    /// Done; dequeue.
    Complete,
    /// Park the action until the future resolves, then apply its [`Resume`].
    Suspend(BoxFuture<'static, Resume>),
}

impl std::fmt::Debug for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Continue => f.write_str("Continue"),
            Self::Complete => f.write_str("Complete"),
            Self::Suspend(_) => f.write_str("Suspend(..)"),
        }
    }
}

// ---------------------------------------------------------------------------
// TickContext
// ---------------------------------------------------------------------------

/// Handed to every tick and continuation.
///
/// Enqueued actions are buffered and appended to the queue after the tick
/// returns, so nothing added here runs within the same tick.
pub struct TickContext {
    now: Instant,
    enqueued: Vec<Box<dyn Action>>,
    reset: bool,
}

impl TickContext {
    pub fn new(now: Instant) -> Self {
        Self {
            now,
            enqueued: Vec::new(),
            reset: false,
        }
    }

    pub fn now(&self) -> Instant {
        self.now
    }

    pub fn enqueue<A: Action + 'static>(&mut self, action: A) {
        self.enqueued.push(Box::new(action));
    }

    /// Discard the whole queue, including anything enqueued by this tick.
    pub fn reset_queue(&mut self) {
        self.reset = true;
    }

    pub fn reset_requested(&self) -> bool {
        self.reset
    }

    pub fn enqueued_names(&self) -> Vec<&'static str> {
        self.enqueued.iter().map(|a| a.name()).collect()
    }

    pub(crate) fn into_parts(self) -> (Vec<Box<dyn Action>>, bool) {
        (self.enqueued, self.reset)
    }
}

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

pub trait Action: Send {
    fn name(&self) -> &'static str;

    fn tick(&mut self, cx: &mut TickContext) -> Step;

    /// Offered host messages while this action is at the head of the queue.
    /// Return `true` if the message was consumed.
    fn on_message(&mut self, _msg: &HostMessage) -> bool {
        false
    }
}
