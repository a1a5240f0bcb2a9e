//! Tick-driven action scheduler.
//!
//! Provides `Action`, `ActionState`, `Step`, and `Scheduler`: the host calls
//! `Scheduler::tick` on an interval and the head action of the queue runs
//! once per call.

pub mod action;
pub mod queue;

pub use action::{Action, ActionState, Resume, Step, TickContext};
pub use queue::{ActionSummary, QueueState, Scheduler, TickOutcome};
