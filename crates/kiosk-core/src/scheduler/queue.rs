//! The action queue.
//!
//! A FIFO of [`Action`]s where only the head runs. `Scheduler` is a cheap
//! clonable handle; every mutation (tick, continuation, add, reset, host
//! message) takes the same lock, so at most one of them runs at a time. The
//! lock is never held across an `.await`.

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use futures::FutureExt;
use serde::Serialize;
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::action::{Action, ActionState, Resume, Step, TickContext};
use crate::host::HostMessage;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueState {
    Idle,
    Running,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionSummary {
    pub id: Uuid,
    pub name: &'static str,
    pub state: ActionState,
}

#[derive(Debug)]
pub enum TickOutcome {
    /// Queue empty.
    Idle,
    /// Head action is waiting on its continuation.
    Waiting { action: &'static str },
    /// Head action ticked synchronously and is now in `state`.
    Ran {
        action: &'static str,
        state: ActionState,
    },
    /// Head action handed work to a continuation, running on `handle`.
    Suspended {
        action: &'static str,
        handle: JoinHandle<()>,
    },
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

struct Entry {
    id: Uuid,
    action: Box<dyn Action>,
    state: ActionState,
}

#[derive(Default)]
struct Inner {
    entries: VecDeque<Entry>,
    /// Bumped by every reset; continuations from an older epoch are stale.
    epoch: u64,
}

#[derive(Clone, Default)]
pub struct Scheduler {
    inner: Arc<Mutex<Inner>>,
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("actions", &self.snapshot())
            .finish()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append `action` to the tail of the queue.
    pub fn add<A: Action + 'static>(&self, action: A) -> Uuid {
        self.add_boxed(Box::new(action))
    }

    pub fn add_boxed(&self, action: Box<dyn Action>) -> Uuid {
        let mut inner = self.lock();
        push(&mut inner, action)
    }

    /// Discard every queued action. Returns how many were dropped.
    pub fn reset(&self) -> usize {
        let mut inner = self.lock();
        drain(&mut inner)
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    pub fn state(&self) -> QueueState {
        if self.is_empty() {
            QueueState::Idle
        } else {
            QueueState::Running
        }
    }

    pub fn snapshot(&self) -> Vec<ActionSummary> {
        self.lock()
            .entries
            .iter()
            .map(|e| ActionSummary {
                id: e.id,
                name: e.action.name(),
                state: e.state,
            })
            .collect()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.lock().entries.iter().map(|e| e.action.name()).collect()
    }

    /// Offer a host message to the head action.
    pub fn offer_message(&self, msg: &HostMessage) -> bool {
        let mut inner = self.lock();
        match inner.entries.front_mut() {
            Some(head) => head.action.on_message(msg),
            None => false,
        }
    }

    pub fn tick(&self) -> TickOutcome {
        self.tick_at(Instant::now())
    }

    /// Run the head action once, as of `now`.
    ///
    /// Must be called from within a Tokio runtime: suspended actions spawn
    /// their continuation onto it.
    pub fn tick_at(&self, now: Instant) -> TickOutcome {
        let mut inner = self.lock();
        let epoch = inner.epoch;
        let Some(head) = inner.entries.front_mut() else {
            return TickOutcome::Idle;
        };
        let name = head.action.name();
        if head.state == ActionState::Running {
            return TickOutcome::Waiting { action: name };
        }

        let id = head.id;
        let mut cx = TickContext::new(now);
        let step = head.action.tick(&mut cx);
        tracing::trace!(action = name, step = ?step, "tick");
        self.settle(&mut inner, id, epoch, name, step, cx)
    }

    /// Apply a continuation's result, unless the queue moved on without it.
    fn resume(&self, id: Uuid, epoch: u64, resume: Resume) {
        let mut inner = self.lock();
        if inner.epoch != epoch {
            tracing::warn!(%id, "continuation dropped: queue was reset while it was in flight");
            return;
        }
        let Some(entry) = inner.entries.iter().find(|e| e.id == id) else {
            tracing::warn!(%id, "continuation dropped: action no longer queued");
            return;
        };
        let name = entry.action.name();
        let mut cx = TickContext::new(Instant::now());
        let step = match panic::catch_unwind(AssertUnwindSafe(|| resume(&mut cx))) {
            Ok(step) => step,
            Err(_) => {
                tracing::error!(action = name, %id, "continuation panicked, dropping action");
                cx = TickContext::new(Instant::now());
                Step::Complete
            }
        };
        tracing::trace!(action = name, step = ?step, "resumed");
        self.settle(&mut inner, id, epoch, name, step, cx);
    }

    /// The continuation's future panicked before producing a [`Resume`].
    fn abandon(&self, id: Uuid, epoch: u64) {
        let mut inner = self.lock();
        if inner.epoch != epoch {
            return;
        }
        let before = inner.entries.len();
        inner.entries.retain(|e| e.id != id);
        if inner.entries.len() != before {
            tracing::error!(%id, "continuation future panicked, dropping action");
        }
    }

    fn settle(
        &self,
        inner: &mut Inner,
        id: Uuid,
        epoch: u64,
        name: &'static str,
        step: Step,
        cx: TickContext,
    ) -> TickOutcome {
        let outcome = match step {
            Step::Continue => {
                set_state(inner, id, ActionState::Pending);
                TickOutcome::Ran {
                    action: name,
                    state: ActionState::Pending,
                }
            }
            Step::Complete => {
                inner.entries.retain(|e| e.id != id);
                tracing::debug!(action = name, "action complete");
                TickOutcome::Ran {
                    action: name,
                    state: ActionState::Complete,
                }
            }
            Step::Suspend(fut) => {
                set_state(inner, id, ActionState::Running);
                let scheduler = self.clone();
                let handle = tokio::spawn(async move {
                    match AssertUnwindSafe(fut).catch_unwind().await {
                        Ok(resume) => scheduler.resume(id, epoch, resume),
                        Err(_) => scheduler.abandon(id, epoch),
                    }
                });
                TickOutcome::Suspended {
                    action: name,
                    handle,
                }
            }
        };

        let (enqueued, reset) = cx.into_parts();
        for action in enqueued {
            push(inner, action);
        }
        if reset {
            drain(inner);
        }
        outcome
    }
}

fn push(inner: &mut Inner, action: Box<dyn Action>) -> Uuid {
    let id = Uuid::new_v4();
    tracing::debug!(action = action.name(), %id, position = inner.entries.len(), "action added");
    inner.entries.push_back(Entry {
        id,
        action,
        state: ActionState::Pending,
    });
    id
}

fn drain(inner: &mut Inner) -> usize {
    let dropped = inner.entries.len();
    inner.entries.clear();
    inner.epoch += 1;
    tracing::info!(dropped, epoch = inner.epoch, "action queue reset");
    dropped
}

fn set_state(inner: &mut Inner, id: Uuid, state: ActionState) {
    if let Some(e) = inner.entries.iter_mut().find(|e| e.id == id) {
        e.state = state;
    }
}
