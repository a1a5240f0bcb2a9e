use std::time::{Duration, Instant};

use crate::scheduler::{Action, Step, TickContext};

/// Blocks the queue for at least `duration`.
///
/// The clock starts on the first tick; precision is bounded by the tick
/// interval of whoever drives the scheduler. Elapsed time is compared with
/// `duration` and never added to an `Instant`.
#[derive(Debug, Clone)]
pub struct Pause {
    duration: Duration,
    started: Option<Instant>,
}

impl Pause {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            started: None,
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl Action for Pause {
    fn name(&self) -> &'static str {
        "pause"
    }

    fn tick(&mut self, cx: &mut TickContext) -> Step {
        match self.started {
            None => {
                self.started = Some(cx.now());
                tracing::debug!(duration_ms = self.duration.as_millis() as u64, "pause started");
                Step::Continue
            }
            Some(started) if cx.now().saturating_duration_since(started) >= self.duration => {
                tracing::debug!(duration_ms = self.duration.as_millis() as u64, "pause elapsed");
                Step::Complete
            }
            Some(_) => Step::Continue,
        }
    }
}
