use std::sync::Arc;
use std::time::Duration;

use crate::actions::{Handshake, Pause};
use crate::context::Context;
use crate::host::HostMessage;
use crate::scheduler::{Scheduler, TickOutcome};
use crate::timer;

const DEFAULT_BREATHE: Duration = Duration::from_secs(1);

/// The host-facing entry point: owns the queue and the context, restarts the
/// handshake cycle when the queue runs dry, and routes UI messages.
#[derive(Debug, Clone)]
pub struct KioskClient {
    ctx: Arc<Context>,
    scheduler: Scheduler,
}

impl KioskClient {
    pub fn new(ctx: Arc<Context>) -> Self {
        Self {
            ctx,
            scheduler: Scheduler::new(),
        }
    }

    pub fn context(&self) -> &Arc<Context> {
        &self.ctx
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Queue the first handshake.
    pub fn start(&self) {
        tracing::info!(
            platform = %self.ctx.platform,
            server = self.ctx.client.url(),
            "kiosk client starting"
        );
        self.scheduler.add(Handshake::new(self.ctx.clone()));
    }

    /// One driver tick. An idle queue is refilled with a breathing pause and
    /// a fresh handshake before the head runs.
    pub fn tick(&self) -> TickOutcome {
        if self.scheduler.is_empty() {
            tracing::debug!("queue idle, restarting handshake cycle");
            let breathe = self.ctx.timer(timer::BREATHE, DEFAULT_BREATHE);
            self.scheduler.add(Pause::new(breathe));
            self.scheduler.add(Handshake::new(self.ctx.clone()));
        }
        self.scheduler.tick()
    }

    /// Side channel from the host UI; runs interleaved with ticks.
    pub fn handle_message(&self, msg: HostMessage) {
        tracing::debug!(kind = msg.kind(), "message from host");
        match msg {
            HostMessage::StartApp => {
                self.ctx.set_prevent_quit(self.ctx.settings.debug.prevent_quit);
            }
            HostMessage::ShowWindow => self.ctx.host.show_window(),
            HostMessage::HideWindow => self.ctx.host.hide_window(),
            other => {
                if !self.scheduler.offer_message(&other) {
                    tracing::debug!(kind = other.kind(), "message not consumed");
                }
            }
        }
    }
}
