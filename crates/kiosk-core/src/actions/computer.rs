//! Device setup and login.
//!
//! Both bring the kiosk window forward and wait for the host to report a
//! page load (or for the `callout` timer to lapse), then hand control back
//! to a fresh handshake. Their server-side workflows are driven from the
//! page the host loads; the queue only needs them to finish.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;

use crate::context::Context;
use crate::host::HostMessage;
use crate::scheduler::{Action, Step, TickContext};
use crate::timer;

use super::handshake::Handshake;

const DEFAULT_WAIT: Duration = Duration::from_secs(30);

/// Shared progress for the window-driven actions.
struct WindowTask {
    ctx: Arc<Context>,
    payload: Value,
    /// First tick and the `callout` wait armed on it.
    shown: Option<(Instant, Duration)>,
    page_loaded: Option<String>,
}

impl WindowTask {
    fn new(ctx: Arc<Context>, payload: Value) -> Self {
        Self {
            ctx,
            payload,
            shown: None,
            page_loaded: None,
        }
    }

    fn tick(&mut self, name: &'static str, cx: &mut TickContext) -> Step {
        let Some((shown_at, wait)) = self.shown else {
            tracing::info!(action = name, "showing kiosk window");
            tracing::debug!(action = name, payload = %self.payload, "directive payload");
            self.ctx.host.show_window();
            let wait = self.ctx.timer(timer::CALLOUT, DEFAULT_WAIT);
            self.shown = Some((cx.now(), wait));
            return Step::Continue;
        };

        if let Some(url) = &self.page_loaded {
            tracing::info!(action = name, url = %url, "page loaded, resuming handshake");
        } else if cx.now().saturating_duration_since(shown_at) >= wait {
            tracing::warn!(action = name, "no page load reported, resuming handshake");
        } else {
            return Step::Continue;
        }
        cx.enqueue(Handshake::new(self.ctx.clone()));
        Step::Complete
    }

    fn on_message(&mut self, msg: &HostMessage) -> bool {
        match msg {
            HostMessage::PageLoad { url } if self.shown.is_some() => {
                self.page_loaded = Some(url.clone());
                true
            }
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// ComputerSetup
// ---------------------------------------------------------------------------

pub struct ComputerSetup(WindowTask);

impl ComputerSetup {
    pub fn new(ctx: Arc<Context>, payload: Value) -> Self {
        Self(WindowTask::new(ctx, payload))
    }

    pub fn payload(&self) -> &Value {
        &self.0.payload
    }
}

impl Action for ComputerSetup {
    fn name(&self) -> &'static str {
        "computer_setup"
    }

    fn tick(&mut self, cx: &mut TickContext) -> Step {
        self.0.tick("computer_setup", cx)
    }

    fn on_message(&mut self, msg: &HostMessage) -> bool {
        self.0.on_message(msg)
    }
}

// ---------------------------------------------------------------------------
// ComputerLogin
// ---------------------------------------------------------------------------

pub struct ComputerLogin(WindowTask);

impl ComputerLogin {
    pub fn new(ctx: Arc<Context>, payload: Value) -> Self {
        Self(WindowTask::new(ctx, payload))
    }

    pub fn payload(&self) -> &Value {
        &self.0.payload
    }
}

impl Action for ComputerLogin {
    fn name(&self) -> &'static str {
        "computer_login"
    }

    fn tick(&mut self, cx: &mut TickContext) -> Step {
        self.0.tick("computer_login", cx)
    }

    fn on_message(&mut self, msg: &HostMessage) -> bool {
        self.0.on_message(msg)
    }
}
