//! The handshake round trip.
//!
//! A tick reads the session document and POSTs it; the tick returns at once
//! and the response is applied by a continuation that holds the queue lock.
//! Any transport or decode failure abandons the whole queue.

use std::sync::Arc;
use std::time::Duration;

use crate::context::Context;
use crate::error::Result;
use crate::protocol::{Directive, HandshakeResponse};
use crate::scheduler::{Action, Resume, Step, TickContext};
use crate::session::{self, SessionDocument};
use crate::timer;

use super::computer::{ComputerLogin, ComputerSetup};
use super::pause::Pause;

const DEFAULT_CALLOUT: Duration = Duration::from_secs(30);
const DEFAULT_BREATHE: Duration = Duration::from_secs(1);

pub struct Handshake {
    ctx: Arc<Context>,
}

impl Handshake {
    pub fn new(ctx: Arc<Context>) -> Self {
        tracing::info!("handshake queued");
        Self { ctx }
    }
}

impl Action for Handshake {
    fn name(&self) -> &'static str {
        "handshake"
    }

    fn tick(&mut self, _cx: &mut TickContext) -> Step {
        let ctx = self.ctx.clone();
        let doc = ctx.store.read();
        let timeout = ctx.timer(timer::CALLOUT, DEFAULT_CALLOUT);
        tracing::info!(url = ctx.client.url(), timeout_ms = timeout.as_millis() as u64, "calling server");

        Step::Suspend(Box::pin(async move {
            let result = ctx.client.exchange(&doc, timeout).await;
            let resume: Resume = Box::new(move |cx: &mut TickContext| apply(&ctx, &doc, result, cx));
            resume
        }))
    }
}

/// Interpret a handshake result. `doc` is the document that was sent.
pub(crate) fn apply(
    ctx: &Arc<Context>,
    doc: &SessionDocument,
    result: Result<HandshakeResponse>,
    cx: &mut TickContext,
) -> Step {
    match interpret(ctx, result).and_then(|directive| dispatch(ctx, doc, directive, cx)) {
        Ok(step) => step,
        Err(e) => {
            tracing::error!(error = %e, "error on handshake callout");
            ctx.escalation.handle_critical_error(e);
            cx.reset_queue();
            Step::Complete
        }
    }
}

fn interpret(ctx: &Context, result: Result<HandshakeResponse>) -> Result<Directive> {
    let response = result?;
    if let Some(tmp) = &response.debug_payload {
        tracing::warn!("server produced a debug payload");
        tracing::debug!(payload = %tmp, output = %response.output, "handshake debug payload");
    }
    if let Some(timers) = response.timers.clone() {
        ctx.apply_timers(timers);
    }
    let directive = response.directive()?;
    tracing::info!(directive = ?directive.kind(), "back from server");
    Ok(directive)
}

fn dispatch(
    ctx: &Arc<Context>,
    doc: &SessionDocument,
    directive: Directive,
    cx: &mut TickContext,
) -> Result<Step> {
    let breathe = || ctx.timer(timer::BREATHE, DEFAULT_BREATHE);

    let step = match directive {
        Directive::Abort { message } => {
            tracing::error!(message = message.as_deref().unwrap_or(""), "server aborted the session, quitting");
            ctx.quit();
            Step::Complete
        }
        Directive::Save { file } | Directive::Reset { file } => {
            ctx.store.write(&file)?;
            cx.enqueue(Pause::new(breathe()));
            Step::Complete
        }
        Directive::Setup { payload } => {
            if let Some(id) = session::computer_id(doc) {
                tracing::info!(computer_id = id, "setup skipped, computer already registered");
            } else {
                tracing::info!("setup will be performed");
                cx.enqueue(Pause::new(breathe()));
                cx.enqueue(ComputerSetup::new(Arc::clone(ctx), payload));
            }
            Step::Complete
        }
        Directive::Login { payload } => {
            cx.enqueue(Pause::new(breathe()));
            cx.enqueue(ComputerLogin::new(Arc::clone(ctx), payload));
            Step::Complete
        }
        Directive::Sleep { pattern } => {
            let duration = pattern.resolve();
            tracing::info!(%pattern, duration_ms = duration.as_millis() as u64, "sleep requested");
            cx.enqueue(Pause::new(duration));
            Step::Complete
        }
        Directive::Unknown { tag } => {
            tracing::debug!(action = tag.as_deref().unwrap_or("<none>"), "no directive, polling again");
            Step::Continue
        }
    };
    Ok(step)
}
