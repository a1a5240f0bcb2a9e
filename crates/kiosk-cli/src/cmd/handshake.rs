use crate::output::print_json;
use anyhow::Context;
use kiosk_core::config::Settings;
use kiosk_core::protocol::{Directive, HandshakeClient};
use kiosk_core::session::SessionStore;
use kiosk_core::timer::{self, TimerSet};
use serde::Serialize;
use std::path::Path;
use std::time::Duration;

const DEFAULT_CALLOUT: Duration = Duration::from_secs(30);

#[derive(Serialize)]
struct Exchange {
    directive: Directive,
    #[serde(skip_serializing_if = "Option::is_none")]
    timers: Option<TimerSet>,
    debug_payload: bool,
}

/// One round trip with the current session document. Nothing is persisted
/// and no follow-up actions run.
pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let settings = Settings::load(root).context("failed to load settings")?;
    let store = SessionStore::at_root(root);
    let client = HandshakeClient::new(settings.server.handshake_url())?;
    let timeout = timer::TimerTable::new(settings.timers.clone()).get_or(timer::CALLOUT, DEFAULT_CALLOUT);

    let rt = tokio::runtime::Runtime::new()?;
    let response = rt
        .block_on(client.exchange(&store.read(), timeout))
        .with_context(|| format!("handshake with {} failed", client.url()))?;
    let directive = response.directive().context("server sent an unusable directive")?;

    let exchange = Exchange {
        directive,
        timers: response.timers,
        debug_payload: response.debug_payload.is_some(),
    };

    if json {
        return print_json(&exchange);
    }

    println!("Server:    {}", client.url());
    println!("Directive: {:?}", exchange.directive.kind());
    match &exchange.directive {
        Directive::Abort { message: Some(m) } => println!("Message:   {m}"),
        Directive::Sleep { pattern } => {
            println!("Sleep:     {pattern} ({} ms)", pattern.as_millis())
        }
        Directive::Save { file } | Directive::Reset { file } => {
            println!("File:      {}", serde_json::Value::Object(file.clone()))
        }
        _ => {}
    }
    if let Some(timers) = &exchange.timers {
        println!("Timers:    {}", timers.keys().cloned().collect::<Vec<_>>().join(", "));
    }
    if exchange.debug_payload {
        println!("Server attached a debug payload (TMP).");
    }
    Ok(())
}
