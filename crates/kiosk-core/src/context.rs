use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use crate::config::Settings;
use crate::error::Result;
use crate::escalation::Escalation;
use crate::host::{Host, Platform};
use crate::protocol::HandshakeClient;
use crate::session::SessionStore;
use crate::timer::{TimerSet, TimerTable};

/// Everything an action may touch, handed to each action at construction.
///
/// `settings` is the startup snapshot and never changes; the timer table is
/// the one piece of configuration the server can replace at runtime.
pub struct Context {
    pub settings: Settings,
    pub store: SessionStore,
    pub client: HandshakeClient,
    pub host: Arc<dyn Host>,
    pub escalation: Escalation,
    pub platform: Platform,
    timers: RwLock<TimerTable>,
    prevent_quit: AtomicBool,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("settings", &self.settings)
            .field("store", &self.store)
            .field("client", &self.client)
            .field("platform", &self.platform)
            .finish_non_exhaustive()
    }
}

impl Context {
    /// Build a context for the kiosk installed at `root`.
    pub fn new(root: &Path, settings: Settings, host: Arc<dyn Host>) -> Result<Self> {
        let client = HandshakeClient::new(settings.server.handshake_url())?;
        Ok(Self::from_parts(
            settings,
            SessionStore::at_root(root),
            client,
            host,
        ))
    }

    pub fn from_parts(
        settings: Settings,
        store: SessionStore,
        client: HandshakeClient,
        host: Arc<dyn Host>,
    ) -> Self {
        let timers = TimerTable::new(settings.timers.clone());
        let escalation = Escalation::new(host.clone(), settings.debug.interrupt_with_dialog);
        let prevent_quit = AtomicBool::new(settings.debug.prevent_quit);
        Self {
            settings,
            store,
            client,
            host,
            escalation,
            platform: Platform::current(),
            timers: RwLock::new(timers),
            prevent_quit,
        }
    }

    pub fn timers(&self) -> TimerTable {
        self.timers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Resolved value of timer `name`, or `fallback` when it is not configured.
    pub fn timer(&self, name: &str, fallback: Duration) -> Duration {
        let table = self.timers.read().unwrap_or_else(PoisonError::into_inner);
        match table.get(name) {
            Some(d) => d,
            None => {
                tracing::warn!(timer = name, fallback_ms = fallback.as_millis() as u64, "timer not configured");
                fallback
            }
        }
    }

    pub fn apply_timers(&self, set: TimerSet) {
        let mut table = self.timers.write().unwrap_or_else(PoisonError::into_inner);
        table.apply(set);
        tracing::info!(timers = table.len(), "timer set updated");
    }

    pub fn prevent_quit(&self) -> bool {
        self.prevent_quit.load(Ordering::SeqCst)
    }

    pub fn set_prevent_quit(&self, on: bool) {
        self.prevent_quit.store(on, Ordering::SeqCst);
    }

    /// Lift quit prevention and ask the host to terminate.
    pub fn quit(&self) {
        self.set_prevent_quit(false);
        self.host.quit_application();
    }
}
