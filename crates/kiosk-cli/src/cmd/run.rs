use anyhow::Context as _;
use kiosk_core::config::Settings;
use kiosk_core::{timer, Context, KioskClient};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::host::ConsoleHost;

const DEFAULT_TICK: Duration = Duration::from_millis(250);

pub fn run(root: &Path) -> anyhow::Result<()> {
    let settings = Settings::load(root).context("failed to load settings")?;
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(drive(root, settings))
}

async fn drive(root: &Path, settings: Settings) -> anyhow::Result<()> {
    let host = Arc::new(ConsoleHost::default());
    let ctx = Arc::new(
        Context::new(root, settings, host.clone()).context("failed to build kiosk client")?,
    );
    let client = KioskClient::new(ctx.clone());
    client.start();

    loop {
        // Re-read every iteration: the server may push a new tick period.
        let period = ctx.timer(timer::TICK, DEFAULT_TICK);
        tokio::select! {
            _ = tokio::time::sleep(period) => {
                client.tick();
            }
            signal = tokio::signal::ctrl_c() => {
                signal.context("failed to listen for ctrl-c")?;
                if ctx.prevent_quit() {
                    ctx.escalation.handle_critical_error("The kiosk can't be closed");
                } else {
                    ctx.quit();
                }
            }
        }

        if host.quit_requested() {
            tracing::info!(queued = client.scheduler().len(), "kiosk client stopped");
            break;
        }
    }
    Ok(())
}
