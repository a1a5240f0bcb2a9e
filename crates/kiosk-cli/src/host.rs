use std::sync::atomic::{AtomicBool, Ordering};

use kiosk_core::Host;

/// Headless host: window requests become log lines, fatal errors go to
/// stderr, and quitting stops the driver loop.
#[derive(Debug, Default)]
pub struct ConsoleHost {
    quit: AtomicBool,
}

impl ConsoleHost {
    pub fn quit_requested(&self) -> bool {
        self.quit.load(Ordering::SeqCst)
    }
}

impl Host for ConsoleHost {
    fn show_window(&self) {
        tracing::info!("window shown");
    }

    fn hide_window(&self) {
        tracing::info!("window hidden");
    }

    fn quit_application(&self) {
        tracing::info!("quit requested");
        self.quit.store(true, Ordering::SeqCst);
    }

    fn report_fatal_error(&self, message: &str) {
        eprintln!("Critical Error\n{message}");
    }
}
