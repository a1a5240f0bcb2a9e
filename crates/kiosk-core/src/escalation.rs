//! Terminal sink for fatal conditions.
//!
//! Everything that reaches [`Escalation::handle_critical_error`] is fatal to
//! the current cycle. The report is always logged; it is shown to the user
//! only when `interrupt_with_dialog` is enabled.

use std::backtrace::{Backtrace, BacktraceStatus};
use std::fmt;
use std::panic::Location;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::error::KioskError;
use crate::host::Host;

/// What went wrong: a typed error or a bare message.
#[derive(Debug)]
pub enum Critical {
    Error(Box<dyn std::error::Error + Send + Sync>),
    Message(String),
}

impl From<KioskError> for Critical {
    fn from(e: KioskError) -> Self {
        Critical::Error(Box::new(e))
    }
}

impl From<String> for Critical {
    fn from(s: String) -> Self {
        Critical::Message(s)
    }
}

impl From<&str> for Critical {
    fn from(s: &str) -> Self {
        Critical::Message(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// FatalReport
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct FatalReport {
    pub message: String,
    /// `file:line` of the code that escalated.
    pub origin: String,
    /// Error source chain, or a captured backtrace for bare messages.
    pub trace: Vec<String>,
}

impl fmt::Display for FatalReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {}", self.message, self.origin)?;
        for line in &self.trace {
            write!(f, "\n  {line}")?;
        }
        Ok(())
    }
}

impl FatalReport {
    fn build(critical: Critical, origin: &Location<'_>) -> Self {
        let origin = format!("{}:{}", origin.file(), origin.line());
        match critical {
            Critical::Error(err) => {
                let mut trace = Vec::new();
                let mut source = err.source();
                while let Some(s) = source {
                    trace.push(format!("caused by: {s}"));
                    source = s.source();
                }
                FatalReport {
                    message: err.to_string(),
                    origin,
                    trace,
                }
            }
            Critical::Message(message) => {
                let bt = Backtrace::capture();
                let trace = match bt.status() {
                    BacktraceStatus::Captured => {
                        bt.to_string().lines().map(str::to_string).collect()
                    }
                    _ => Vec::new(),
                };
                FatalReport {
                    message,
                    origin,
                    trace,
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Escalation
// ---------------------------------------------------------------------------

pub struct Escalation {
    host: Arc<dyn Host>,
    interrupt_with_dialog: bool,
    count: AtomicUsize,
}

impl fmt::Debug for Escalation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Escalation")
            .field("interrupt_with_dialog", &self.interrupt_with_dialog)
            .field("count", &self.count())
            .finish()
    }
}

impl Escalation {
    pub fn new(host: Arc<dyn Host>, interrupt_with_dialog: bool) -> Self {
        Self {
            host,
            interrupt_with_dialog,
            count: AtomicUsize::new(0),
        }
    }

    #[track_caller]
    pub fn handle_critical_error(&self, critical: impl Into<Critical>) -> FatalReport {
        let report = FatalReport::build(critical.into(), Location::caller());
        self.count.fetch_add(1, Ordering::SeqCst);

        tracing::error!(origin = %report.origin, "{}", report.message);
        for line in &report.trace {
            tracing::trace!("{line}");
        }

        if self.interrupt_with_dialog {
            self.host.report_fatal_error(&report.to_string());
        } else {
            tracing::debug!("fatal dialog suppressed by configuration");
        }
        report
    }

    /// Number of conditions escalated since startup.
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}
