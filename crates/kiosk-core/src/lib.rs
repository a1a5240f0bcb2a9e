//! `kiosk-core`: the action queue and handshake protocol of the proctoring
//! kiosk client.
//!
//! ```text
//! driver interval ──► KioskClient::tick ──► Scheduler (head action only)
//!                                              │
//!              Handshake ── POST session ──►  server
//!                  │  ◄── {output, timers}  ──┘
//!                  ▼
//!        SAVE/RESET/SETUP/LOGIN/SLEEP ──► Pause + follow-up actions
//!        ABORT ──► Host::quit_application
//!        failure ──► Escalation + queue reset
//! ```

pub mod actions;
pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod escalation;
pub mod host;
pub mod io;
pub mod paths;
pub mod protocol;
pub mod scheduler;
pub mod session;
pub mod timer;

pub use client::KioskClient;
pub use context::Context;
pub use error::{KioskError, Result};
pub use host::{Host, HostMessage, Platform};
