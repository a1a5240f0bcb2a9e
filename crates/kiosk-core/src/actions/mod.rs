//! The concrete actions the kiosk queues.

pub mod computer;
pub mod handshake;
pub mod pause;

#[cfg(test)]
mod tests;

pub use computer::{ComputerLogin, ComputerSetup};
pub use handshake::Handshake;
pub use pause::Pause;
