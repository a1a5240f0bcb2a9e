pub mod handshake;
pub mod run;
pub mod session;
pub mod timers;
