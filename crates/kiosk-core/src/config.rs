use crate::error::Result;
use crate::paths;
use crate::timer::{self, Timer, TimerPattern, TimerSet};
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// ServerConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_ping_server")]
    pub ping_server: String,
}

fn default_ping_server() -> String {
    "http://localhost:3000".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            ping_server: default_ping_server(),
        }
    }
}

impl ServerConfig {
    pub fn handshake_url(&self) -> String {
        paths::server_url(&self.ping_server, paths::HANDSHAKE_ROUTE)
    }
}

// ---------------------------------------------------------------------------
// LogMode
// ---------------------------------------------------------------------------

/// Log verbosity as configured by the deployment.
///
/// `data` and `stack` are the kiosk's most verbose settings and both map to
/// `trace`. Unknown strings fall back to `fatal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogMode {
    Fatal,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
    Data,
    Stack,
}

impl LogMode {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Self::Error,
            "warn" => Self::Warn,
            "info" => Self::Info,
            "debug" => Self::Debug,
            "trace" => Self::Trace,
            "data" => Self::Data,
            "stack" => Self::Stack,
            _ => Self::Fatal,
        }
    }

    /// The `tracing` level this mode enables.
    pub fn level(&self) -> tracing::Level {
        match self {
            Self::Fatal | Self::Error => tracing::Level::ERROR,
            Self::Warn => tracing::Level::WARN,
            Self::Info => tracing::Level::INFO,
            Self::Debug => tracing::Level::DEBUG,
            Self::Trace | Self::Data | Self::Stack => tracing::Level::TRACE,
        }
    }
}

fn deserialize_log_mode<'de, D>(d: D) -> std::result::Result<LogMode, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(d)?;
    Ok(raw.as_deref().map(LogMode::parse).unwrap_or(LogMode::Fatal))
}

// ---------------------------------------------------------------------------
// DebugConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebugConfig {
    #[serde(default = "default_mode", deserialize_with = "deserialize_log_mode")]
    pub mode: LogMode,
    /// Show fatal errors to the user. Off by default so candidates are not
    /// interrupted mid-exam.
    #[serde(default)]
    pub interrupt_with_dialog: bool,
    #[serde(default = "default_prevent_quit")]
    pub prevent_quit: bool,
}

fn default_mode() -> LogMode {
    LogMode::Fatal
}

fn default_prevent_quit() -> bool {
    true
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            interrupt_with_dialog: false,
            prevent_quit: default_prevent_quit(),
        }
    }
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

fn default_timers() -> TimerSet {
    [
        (timer::CALLOUT, TimerPattern::new(0, 30, 0)),
        (timer::BREATHE, TimerPattern::new(0, 1, 0)),
        (timer::TICK, TimerPattern::new(0, 0, 250)),
    ]
    .into_iter()
    .map(|(name, p)| (name.to_string(), Timer::new(p)))
    .collect()
}

/// Startup configuration, read once from `data/kiosk.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default = "default_timers")]
    pub timers: TimerSet,
    #[serde(default)]
    pub debug: DebugConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            timers: default_timers(),
            debug: DebugConfig::default(),
        }
    }
}

impl Settings {
    /// Load settings for `root`. A missing file yields defaults; a file that
    /// exists but does not parse is an error.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::settings_path(root);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        let settings: Settings = serde_yaml::from_str(&data)?;
        Ok(settings)
    }
}
