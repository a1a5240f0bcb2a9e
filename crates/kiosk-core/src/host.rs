//! The desktop shell the kiosk runs inside.
//!
//! Window management, dialogs and process lifetime belong to the host; the
//! core only reaches them through [`Host`].

use serde::{Deserialize, Serialize};
use std::fmt;

pub trait Host: Send + Sync {
    fn show_window(&self);
    fn hide_window(&self);
    /// Terminate the application. Quit prevention no longer applies.
    fn quit_application(&self);
    /// Display a fatal error to the user.
    fn report_fatal_error(&self, message: &str);
}

// ---------------------------------------------------------------------------
// HostMessage
// ---------------------------------------------------------------------------

/// Messages the host UI pushes into the core outside the tick cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum HostMessage {
    StartApp,
    ShowWindow,
    HideWindow,
    PageLoad { url: String },
    Other(serde_json::Value),
}

impl HostMessage {
    /// Decode a UI message of the shape `{"type": "...", ...}`. Anything
    /// unrecognized is kept raw.
    pub fn from_value(value: serde_json::Value) -> Self {
        let kind = value.get("type").and_then(|t| t.as_str());
        match kind {
            Some("StartApp") => Self::StartApp,
            Some("ShowWindow") => Self::ShowWindow,
            Some("HideWindow") => Self::HideWindow,
            Some("PageLoad") => match value.get("newUrl").and_then(|u| u.as_str()) {
                Some(url) => Self::PageLoad {
                    url: url.to_string(),
                },
                None => Self::Other(value),
            },
            _ => Self::Other(value),
        }
    }

    pub fn kind(&self) -> &str {
        match self {
            Self::StartApp => "StartApp",
            Self::ShowWindow => "ShowWindow",
            Self::HideWindow => "HideWindow",
            Self::PageLoad { .. } => "PageLoad",
            Self::Other(v) => v.get("type").and_then(|t| t.as_str()).unwrap_or("unknown"),
        }
    }
}

// ---------------------------------------------------------------------------
// Platform
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Mac,
    Windows,
    Linux,
    Other,
}

impl Platform {
    pub fn from_os(os: &str) -> Self {
        match os {
            "macos" => Self::Mac,
            "windows" => Self::Windows,
            "linux" => Self::Linux,
            _ => Self::Other,
        }
    }

    pub fn current() -> Self {
        Self::from_os(std::env::consts::OS)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mac => "MAC",
            Self::Windows => "WINDOWS",
            Self::Linux => "LINUX",
            Self::Other => "OTHER",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
