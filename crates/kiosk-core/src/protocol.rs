//! Handshake wire protocol.
//!
//! The client POSTs its session document as JSON and receives
//! `{output: {action, file?, message?, pattern?}, timers?, TMP?}`. The
//! `action` string is decoded into a closed [`Directive`] at this boundary;
//! anything unrecognized becomes [`Directive::Unknown`].

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{KioskError, Result};
use crate::session::SessionDocument;
use crate::timer::{TimerPattern, TimerSet};

// ---------------------------------------------------------------------------
// HandshakeResponse
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct HandshakeResponse {
    pub output: Value,
    #[serde(default)]
    pub timers: Option<TimerSet>,
    /// Server-side debug payload. Logged, never acted on.
    #[serde(rename = "TMP", default)]
    pub debug_payload: Option<Value>,
}

impl HandshakeResponse {
    pub fn parse(body: &str) -> Result<Self> {
        serde_json::from_str(body).map_err(|e| KioskError::Decode(e.to_string()))
    }

    pub fn directive(&self) -> Result<Directive> {
        Directive::decode(&self.output)
    }
}

// ---------------------------------------------------------------------------
// Directive
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DirectiveKind {
    Abort,
    Save,
    Reset,
    Setup,
    Login,
    Sleep,
    #[serde(other)]
    Unknown,
}

/// A decoded server instruction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "UPPERCASE")]
pub enum Directive {
    Abort { message: Option<String> },
    Save { file: SessionDocument },
    /// Same effect as `Save`: the server hands back a replacement identity.
    Reset { file: SessionDocument },
    Setup { payload: Value },
    Login { payload: Value },
    Sleep { pattern: TimerPattern },
    Unknown { tag: Option<String> },
}

impl Directive {
    pub fn decode(output: &Value) -> Result<Self> {
        let obj = output
            .as_object()
            .ok_or_else(|| KioskError::Decode("`output` is not an object".into()))?;

        let tag = obj.get("action").and_then(Value::as_str);
        let kind = tag
            .map(|t| {
                serde_json::from_value::<DirectiveKind>(Value::String(t.to_string()))
                    .unwrap_or(DirectiveKind::Unknown)
            })
            .unwrap_or(DirectiveKind::Unknown);

        let directive = match kind {
            DirectiveKind::Abort => Directive::Abort {
                message: obj.get("message").map(|m| match m {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                }),
            },
            DirectiveKind::Save => Directive::Save {
                file: document_field(obj, "SAVE")?,
            },
            DirectiveKind::Reset => Directive::Reset {
                file: document_field(obj, "RESET")?,
            },
            DirectiveKind::Setup => Directive::Setup {
                payload: output.clone(),
            },
            DirectiveKind::Login => Directive::Login {
                payload: output.clone(),
            },
            DirectiveKind::Sleep => {
                let raw = obj
                    .get("pattern")
                    .cloned()
                    .ok_or_else(|| KioskError::Decode("SLEEP without `pattern`".into()))?;
                let pattern = serde_json::from_value::<TimerPattern>(raw)
                    .map_err(|e| KioskError::Decode(format!("SLEEP pattern: {e}")))?;
                Directive::Sleep { pattern }
            }
            DirectiveKind::Unknown => Directive::Unknown {
                tag: tag.map(str::to_string),
            },
        };
        Ok(directive)
    }

    pub fn kind(&self) -> DirectiveKind {
        match self {
            Self::Abort { .. } => DirectiveKind::Abort,
            Self::Save { .. } => DirectiveKind::Save,
            Self::Reset { .. } => DirectiveKind::Reset,
            Self::Setup { .. } => DirectiveKind::Setup,
            Self::Login { .. } => DirectiveKind::Login,
            Self::Sleep { .. } => DirectiveKind::Sleep,
            Self::Unknown { .. } => DirectiveKind::Unknown,
        }
    }
}

fn document_field(obj: &serde_json::Map<String, Value>, action: &str) -> Result<SessionDocument> {
    match obj.get("file") {
        Some(Value::Object(file)) => Ok(file.clone()),
        Some(_) => Err(KioskError::Decode(format!("{action} `file` is not an object"))),
        None => Err(KioskError::Decode(format!("{action} without `file`"))),
    }
}

// ---------------------------------------------------------------------------
// HandshakeClient
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct HandshakeClient {
    http: reqwest::Client,
    url: String,
}

impl HandshakeClient {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("kiosk/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// POST `doc` and decode the response. Non-2xx statuses and bodies that
    /// are not a handshake response are errors.
    pub async fn exchange(
        &self,
        doc: &SessionDocument,
        timeout: Duration,
    ) -> Result<HandshakeResponse> {
        let resp = self
            .http
            .post(&self.url)
            .timeout(timeout)
            .json(doc)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(KioskError::Status {
                status: status.as_u16(),
                url: self.url.clone(),
            });
        }
        let body = resp.text().await?;
        HandshakeResponse::parse(&body)
    }
}
