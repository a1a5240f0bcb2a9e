use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::error::Result;
use crate::{io, paths};

/// The persisted identity document sent with every handshake.
///
/// Opaque to the client apart from `computerId`, which the server assigns
/// once the device has been set up.
pub type SessionDocument = Map<String, Value>;

pub const COMPUTER_ID: &str = "computerId";

/// Return the document's `computerId` when it is a non-empty string.
pub fn computer_id(doc: &SessionDocument) -> Option<&str> {
    doc.get(COMPUTER_ID)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

// ─── SessionStore ─────────────────────────────────────────────────────────

/// Reads and writes the session document on disk.
///
/// Reads never fail: a missing or corrupt file heals to an empty document.
/// Writes go through [`io::atomic_write`].
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        SessionStore { path: path.into() }
    }

    /// Store rooted at `<root>/data/electron.json`.
    pub fn at_root(root: &Path) -> Self {
        Self::new(paths::session_path(root))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read(&self) -> SessionDocument {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no session document yet");
                return SessionDocument::new();
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "session document unreadable, using empty");
                return SessionDocument::new();
            }
        };
        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(doc)) => doc,
            Ok(other) => {
                tracing::warn!(
                    path = %self.path.display(),
                    kind = json_kind(&other),
                    "session document is not an object, using empty"
                );
                SessionDocument::new()
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "session document corrupt, using empty");
                SessionDocument::new()
            }
        }
    }

    pub fn write(&self, doc: &SessionDocument) -> Result<()> {
        let data = serde_json::to_vec_pretty(doc)?;
        io::atomic_write(&self.path, &data)?;
        tracing::info!(path = %self.path.display(), keys = doc.len(), "session document saved");
        Ok(())
    }

    /// Delete the stored document (no-op if none exists).
    pub fn clear(&self) -> Result<()> {
        if io::remove_if_exists(&self.path)? {
            tracing::info!(path = %self.path.display(), "session document cleared");
        }
        Ok(())
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────
