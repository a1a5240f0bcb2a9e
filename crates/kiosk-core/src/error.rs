use thiserror::Error;

#[derive(Debug, Error)]
pub enum KioskError {
    #[error("handshake transport failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server returned HTTP {status} for {url}")]
    Status { status: u16, url: String },

    #[error("malformed handshake response: {0}")]
    Decode(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, KioskError>;
