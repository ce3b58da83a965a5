// crates/client/src/error.rs
use std::path::PathBuf;

use datadesk_types::EnvelopeError;
use thiserror::Error;

/// Fallback text when an error carries nothing worth showing.
pub const UNKNOWN_ERROR: &str = "Erro desconhecido";

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status}: {}", detail.as_deref().unwrap_or("no detail"))]
    Status { status: u16, detail: Option<String> },

    #[error("Invalid JSON from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("Malformed response: {0}")]
    Envelope(#[from] EnvelopeError),

    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid base URL {url}: {message}")]
    InvalidBaseUrl { url: String, message: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ClientError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Text shown to the user for this failure.
    ///
    /// Prefers what the backend said (`detail` or envelope message) over the
    /// technical display string.
    pub fn user_message(&self) -> String {
        let msg = match self {
            Self::Status {
                detail: Some(detail),
                ..
            } => detail.clone(),
            Self::Envelope(EnvelopeError::NotSuccessful(Some(message))) => message.clone(),
            other => other.to_string(),
        };
        if msg.trim().is_empty() {
            UNKNOWN_ERROR.to_string()
        } else {
            msg
        }
    }

    /// HTTP status code, when the backend answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Pull FastAPI's `detail` out of an error body.
///
/// `detail` is a plain string for `HTTPException` and a list of objects for
/// request-validation errors; the latter is kept as compact JSON.
pub(crate) fn extract_detail(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    match value.get("detail")? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }
}
