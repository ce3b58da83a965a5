// crates/types/src/envelope.rs
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Standard `{success, message, data}` wrapper returned by the backend.
///
/// All three fields are optional on the wire: the backend contract says a
/// missing `success` or `data` is a failure, so the check happens on the
/// client side through [`Envelope::require_success`] and
/// [`Envelope::require_data`] rather than at decode time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

/// Ways an envelope can fail the response contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvelopeError {
    #[error("response is missing the success flag")]
    MissingSuccessFlag,

    #[error("backend reported failure: {}", .0.as_deref().unwrap_or("no message"))]
    NotSuccessful(Option<String>),

    #[error("response is missing data")]
    MissingData,
}

impl<T> Envelope<T> {
    /// Successful envelope carrying `data`.
    pub fn ok(data: T) -> Self {
        Self {
            success: Some(true),
            message: None,
            data: Some(data),
        }
    }

    /// Envelope with `success: false` and no data.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: Some(false),
            message: Some(message.into()),
            data: None,
        }
    }

    /// `true` only when the backend explicitly set `success: true`.
    pub fn is_success(&self) -> bool {
        self.success == Some(true)
    }

    /// Take `data`, ignoring the success flag.
    pub fn require_data(self) -> Result<T, EnvelopeError> {
        self.data.ok_or(EnvelopeError::MissingData)
    }

    /// Take `data`, requiring `success: true` as well.
    pub fn require_success(self) -> Result<T, EnvelopeError> {
        match self.success {
            None => Err(EnvelopeError::MissingSuccessFlag),
            Some(false) => Err(EnvelopeError::NotSuccessful(self.message)),
            Some(true) => self.require_data(),
        }
    }
}
