use std::sync::Arc;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SessionError>;

/// Why a payload could not be assigned to any descriptor
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    #[error("payload is not a JSON object")]
    NotAnObject,

    #[error("missing string field `{0}`")]
    MissingDiscriminant(Arc<str>),

    #[error("no channel registered for event `{event}` on `{channel}`")]
    NoDescriptorMatched { event: String, channel: String },
}

#[derive(Error, Debug)]
pub enum ClassifyError {
    #[error("Push message rejected, {reason}: {payload}")]
    Rejected { reason: RejectReason, payload: String },

    #[error("Push message matched `{route}` but failed to decode: {source}")]
    Deserialization { route: Arc<str>, source: serde_json::Error },
}

impl ClassifyError {
    pub fn is_rejected(&self) -> bool {
        matches!(self, ClassifyError::Rejected { .. })
    }

    pub(crate) fn rejected(reason: RejectReason, payload: &str) -> Self {
        ClassifyError::Rejected { reason, payload: payload.to_string() }
    }
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Subscription frame could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Subscription not admitted: {0}")]
    Admission(#[from] inv_http::ActorError),

    #[error("Session is not connected")]
    NotConnected,

    #[error("No channel descriptor named `{0}`")]
    UnknownChannel(String),
}
