use inv_ratelimit::RateLimitError;
use inv_security::AuthError;
use thiserror::Error;

/// Failure of the underlying transport, never retried here
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Unexpected HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Transport does not handle {0} endpoints")]
    UnsupportedScheme(String),

    #[error("Transport failure: {0}")]
    Other(String),
}

/// Outcome of a failed [`crate::Actor::execute`]
///
/// Quota timeouts, credential problems and transport failures stay distinct so
/// callers can pick a different backoff for each.
#[derive(Error, Debug)]
pub enum ActorError {
    #[error(transparent)]
    Quota(#[from] RateLimitError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ActorError {
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, ActorError::Quota(err) if err.is_quota_exceeded())
    }
}

pub type Result<T> = std::result::Result<T, ActorError>;
