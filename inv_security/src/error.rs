use thiserror::Error;

/// Errors raised while binding or using credentials
#[derive(Debug, Error)]
pub enum AuthError {
    /// A required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    /// The secret cannot be used as a key for the configured algorithm.
    #[error("Invalid secret key for {0}")]
    InvalidSecret(&'static str),

    /// The request needs a signature but the actor has no credential bound.
    #[error("Request requires authentication but no credential is bound")]
    MissingCredential,

    /// The venue refused the signature or key.
    #[error("Credential rejected by venue (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },
}

pub type Result<T> = std::result::Result<T, AuthError>;
