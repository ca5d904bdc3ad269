//! API keys and the credentials bound to actors.
//!
//! Secrets are wrapped in `SecretString`, which keeps them out of `Debug`
//! output and zeroes the memory on drop.

use std::fmt;
use std::sync::Arc;

use secrecy::ExposeSecret;
use secrecy::SecretString;

use crate::error::AuthError;
use crate::error::Result;
use crate::signer::SecretKeyAlgorithm;
use crate::signer::SignatureEncoding;

/// Key id and secret as supplied by a credential store
pub struct ApiKey {
    id: Arc<str>,
    secret: SecretString,
}

impl ApiKey {
    pub fn new(id: impl Into<Arc<str>>, secret: impl Into<String>) -> Self {
        Self { id: id.into(), secret: SecretString::from(secret.into()) }
    }

    /// Load a key from environment variables, reading a `.env` file if present
    pub fn from_env(id_var: &str, secret_var: &str) -> Result<Self> {
        dotenvy::dotenv().ok();

        let id = std::env::var(id_var).map_err(|_| AuthError::MissingEnvVar(id_var.to_string()))?;
        let secret = std::env::var(secret_var).map_err(|_| AuthError::MissingEnvVar(secret_var.to_string()))?;

        Ok(Self::new(id, secret))
    }

    pub fn id(&self) -> &Arc<str> {
        &self.id
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKey").field("id", &self.id).field("secret", &"[REDACTED]").finish()
    }
}

/// Signing identity bound to one actor
///
/// Immutable once created. Signs canonical request bytes with the venue's
/// algorithm and encoding.
pub struct Credential {
    api_key_id: Arc<str>,
    secret: SecretString,
    algorithm: SecretKeyAlgorithm,
    encoding: SignatureEncoding,
}

impl Credential {
    pub fn api_key_id(&self) -> &Arc<str> {
        &self.api_key_id
    }

    pub fn algorithm(&self) -> SecretKeyAlgorithm {
        self.algorithm
    }

    pub fn encoding(&self) -> SignatureEncoding {
        self.encoding
    }

    /// Encoded signature of `payload`
    pub fn sign(&self, payload: &[u8]) -> Result<String> {
        let digest = self.algorithm.digest(self.secret.expose_secret().as_bytes(), payload)?;
        Ok(self.encoding.encode(&digest))
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("api_key_id", &self.api_key_id)
            .field("secret", &"[REDACTED]")
            .field("algorithm", &self.algorithm)
            .field("encoding", &self.encoding)
            .finish()
    }
}

/// Turns API keys into credentials for one venue's signing scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CredentialFactory {
    algorithm: SecretKeyAlgorithm,
    encoding: SignatureEncoding,
}

impl CredentialFactory {
    pub fn new(algorithm: SecretKeyAlgorithm, encoding: SignatureEncoding) -> Self {
        Self { algorithm, encoding }
    }

    pub fn create(&self, api_key: ApiKey) -> Credential {
        Credential { api_key_id: api_key.id, secret: api_key.secret, algorithm: self.algorithm, encoding: self.encoding }
    }
}

impl Default for CredentialFactory {
    /// HMAC-SHA256 with lowercase hex, the most common venue scheme
    fn default() -> Self {
        Self::new(SecretKeyAlgorithm::HmacSha256, SignatureEncoding::HexLower)
    }
}
