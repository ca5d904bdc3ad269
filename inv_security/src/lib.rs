//! Credentials and request signing for venue APIs.
//!
//! An [`ApiKey`] is what a credential store hands over. A [`CredentialFactory`]
//! configured with the venue's algorithm and encoding turns it into a
//! [`Credential`] that signs canonical request bytes.
//!
//! # Example
//!
//! ```rust,ignore
//! use inv_security::{ApiKey, CredentialFactory, SecretKeyAlgorithm, SignatureEncoding};
//!
//! let factory = CredentialFactory::new(SecretKeyAlgorithm::HmacSha256, SignatureEncoding::HexLower);
//! let credential = factory.create(ApiKey::new("key-id", "secret"));
//! let signature = credential.sign(b"1588591511721GET/api/markets")?;
//! ```

mod credential;
mod error;
mod signer;

pub use credential::ApiKey;
pub use credential::Credential;
pub use credential::CredentialFactory;
pub use error::AuthError;
pub use error::Result;
pub use signer::SecretKeyAlgorithm;
pub use signer::SignatureEncoding;
