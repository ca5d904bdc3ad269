//! Keyed-hash signatures over canonical request bytes.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hmac::Hmac;
use hmac::Mac;
use serde::Deserialize;
use serde::Serialize;
use sha2::Sha256;
use sha2::Sha384;
use sha2::Sha512;

use crate::error::AuthError;
use crate::error::Result;

/// Keyed-hash algorithm a venue expects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecretKeyAlgorithm {
    HmacSha256,
    HmacSha384,
    HmacSha512,
}

impl SecretKeyAlgorithm {
    pub fn name(&self) -> &'static str {
        match self {
            SecretKeyAlgorithm::HmacSha256 => "HMAC-SHA256",
            SecretKeyAlgorithm::HmacSha384 => "HMAC-SHA384",
            SecretKeyAlgorithm::HmacSha512 => "HMAC-SHA512",
        }
    }

    /// Raw MAC of `payload` keyed with `secret`
    pub fn digest(&self, secret: &[u8], payload: &[u8]) -> Result<Vec<u8>> {
        match self {
            SecretKeyAlgorithm::HmacSha256 => mac::<Hmac<Sha256>>(secret, payload, self.name()),
            SecretKeyAlgorithm::HmacSha384 => mac::<Hmac<Sha384>>(secret, payload, self.name()),
            SecretKeyAlgorithm::HmacSha512 => mac::<Hmac<Sha512>>(secret, payload, self.name()),
        }
    }
}

fn mac<M: Mac + hmac::digest::KeyInit>(secret: &[u8], payload: &[u8], name: &'static str) -> Result<Vec<u8>> {
    let mut mac = <M as Mac>::new_from_slice(secret).map_err(|_| AuthError::InvalidSecret(name))?;
    mac.update(payload);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Text encoding of the signature bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignatureEncoding {
    HexLower,
    HexUpper,
    Base64,
}

impl SignatureEncoding {
    pub fn encode(&self, bytes: &[u8]) -> String {
        match self {
            SignatureEncoding::HexLower => hex::encode(bytes),
            SignatureEncoding::HexUpper => hex::encode_upper(bytes),
            SignatureEncoding::Base64 => BASE64.encode(bytes),
        }
    }
}
