use std::fmt;

use base64::{Engine, engine::general_purpose::STANDARD};
use rand::{TryRngCore, rngs::OsRng};
use sha2::{Digest, Sha256};
use thiserror::Error;
use zeroize::Zeroizing;

#[derive(Debug, Error)]
pub enum RefreshTokenError {
    #[error("invalid token format")]
    InvalidFormat,
    #[error("token generation failed: {0}")]
    GenerationFailed(String),
}

/// Opaque refresh secret handed to the client.
///
/// Carries no claims; its only meaning is the stored record whose digest
/// matches. The plaintext never reaches the store.
#[derive(Clone, PartialEq, Eq)]
pub struct RefreshToken(Zeroizing<String>);

impl RefreshToken {
    pub const BYTE_LENGTH: usize = 64;

    /// Fresh token: 64 bytes from the OS entropy source, base64 encoded.
    pub fn generate() -> Result<Self, RefreshTokenError> {
        let mut bytes = Zeroizing::new([0u8; Self::BYTE_LENGTH]);
        OsRng
            .try_fill_bytes(bytes.as_mut_slice())
            .map_err(|err| RefreshTokenError::GenerationFailed(err.to_string()))?;

        Ok(Self(Zeroizing::new(STANDARD.encode(bytes.as_slice()))))
    }

    /// Wrap a token presented by a client. Only emptiness is rejected;
    /// anything else simply fails to match a stored digest.
    pub fn from_value(value: &str) -> Result<Self, RefreshTokenError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(RefreshTokenError::InvalidFormat);
        }
        Ok(Self(Zeroizing::new(value.to_string())))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// SHA-256 hex digest used as the storage key.
    pub fn digest(&self) -> String {
        digest_token(self.as_str())
    }

    pub fn into_string(self) -> String {
        self.0.as_str().to_owned()
    }
}

pub(crate) fn digest_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

impl fmt::Debug for RefreshToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RefreshToken(***)")
    }
}
