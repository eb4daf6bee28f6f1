use argon2::{Algorithm, Argon2, Params, Version};
use base64::{Engine, engine::general_purpose::STANDARD};
use constant_time_eq::constant_time_eq;
use once_cell::sync::OnceCell;
use rand::{TryRngCore, rngs::OsRng};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::fmt;
use thiserror::Error;
use zeroize::Zeroizing;

use crate::domain::users::value_objects::{RawPassword, ValidationError};

/// Key-derivation scheme used for newly created credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PasswordAlgorithm {
    /// PBKDF2-HMAC-SHA256, credential version 1.
    Pbkdf2Sha256,
    /// Argon2id, credential version 2.
    Argon2id,
}

impl PasswordAlgorithm {
    pub fn version(&self) -> u8 {
        match self {
            Self::Pbkdf2Sha256 => PasswordHasher::PBKDF2_VERSION,
            Self::Argon2id => PasswordHasher::ARGON2_VERSION,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pbkdf2Sha256 => "pbkdf2-sha256",
            Self::Argon2id => "argon2id",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pbkdf2-sha256" | "pbkdf2" => Some(Self::Pbkdf2Sha256),
            "argon2id" | "argon2" => Some(Self::Argon2id),
            _ => None,
        }
    }
}

impl fmt::Display for PasswordAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cost parameters for new credentials.
///
/// `iterations` is the PBKDF2 round count, or the Argon2 time cost when
/// the algorithm is Argon2id. `memory_kib` and `parallelism` only apply to
/// Argon2id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HasherSettings {
    pub algorithm: PasswordAlgorithm,
    pub iterations: u32,
    pub memory_kib: u32,
    pub parallelism: u32,
}

impl HasherSettings {
    pub const DEFAULT_PBKDF2_ITERATIONS: u32 = 310_000;
    /// Lowest PBKDF2 round count accepted from configuration.
    pub const MIN_PBKDF2_ITERATIONS: u32 = 100_000;
    pub const DEFAULT_ARGON2_MEMORY_KIB: u32 = 64 * 1024; // 64 MiB
    pub const DEFAULT_ARGON2_ITERATIONS: u32 = 3;

    pub fn pbkdf2(iterations: u32) -> Self {
        Self {
            algorithm: PasswordAlgorithm::Pbkdf2Sha256,
            iterations,
            memory_kib: 0,
            parallelism: 0,
        }
    }

    pub fn argon2id(iterations: u32, memory_kib: u32, parallelism: u32) -> Self {
        Self {
            algorithm: PasswordAlgorithm::Argon2id,
            iterations,
            memory_kib,
            parallelism,
        }
    }
}

impl Default for HasherSettings {
    fn default() -> Self {
        Self::pbkdf2(Self::DEFAULT_PBKDF2_ITERATIONS)
    }
}

/// Stored password material.
///
/// Immutable once built. A password change produces a new credential;
/// nothing ever edits one in place.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordCredential {
    version: u8,
    iterations: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    memory_kib: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parallelism: Option<u32>,
    salt: String,
    hash: String,
}

impl PasswordCredential {
    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn memory_kib(&self) -> Option<u32> {
        self.memory_kib
    }

    pub fn parallelism(&self) -> Option<u32> {
        self.parallelism
    }

    /// Base64 salt.
    pub fn salt(&self) -> &str {
        &self.salt
    }

    /// Base64 derived key.
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// JSON form suitable for a single text column.
    pub fn serialize(&self) -> Result<String, PasswordHashError> {
        serde_json::to_string(self).map_err(PasswordHashError::from)
    }

    pub fn deserialize(stored: &str) -> Result<Self, PasswordHashError> {
        serde_json::from_str(stored).map_err(PasswordHashError::from)
    }
}

impl fmt::Debug for PasswordCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordCredential")
            .field("version", &self.version)
            .field("iterations", &self.iterations)
            .field("memory_kib", &self.memory_kib)
            .field("parallelism", &self.parallelism)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Error)]
pub enum PasswordHashError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("invalid hasher parameters: {0}")]
    InvalidParameters(String),
    #[error("secure random source unavailable: {0}")]
    Entropy(String),
    #[error("key derivation failed: {0}")]
    Derivation(String),
    #[error("malformed credential: {0}")]
    MalformedCredential(#[from] serde_json::Error),
}

/// Derives and checks salted password hashes.
///
/// New credentials use the configured [`HasherSettings`]; verification
/// follows whatever version and cost the stored credential carries, so
/// older credentials keep working after the settings move on.
pub struct PasswordHasher {
    settings: HasherSettings,
    dummy: OnceCell<PasswordCredential>,
}

impl fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordHasher")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl PasswordHasher {
    pub const PBKDF2_VERSION: u8 = 1;
    pub const ARGON2_VERSION: u8 = 2;
    pub const SALT_LENGTH: usize = 16;
    pub const KEY_LENGTH: usize = 32;

    // Stored credentials asking for more work than this are treated as
    // corrupt rather than honoured. New settings are held to the same caps.
    const MAX_PBKDF2_ITERATIONS: u32 = 10_000_000;
    const MAX_ARGON2_ITERATIONS: u32 = 64;
    const MAX_ARGON2_MEMORY_KIB: u32 = 256 * 1024; // 256 MiB
    const MAX_ARGON2_PARALLELISM: u32 = 16;

    pub fn new(settings: HasherSettings) -> Result<Self, PasswordHashError> {
        match settings.algorithm {
            PasswordAlgorithm::Pbkdf2Sha256 => {
                if settings.iterations == 0
                    || settings.iterations > Self::MAX_PBKDF2_ITERATIONS
                {
                    return Err(PasswordHashError::InvalidParameters(format!(
                        "pbkdf2 iterations must be between 1 and {}",
                        Self::MAX_PBKDF2_ITERATIONS
                    )));
                }
            }
            PasswordAlgorithm::Argon2id => {
                if !Self::argon2_cost_within_caps(
                    settings.iterations,
                    settings.memory_kib,
                    settings.parallelism,
                ) {
                    return Err(PasswordHashError::InvalidParameters(format!(
                        "argon2 cost must stay within {} iterations, {} KiB and {} lanes",
                        Self::MAX_ARGON2_ITERATIONS,
                        Self::MAX_ARGON2_MEMORY_KIB,
                        Self::MAX_ARGON2_PARALLELISM
                    )));
                }
                argon2_params(
                    settings.memory_kib,
                    settings.iterations,
                    settings.parallelism,
                    Self::KEY_LENGTH,
                )?;
            }
        }

        Ok(Self {
            settings,
            dummy: OnceCell::new(),
        })
    }

    pub fn settings(&self) -> &HasherSettings {
        &self.settings
    }

    /// Hash an already validated password.
    pub fn hash(
        &self,
        password: &RawPassword,
    ) -> Result<PasswordCredential, PasswordHashError> {
        self.derive_new(password.expose().as_bytes())
    }

    /// Validate `raw` against the strength rules, then hash it.
    pub fn hash_raw(
        &self,
        raw: &str,
    ) -> Result<PasswordCredential, PasswordHashError> {
        let password = RawPassword::parse(raw)?;
        self.hash(&password)
    }

    /// Re-derive an already verified plaintext under the active settings.
    ///
    /// Skips the strength rules: the password predates them and the user
    /// just proved they know it.
    pub fn rehash(
        &self,
        plaintext: &str,
    ) -> Result<PasswordCredential, PasswordHashError> {
        self.derive_new(plaintext.trim().as_bytes())
    }

    /// Check `plaintext` against a stored credential.
    ///
    /// Never errors: empty input, an unknown version, corrupt parameters or
    /// a mismatch all yield `false`. The final comparison is constant time.
    pub fn verify(&self, plaintext: &str, credential: &PasswordCredential) -> bool {
        let plaintext = plaintext.trim();
        if plaintext.is_empty() {
            return false;
        }

        let Some(salt) = decode(&credential.salt) else {
            return false;
        };
        let Some(expected) = decode(&credential.hash) else {
            return false;
        };
        if expected.is_empty() || expected.len() > 64 {
            return false;
        }

        let mut actual = Zeroizing::new(vec![0u8; expected.len()]);
        let derived = match credential.version {
            Self::PBKDF2_VERSION => {
                if credential.iterations == 0
                    || credential.iterations > Self::MAX_PBKDF2_ITERATIONS
                {
                    return false;
                }
                pbkdf2::pbkdf2_hmac::<Sha256>(
                    plaintext.as_bytes(),
                    &salt,
                    credential.iterations,
                    &mut actual,
                );
                true
            }
            Self::ARGON2_VERSION => {
                let (Some(memory_kib), Some(parallelism)) =
                    (credential.memory_kib, credential.parallelism)
                else {
                    return false;
                };
                if !Self::argon2_cost_within_caps(
                    credential.iterations,
                    memory_kib,
                    parallelism,
                ) {
                    return false;
                }
                argon2_params(
                    memory_kib,
                    credential.iterations,
                    parallelism,
                    expected.len(),
                )
                .ok()
                .map(|params| {
                    Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
                        .hash_password_into(plaintext.as_bytes(), &salt, &mut actual)
                        .is_ok()
                })
                .unwrap_or(false)
            }
            _ => false,
        };

        derived && constant_time_eq(&actual, &expected)
    }

    /// [`verify`](Self::verify) against the serialized JSON form.
    pub fn verify_serialized(&self, plaintext: &str, stored: &str) -> bool {
        PasswordCredential::deserialize(stored)
            .map(|credential| self.verify(plaintext, &credential))
            .unwrap_or(false)
    }

    /// Burn the same work as a real verification. Used when no account
    /// matches so the caller's timing does not reveal that.
    pub fn dummy_verify(&self, plaintext: &str) {
        let credential = self.dummy.get_or_try_init(|| {
            self.derive_new(b"keyward-dummy-credential")
        });
        if let Ok(credential) = credential {
            let _ = self.verify(plaintext, credential);
        }
    }

    /// Whether `credential` was produced with different settings than the
    /// active ones and should be replaced after the next successful login.
    pub fn needs_rehash(&self, credential: &PasswordCredential) -> bool {
        if credential.version != self.settings.algorithm.version()
            || credential.iterations != self.settings.iterations
        {
            return true;
        }

        match self.settings.algorithm {
            PasswordAlgorithm::Pbkdf2Sha256 => false,
            PasswordAlgorithm::Argon2id => {
                credential.memory_kib != Some(self.settings.memory_kib)
                    || credential.parallelism != Some(self.settings.parallelism)
            }
        }
    }

    fn argon2_cost_within_caps(iterations: u32, memory_kib: u32, parallelism: u32) -> bool {
        iterations <= Self::MAX_ARGON2_ITERATIONS
            && memory_kib <= Self::MAX_ARGON2_MEMORY_KIB
            && parallelism <= Self::MAX_ARGON2_PARALLELISM
    }

    fn derive_new(
        &self,
        secret: &[u8],
    ) -> Result<PasswordCredential, PasswordHashError> {
        let mut salt = [0u8; Self::SALT_LENGTH];
        OsRng
            .try_fill_bytes(&mut salt)
            .map_err(|err| PasswordHashError::Entropy(err.to_string()))?;

        let mut key = Zeroizing::new([0u8; Self::KEY_LENGTH]);
        let HasherSettings {
            algorithm,
            iterations,
            memory_kib,
            parallelism,
        } = self.settings;

        let (memory_kib, parallelism) = match algorithm {
            PasswordAlgorithm::Pbkdf2Sha256 => {
                pbkdf2::pbkdf2_hmac::<Sha256>(
                    secret,
                    &salt,
                    iterations,
                    key.as_mut_slice(),
                );
                (None, None)
            }
            PasswordAlgorithm::Argon2id => {
                let params = argon2_params(
                    memory_kib,
                    iterations,
                    parallelism,
                    Self::KEY_LENGTH,
                )?;
                Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
                    .hash_password_into(secret, &salt, key.as_mut_slice())
                    .map_err(|err| PasswordHashError::Derivation(err.to_string()))?;
                (Some(memory_kib), Some(parallelism))
            }
        };

        Ok(PasswordCredential {
            version: algorithm.version(),
            iterations,
            memory_kib,
            parallelism,
            salt: STANDARD.encode(salt),
            hash: STANDARD.encode(key.as_slice()),
        })
    }
}

fn argon2_params(
    memory_kib: u32,
    iterations: u32,
    parallelism: u32,
    output_len: usize,
) -> Result<Params, PasswordHashError> {
    Params::new(memory_kib, iterations, parallelism, Some(output_len))
        .map_err(|err| PasswordHashError::InvalidParameters(err.to_string()))
}

fn decode(value: &str) -> Option<Vec<u8>> {
    STANDARD.decode(value).ok()
}
