pub mod sources;

use std::fmt;
use std::path::PathBuf;

use keyward_core::{
    HasherSettings, PasswordAlgorithm, TokenIssueError, TokenSettings,
};

use crate::constants::DEFAULT_SIGNING_SECRET;

#[derive(Debug, Clone)]
pub struct Config {
    pub tokens: TokensConfig,
    pub password: PasswordConfig,
    pub dev_mode: bool,
    pub metadata: ConfigMetadata,
}

impl Config {
    /// Settings for the core token issuer. Re-validated by the core.
    pub fn token_settings(&self) -> Result<TokenSettings, TokenIssueError> {
        TokenSettings::new(
            self.tokens.signing_secret.as_bytes(),
            self.tokens.issuer.as_str(),
            self.tokens.audience.as_str(),
            self.tokens.access_token_minutes,
            self.tokens.refresh_token_days,
        )
    }

    pub fn hasher_settings(&self) -> HasherSettings {
        self.password.hasher_settings()
    }
}

#[derive(Clone)]
pub struct TokensConfig {
    pub signing_secret: String,
    pub issuer: String,
    pub audience: String,
    pub access_token_minutes: i64,
    pub refresh_token_days: i64,
}

impl TokensConfig {
    pub fn is_default_secret(&self) -> bool {
        self.signing_secret == DEFAULT_SIGNING_SECRET
    }
}

impl fmt::Debug for TokensConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokensConfig")
            .field("signing_secret", &"***")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("access_token_minutes", &self.access_token_minutes)
            .field("refresh_token_days", &self.refresh_token_days)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordConfig {
    pub algorithm: PasswordAlgorithm,
    /// PBKDF2 round count.
    pub iterations: u32,
    pub argon2_time_cost: u32,
    pub argon2_memory_kib: u32,
    pub argon2_parallelism: u32,
}

impl PasswordConfig {
    pub fn hasher_settings(&self) -> HasherSettings {
        match self.algorithm {
            PasswordAlgorithm::Pbkdf2Sha256 => HasherSettings::pbkdf2(self.iterations),
            PasswordAlgorithm::Argon2id => HasherSettings::argon2id(
                self.argon2_time_cost,
                self.argon2_memory_kib,
                self.argon2_parallelism,
            ),
        }
    }
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            algorithm: PasswordAlgorithm::Pbkdf2Sha256,
            iterations: HasherSettings::DEFAULT_PBKDF2_ITERATIONS,
            argon2_time_cost: HasherSettings::DEFAULT_ARGON2_ITERATIONS,
            argon2_memory_kib: HasherSettings::DEFAULT_ARGON2_MEMORY_KIB,
            argon2_parallelism: 1,
        }
    }
}

/// Where the loaded values came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigMetadata {
    pub config_path: Option<PathBuf>,
    pub env_file_loaded: bool,
    pub secret_from_file: bool,
}
