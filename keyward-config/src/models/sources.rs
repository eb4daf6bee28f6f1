use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::constants::CONFIG_PATH_ENV;
use crate::util::non_blank;

/// Raw configuration as defined in a TOML file.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub tokens: FileTokensConfig,
    #[serde(default)]
    pub password: FilePasswordConfig,
    pub dev_mode: Option<bool>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FileTokensConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signing_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signing_secret_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audience: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token_minutes: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token_days: Option<i64>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FilePasswordConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iterations: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub argon2_time_cost: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub argon2_memory_kib: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub argon2_parallelism: Option<u32>,
}

/// Environment-derived configuration values.
///
/// Kept as raw strings; the loader parses them so a malformed number is
/// reported instead of silently ignored.
#[derive(Debug, Default, Clone)]
pub struct EnvConfig {
    pub config_path: Option<PathBuf>,
    pub signing_secret: Option<String>,
    pub signing_secret_file: Option<PathBuf>,
    pub issuer: Option<String>,
    pub audience: Option<String>,
    pub access_token_minutes: Option<String>,
    pub refresh_token_days: Option<String>,
    pub password_algorithm: Option<String>,
    pub pbkdf2_iterations: Option<String>,
    pub argon2_time_cost: Option<String>,
    pub argon2_memory_kib: Option<String>,
    pub argon2_parallelism: Option<String>,
    pub dev_mode: Option<String>,
}

impl EnvConfig {
    pub fn gather() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| non_blank(lookup(key));

        Self {
            config_path: var(CONFIG_PATH_ENV).map(PathBuf::from),
            signing_secret: var("KEYWARD_SIGNING_SECRET"),
            signing_secret_file: var("KEYWARD_SIGNING_SECRET_FILE").map(PathBuf::from),
            issuer: var("KEYWARD_ISSUER"),
            audience: var("KEYWARD_AUDIENCE"),
            access_token_minutes: var("KEYWARD_ACCESS_TOKEN_MINUTES"),
            refresh_token_days: var("KEYWARD_REFRESH_TOKEN_DAYS"),
            password_algorithm: var("KEYWARD_PASSWORD_ALGORITHM"),
            pbkdf2_iterations: var("KEYWARD_PBKDF2_ITERATIONS"),
            argon2_time_cost: var("KEYWARD_ARGON2_TIME_COST"),
            argon2_memory_kib: var("KEYWARD_ARGON2_MEMORY_KIB"),
            argon2_parallelism: var("KEYWARD_ARGON2_PARALLELISM"),
            dev_mode: var("KEYWARD_DEV_MODE"),
        }
    }
}
