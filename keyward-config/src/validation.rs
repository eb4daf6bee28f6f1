use keyward_core::{HasherSettings, PasswordAlgorithm, PasswordHasher};
use thiserror::Error;

use crate::constants::{LONG_ACCESS_TOKEN_MINUTES, MIN_SECRET_LENGTH};
use crate::models::{Config, PasswordConfig, TokensConfig};

#[derive(Debug, Error)]
pub enum ConfigGuardRailError {
    #[error("signing secret {reason}")]
    WeakSecret { reason: String },
    #[error("{field} must not be empty")]
    EmptyValue { field: &'static str },
    #[error("{field} must be at least 1 (got {value})")]
    InvalidLifetime { field: &'static str, value: i64 },
    #[error("pbkdf2 iterations must be at least {min} (got {value})")]
    WeakIterations { min: u32, value: u32 },
    #[error("unknown password algorithm '{0}' (expected pbkdf2-sha256 or argon2id)")]
    UnknownAlgorithm(String),
    #[error("invalid password hashing parameters: {reason}")]
    InvalidHasherParameters { reason: String },
}

#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct ConfigWarnings {
    pub items: Vec<ConfigWarning>,
}

impl ConfigWarnings {
    pub fn push<S: Into<String>>(&mut self, message: S) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: None,
        });
    }

    pub fn push_with_hint<S: Into<String>, H: Into<String>>(
        &mut self,
        message: S,
        hint: H,
    ) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: Some(hint.into()),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn extend(&mut self, other: ConfigWarnings) {
        self.items.extend(other.items);
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConfigWarning> {
        self.items.iter()
    }
}

pub fn apply_guard_rails(
    config: &Config,
) -> Result<ConfigWarnings, ConfigGuardRailError> {
    let mut warnings = ConfigWarnings::default();

    enforce_secret(&config.tokens, config.dev_mode, &mut warnings)?;
    validate_tokens(&config.tokens, &mut warnings)?;
    validate_password(&config.password)?;

    if config.dev_mode {
        warnings.push_with_hint(
            "KEYWARD_DEV_MODE is enabled; weak signing secrets are tolerated",
            "Unset KEYWARD_DEV_MODE before deploying",
        );
    }

    Ok(warnings)
}

fn enforce_secret(
    tokens: &TokensConfig,
    dev_mode: bool,
    warnings: &mut ConfigWarnings,
) -> Result<(), ConfigGuardRailError> {
    if tokens.signing_secret.trim().is_empty() {
        return Err(ConfigGuardRailError::WeakSecret {
            reason: "is not set (KEYWARD_SIGNING_SECRET or KEYWARD_SIGNING_SECRET_FILE)"
                .into(),
        });
    }

    if tokens.is_default_secret() {
        return Err(ConfigGuardRailError::WeakSecret {
            reason: "uses the default placeholder value".into(),
        });
    }

    if tokens.signing_secret.len() < MIN_SECRET_LENGTH {
        if !dev_mode {
            return Err(ConfigGuardRailError::WeakSecret {
                reason: format!("must be at least {MIN_SECRET_LENGTH} bytes"),
            });
        }
        warnings.push_with_hint(
            format!("signing secret is shorter than {MIN_SECRET_LENGTH} bytes"),
            "Generate one with `keywardctl generate-secret`",
        );
    }

    Ok(())
}

fn validate_tokens(
    tokens: &TokensConfig,
    warnings: &mut ConfigWarnings,
) -> Result<(), ConfigGuardRailError> {
    if tokens.issuer.trim().is_empty() {
        return Err(ConfigGuardRailError::EmptyValue { field: "issuer" });
    }
    if tokens.audience.trim().is_empty() {
        return Err(ConfigGuardRailError::EmptyValue { field: "audience" });
    }

    if tokens.access_token_minutes < 1 {
        return Err(ConfigGuardRailError::InvalidLifetime {
            field: "access_token_minutes",
            value: tokens.access_token_minutes,
        });
    }
    if tokens.refresh_token_days < 1 {
        return Err(ConfigGuardRailError::InvalidLifetime {
            field: "refresh_token_days",
            value: tokens.refresh_token_days,
        });
    }

    if tokens.access_token_minutes > LONG_ACCESS_TOKEN_MINUTES {
        warnings.push_with_hint(
            format!(
                "access tokens live for {} minutes and cannot be revoked before expiry",
                tokens.access_token_minutes
            ),
            "Keep KEYWARD_ACCESS_TOKEN_MINUTES short and rely on refresh rotation",
        );
    }

    Ok(())
}

fn validate_password(password: &PasswordConfig) -> Result<(), ConfigGuardRailError> {
    if password.algorithm == PasswordAlgorithm::Pbkdf2Sha256
        && password.iterations < HasherSettings::MIN_PBKDF2_ITERATIONS
    {
        return Err(ConfigGuardRailError::WeakIterations {
            min: HasherSettings::MIN_PBKDF2_ITERATIONS,
            value: password.iterations,
        });
    }

    // Let the hasher reject anything else it cannot work with.
    PasswordHasher::new(password.hasher_settings()).map_err(|err| {
        ConfigGuardRailError::InvalidHasherParameters {
            reason: err.to_string(),
        }
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ConfigMetadata;

    fn config(secret: &str, dev_mode: bool) -> Config {
        Config {
            tokens: TokensConfig {
                signing_secret: secret.to_string(),
                issuer: "keyward".into(),
                audience: "keyward-clients".into(),
                access_token_minutes: 15,
                refresh_token_days: 7,
            },
            password: PasswordConfig::default(),
            dev_mode,
            metadata: ConfigMetadata::default(),
        }
    }

    const STRONG: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn strong_configuration_passes_cleanly() {
        let warnings = apply_guard_rails(&config(STRONG, false)).unwrap();
        assert!(warnings.is_empty());
    }

    #[test]
    fn short_secret_is_fatal_outside_dev_mode() {
        assert!(matches!(
            apply_guard_rails(&config("short", false)),
            Err(ConfigGuardRailError::WeakSecret { .. })
        ));

        let warnings = apply_guard_rails(&config("short", true)).unwrap();
        assert_eq!(warnings.len(), 2);
    }

    #[test]
    fn placeholder_and_empty_secret_always_fail() {
        for dev_mode in [false, true] {
            assert!(apply_guard_rails(&config("", dev_mode)).is_err());
            assert!(
                apply_guard_rails(&config(crate::constants::DEFAULT_SIGNING_SECRET, dev_mode))
                    .is_err()
            );
        }
    }

    #[test]
    fn lifetimes_and_claims_are_checked() {
        let mut cfg = config(STRONG, false);
        cfg.tokens.refresh_token_days = 0;
        assert!(matches!(
            apply_guard_rails(&cfg),
            Err(ConfigGuardRailError::InvalidLifetime { field: "refresh_token_days", value: 0 })
        ));

        let mut cfg = config(STRONG, false);
        cfg.tokens.audience = " ".into();
        assert!(matches!(
            apply_guard_rails(&cfg),
            Err(ConfigGuardRailError::EmptyValue { field: "audience" })
        ));

        let mut cfg = config(STRONG, false);
        cfg.tokens.access_token_minutes = 240;
        assert_eq!(apply_guard_rails(&cfg).unwrap().len(), 1);
    }

    #[test]
    fn iteration_floor_applies_to_pbkdf2() {
        let mut cfg = config(STRONG, false);
        cfg.password.iterations = 99_999;
        assert!(matches!(
            apply_guard_rails(&cfg),
            Err(ConfigGuardRailError::WeakIterations { min: 100_000, value: 99_999 })
        ));

        cfg.password.algorithm = PasswordAlgorithm::Argon2id;
        assert!(apply_guard_rails(&cfg).is_ok());

        cfg.password.argon2_parallelism = 0;
        assert!(matches!(
            apply_guard_rails(&cfg),
            Err(ConfigGuardRailError::InvalidHasherParameters { .. })
        ));
    }
}
