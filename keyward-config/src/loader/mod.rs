pub mod error;

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use keyward_core::{PasswordAlgorithm, TokenSettings};
use once_cell::sync::Lazy;
use tracing::debug;

use self::error::ConfigLoadError;
use crate::constants::{DEFAULT_AUDIENCE, DEFAULT_CONFIG_FILE, DEFAULT_ISSUER};
use crate::models::sources::{EnvConfig, FileConfig, FilePasswordConfig, FileTokensConfig};
use crate::models::{Config, ConfigMetadata, PasswordConfig, TokensConfig};
use crate::util::{non_blank, parse_bool};
use crate::validation::{self, ConfigGuardRailError, ConfigWarnings};

static DEFAULT_CONFIG_LOCATIONS: Lazy<Vec<PathBuf>> = Lazy::new(|| {
    vec![
        PathBuf::from(DEFAULT_CONFIG_FILE),
        PathBuf::from("config").join(DEFAULT_CONFIG_FILE),
    ]
});

#[derive(Debug, Default, Clone)]
pub struct ConfigLoaderOptions {
    pub config_path: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
    /// Skip the default-location search when no path is given.
    pub no_default_locations: bool,
}

#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: ConfigLoaderOptions,
}

/// A validated configuration plus the non-fatal findings.
#[derive(Debug)]
pub struct ConfigLoad {
    pub config: Config,
    pub warnings: ConfigWarnings,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ConfigLoaderOptions) -> Self {
        Self { options }
    }

    pub fn with_config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.config_path = Some(path.into());
        self
    }

    pub fn with_env_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.env_file = Some(path.into());
        self
    }

    pub fn without_default_locations(mut self) -> Self {
        self.options.no_default_locations = true;
        self
    }

    /// Load `.env`, gather the process environment, then compose.
    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let env_file_loaded = match &self.options.env_file {
            Some(path) => dotenvy::from_path(path).map(|_| true).or_else(
                |err| match err {
                    dotenvy::Error::Io(_) => Ok(false),
                    _ => Err(err),
                },
            )?,
            None => dotenvy::dotenv().map(|_| true).or_else(|err| match err {
                dotenvy::Error::Io(_) => Ok(false),
                _ => Err(err),
            })?,
        };

        self.load_from(EnvConfig::gather(), env_file_loaded)
    }

    /// Compose from an explicit environment snapshot. Neither reads `.env`
    /// nor the process environment.
    pub fn load_with_env(&self, env: EnvConfig) -> Result<ConfigLoad, ConfigLoadError> {
        self.load_from(env, false)
    }

    fn load_from(
        &self,
        env: EnvConfig,
        env_file_loaded: bool,
    ) -> Result<ConfigLoad, ConfigLoadError> {
        let (file_config, config_path) = self.load_file_config(&env)?;
        let mut warnings = ConfigWarnings::default();

        if config_path.is_none() {
            warnings.push_with_hint(
                format!("No {DEFAULT_CONFIG_FILE} detected; using environment variables and defaults"),
                "Point KEYWARD_CONFIG at a TOML file or pass --config",
            );
        }

        let config = self.compose_config(
            file_config.unwrap_or_default(),
            env,
            config_path,
            env_file_loaded,
        )?;
        warnings.extend(validation::apply_guard_rails(&config)?);

        debug!(
            config_path = ?config.metadata.config_path,
            env_file_loaded = config.metadata.env_file_loaded,
            algorithm = %config.password.algorithm,
            "configuration loaded"
        );

        Ok(ConfigLoad { config, warnings })
    }

    fn load_file_config(
        &self,
        env: &EnvConfig,
    ) -> Result<(Option<FileConfig>, Option<PathBuf>), ConfigLoadError> {
        let explicit = self
            .options
            .config_path
            .clone()
            .or_else(|| env.config_path.clone());

        let path = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigLoadError::MissingConfig { path });
                }
                path
            }
            None if self.options.no_default_locations => return Ok((None, None)),
            None => match DEFAULT_CONFIG_LOCATIONS
                .iter()
                .find(|candidate| candidate.exists())
            {
                Some(path) => path.clone(),
                None => return Ok((None, None)),
            },
        };

        let contents = fs::read_to_string(&path).map_err(|source| ConfigLoadError::Io {
            path: path.clone(),
            source,
        })?;
        let file_config: FileConfig =
            toml::from_str(&contents).map_err(|source| ConfigLoadError::Parse {
                path: path.clone(),
                source,
            })?;

        Ok((Some(file_config), Some(path)))
    }

    fn compose_config(
        &self,
        file: FileConfig,
        env: EnvConfig,
        config_path: Option<PathBuf>,
        env_file_loaded: bool,
    ) -> Result<Config, ConfigLoadError> {
        let FileConfig {
            tokens: file_tokens,
            password: file_password,
            dev_mode: file_dev_mode,
        } = file;

        let dev_mode = match env.dev_mode.as_deref() {
            Some(raw) => parse_bool(raw).ok_or_else(|| ConfigLoadError::InvalidValue {
                key: "KEYWARD_DEV_MODE",
                value: raw.to_string(),
            })?,
            None => file_dev_mode.unwrap_or(false),
        };

        let (signing_secret, secret_from_file) = Self::resolve_secret(&env, &file_tokens)?;
        let tokens = Self::compose_tokens(&env, file_tokens, signing_secret)?;
        let password = Self::compose_password(&env, file_password)?;

        Ok(Config {
            tokens,
            password,
            dev_mode,
            metadata: ConfigMetadata {
                config_path,
                env_file_loaded,
                secret_from_file,
            },
        })
    }

    fn compose_tokens(
        env: &EnvConfig,
        file: FileTokensConfig,
        signing_secret: String,
    ) -> Result<TokensConfig, ConfigLoadError> {
        Ok(TokensConfig {
            signing_secret,
            issuer: env
                .issuer
                .clone()
                .or(non_blank(file.issuer))
                .unwrap_or_else(|| DEFAULT_ISSUER.to_string()),
            audience: env
                .audience
                .clone()
                .or(non_blank(file.audience))
                .unwrap_or_else(|| DEFAULT_AUDIENCE.to_string()),
            access_token_minutes: parse_env(
                "KEYWARD_ACCESS_TOKEN_MINUTES",
                env.access_token_minutes.as_deref(),
            )?
            .or(file.access_token_minutes)
            .unwrap_or(TokenSettings::DEFAULT_ACCESS_TOKEN_MINUTES),
            refresh_token_days: parse_env(
                "KEYWARD_REFRESH_TOKEN_DAYS",
                env.refresh_token_days.as_deref(),
            )?
            .or(file.refresh_token_days)
            .unwrap_or(TokenSettings::DEFAULT_REFRESH_TOKEN_DAYS),
        })
    }

    fn compose_password(
        env: &EnvConfig,
        file: FilePasswordConfig,
    ) -> Result<PasswordConfig, ConfigLoadError> {
        let defaults = PasswordConfig::default();

        let algorithm = match env.password_algorithm.clone().or(non_blank(file.algorithm)) {
            Some(raw) => PasswordAlgorithm::parse(&raw)
                .ok_or(ConfigGuardRailError::UnknownAlgorithm(raw))?,
            None => defaults.algorithm,
        };

        Ok(PasswordConfig {
            algorithm,
            iterations: parse_env("KEYWARD_PBKDF2_ITERATIONS", env.pbkdf2_iterations.as_deref())?
                .or(file.iterations)
                .unwrap_or(defaults.iterations),
            argon2_time_cost: parse_env(
                "KEYWARD_ARGON2_TIME_COST",
                env.argon2_time_cost.as_deref(),
            )?
            .or(file.argon2_time_cost)
            .unwrap_or(defaults.argon2_time_cost),
            argon2_memory_kib: parse_env(
                "KEYWARD_ARGON2_MEMORY_KIB",
                env.argon2_memory_kib.as_deref(),
            )?
            .or(file.argon2_memory_kib)
            .unwrap_or(defaults.argon2_memory_kib),
            argon2_parallelism: parse_env(
                "KEYWARD_ARGON2_PARALLELISM",
                env.argon2_parallelism.as_deref(),
            )?
            .or(file.argon2_parallelism)
            .unwrap_or(defaults.argon2_parallelism),
        })
    }

    /// Environment beats file; an inline secret beats a secret file.
    fn resolve_secret(
        env: &EnvConfig,
        file: &FileTokensConfig,
    ) -> Result<(String, bool), ConfigLoadError> {
        if let Some(secret) = &env.signing_secret {
            return Ok((secret.clone(), false));
        }
        if let Some(path) = &env.signing_secret_file
            && let Some(secret) = Self::read_secret_file(path)?
        {
            return Ok((secret, true));
        }
        if let Some(secret) = non_blank(file.signing_secret.clone()) {
            return Ok((secret, false));
        }
        if let Some(path) = &file.signing_secret_file
            && let Some(secret) = Self::read_secret_file(path)?
        {
            return Ok((secret, true));
        }
        Ok((String::new(), false))
    }

    fn read_secret_file(path: &Path) -> Result<Option<String>, ConfigLoadError> {
        let contents =
            fs::read_to_string(path).map_err(|source| ConfigLoadError::SecretFileIo {
                path: path.to_path_buf(),
                source,
            })?;
        let trimmed = contents.trim();
        if trimmed.is_empty() {
            Ok(None)
        } else {
            Ok(Some(trimmed.to_string()))
        }
    }
}

fn parse_env<T: FromStr>(
    key: &'static str,
    raw: Option<&str>,
) -> Result<Option<T>, ConfigLoadError> {
    raw.map(|value| {
        value
            .trim()
            .parse()
            .map_err(|_| ConfigLoadError::InvalidValue {
                key,
                value: value.to_string(),
            })
    })
    .transpose()
}
