//! Configuration loading for Keyward.
//!
//! Settings are layered: built-in defaults, then a TOML file, then
//! environment variables (after an optional `.env`). The loaded [`Config`]
//! passes through [`validation::apply_guard_rails`] before anything in
//! `keyward-core` sees it, so a weak or incomplete setup fails at startup
//! rather than on the first request.

pub mod constants;
pub mod loader;
pub mod models;
pub mod util;
pub mod validation;

pub use loader::{ConfigLoad, ConfigLoader, ConfigLoaderOptions, error::ConfigLoadError};
pub use models::sources::{EnvConfig, FileConfig};
pub use models::{Config, ConfigMetadata, PasswordConfig, TokensConfig};
pub use validation::{ConfigGuardRailError, ConfigWarning, ConfigWarnings};
