/// Placeholder shipped in sample configuration. Never accepted at startup.
pub const DEFAULT_SIGNING_SECRET: &str = "change-me-keyward-signing-secret";

pub const DEFAULT_ISSUER: &str = "keyward";
pub const DEFAULT_AUDIENCE: &str = "keyward-clients";

/// Signing secrets shorter than this are refused outside dev mode.
pub const MIN_SECRET_LENGTH: usize = 32;

/// Access tokens living longer than this draw a warning.
pub const LONG_ACCESS_TOKEN_MINUTES: i64 = 60;

pub const CONFIG_PATH_ENV: &str = "KEYWARD_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "keyward.toml";
