//! Password hashing, token issuance and the refresh-token lifecycle.

pub mod crypto;
pub mod domain;
pub mod tokens;

pub use crypto::{
    HasherSettings, PasswordAlgorithm, PasswordCredential, PasswordHashError,
    PasswordHasher,
};
pub use tokens::{
    AccessClaims, IssuedAccessToken, TokenIssueError, TokenIssuer, TokenSettings,
};
