//! # Keyward Core
//!
//! Credential and token lifecycle for an account backend: validated account
//! value objects, salted password hashing, access/refresh token issuance and
//! refresh-token rotation.
//!
//! ## Overview
//!
//! - **Value objects**: [`Email`], [`Phone`], [`Address`], [`RawPassword`],
//!   [`Role`] and [`PersonName`] validate once at construction and are
//!   immutable afterwards
//! - **Password hashing**: [`PasswordHasher`] produces versioned
//!   [`PasswordCredential`]s (PBKDF2-HMAC-SHA256 or Argon2id) and verifies
//!   them in constant time
//! - **Token issuance**: [`TokenIssuer`] signs HS256 access tokens and mints
//!   opaque refresh tokens
//! - **Lifecycle**: [`CredentialLifecycleService`] drives register, login,
//!   refresh rotation and revocation over abstract store ports
//!
//! ## Persistence
//!
//! The core never talks to a database. It depends on the
//! [`UserRepository`], [`RefreshTokenRepository`] and [`UnitOfWork`] ports;
//! [`InMemoryRecordStore`] implements all three for tests and tooling.
//!
//! ## Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use keyward_core::{
//!     CredentialLifecycleService, HasherSettings, InMemoryRecordStore,
//!     PasswordHasher, TokenIssuer, TokenSettings,
//! };
//!
//! async fn login() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(InMemoryRecordStore::new());
//!     let service = CredentialLifecycleService::new(
//!         store.clone(),
//!         store.clone(),
//!         store,
//!         Arc::new(PasswordHasher::new(HasherSettings::default())?),
//!         Arc::new(TokenIssuer::new(TokenSettings::new(
//!             "a-signing-secret-of-at-least-thirty-two-bytes",
//!             "keyward",
//!             "keyward-clients",
//!             15,
//!             7,
//!         )?)),
//!     );
//!
//!     let tokens = service.login("ada@example.com", "Password@123").await?;
//!     println!("access token expires at {}", tokens.expires_at);
//!     Ok(())
//! }
//! ```

pub mod domain;
pub mod error;
pub mod infrastructure;

pub use domain::users::auth::domain::repositories::{
    AddUserOutcome, RefreshTokenRecord, RefreshTokenRepository, Revocation, UnitOfWork,
    UserRepository,
};
pub use domain::users::auth::domain::services::{
    AuthTokens, CredentialLifecycleService, RegisterCommand,
};
pub use domain::users::auth::domain::value_objects::{
    RefreshToken, RefreshTokenError, RevocationReason,
};
pub use domain::users::auth::{
    AccessClaims, HasherSettings, IssuedAccessToken, PasswordAlgorithm,
    PasswordCredential, PasswordHashError, PasswordHasher, TokenIssueError,
    TokenIssuer, TokenSettings,
};
pub use domain::users::value_objects::{
    Address, Email, PersonName, Phone, RawPassword, Role, ValidationError,
    ValidationReason,
};
pub use domain::users::{NewUserIdentity, UserIdentity};
pub use error::LifecycleError;
pub use infrastructure::InMemoryRecordStore;
