use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::users::UserIdentity;
use crate::domain::users::auth::domain::value_objects::RevocationReason;
use crate::domain::users::value_objects::Email;

/// Account lookups and writes.
///
/// Email comparisons are case-insensitive. `Email` is already lower-cased,
/// so adapters compare the normalized value.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<UserIdentity>>;
    async fn find_by_email(&self, email: &Email) -> Result<Option<UserIdentity>>;
    async fn exists_by_email(&self, email: &Email) -> Result<bool>;

    /// Insert a new account. Email uniqueness is checked atomically with
    /// the insert; a duplicate is reported as [`AddUserOutcome::EmailTaken`]
    /// rather than as an error.
    async fn add(&self, user: &UserIdentity) -> Result<AddUserOutcome>;

    async fn update(&self, user: &UserIdentity) -> Result<()>;
}

/// Result of [`UserRepository::add`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddUserOutcome {
    Added,
    /// Another account already holds the email.
    EmailTaken,
}

/// Persisted refresh token. Only the digest of the opaque value is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshTokenRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked: bool,
    pub revoked_at: Option<DateTime<Utc>>,
    pub revoked_reason: Option<RevocationReason>,
    /// Successor issued when this record was rotated.
    pub replaced_by: Option<Uuid>,
}

impl RefreshTokenRecord {
    pub fn new(
        user_id: Uuid,
        token_hash: String,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            user_id,
            token_hash,
            created_at,
            expires_at,
            revoked: false,
            revoked_at: None,
            revoked_reason: None,
            replaced_by: None,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }

    /// Neither revoked nor expired.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        !self.revoked && !self.is_expired_at(now)
    }
}

/// Details written alongside a revocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Revocation {
    pub reason: RevocationReason,
    pub at: DateTime<Utc>,
    pub replaced_by: Option<Uuid>,
}

impl Revocation {
    pub fn now(reason: RevocationReason) -> Self {
        Self {
            reason,
            at: Utc::now(),
            replaced_by: None,
        }
    }

    pub fn replaced_by(mut self, successor: Uuid) -> Self {
        self.replaced_by = Some(successor);
        self
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RefreshTokenRepository: Send + Sync {
    async fn add(&self, record: &RefreshTokenRecord) -> Result<()>;

    async fn find_by_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<RefreshTokenRecord>>;

    /// Conditional update: revoke only if the record is still unrevoked.
    ///
    /// Returns `true` when this call performed the revocation. Of several
    /// concurrent callers on the same record exactly one observes `true`.
    async fn mark_revoked(
        &self,
        token_hash: &str,
        revocation: Revocation,
    ) -> Result<bool>;

    /// Revoke every unrevoked record of a user. Returns how many changed.
    async fn revoke_all_for_user(
        &self,
        user_id: Uuid,
        revocation: Revocation,
    ) -> Result<u64>;
}

/// Durable-write boundary, called once per lifecycle operation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    async fn commit(&self) -> Result<()>;
}
