use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::users::auth::domain::repositories::{
    AddUserOutcome, RefreshTokenRecord, RefreshTokenRepository, Revocation, UnitOfWork,
    UserRepository,
};
use crate::domain::users::auth::domain::value_objects::{
    RefreshToken, RevocationReason,
};
use crate::domain::users::auth::{PasswordHasher, TokenIssuer};
use crate::domain::users::value_objects::{
    Address, Email, PersonName, Phone, RawPassword, Role,
};
use crate::domain::users::{NewUserIdentity, UserIdentity};
use crate::error::{LifecycleError, Result};

/// Raw registration input, validated by [`CredentialLifecycleService::register`].
#[derive(Clone)]
pub struct RegisterCommand {
    pub first_name: String,
    pub last_name: String,
    pub street: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    pub email: String,
    pub phone: String,
    pub password: String,
}

impl fmt::Debug for RegisterCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterCommand")
            .field("email", &self.email)
            .field("password", &"***")
            .finish_non_exhaustive()
    }
}

/// Tokens handed back after register, login or refresh.
#[derive(Debug, Clone)]
pub struct AuthTokens {
    pub user_id: Uuid,
    pub access_token: String,
    pub refresh_token: RefreshToken,
    /// Access-token expiry.
    pub expires_at: DateTime<Utc>,
}

/// Orchestrates registration, login, refresh rotation and revocation.
///
/// Holds no mutable state of its own; all of it lives behind the store
/// ports. Every authentication-class failure surfaces as
/// [`LifecycleError::Unauthorized`] whatever the underlying cause.
pub struct CredentialLifecycleService {
    users: Arc<dyn UserRepository>,
    refresh_tokens: Arc<dyn RefreshTokenRepository>,
    unit_of_work: Arc<dyn UnitOfWork>,
    hasher: Arc<PasswordHasher>,
    issuer: Arc<TokenIssuer>,
}

impl fmt::Debug for CredentialLifecycleService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialLifecycleService")
            .field("users_refs", &Arc::strong_count(&self.users))
            .field("refresh_tokens_refs", &Arc::strong_count(&self.refresh_tokens))
            .field("hasher", &self.hasher)
            .field("issuer", &self.issuer)
            .finish()
    }
}

impl CredentialLifecycleService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        refresh_tokens: Arc<dyn RefreshTokenRepository>,
        unit_of_work: Arc<dyn UnitOfWork>,
        hasher: Arc<PasswordHasher>,
        issuer: Arc<TokenIssuer>,
    ) -> Self {
        Self {
            users,
            refresh_tokens,
            unit_of_work,
            hasher,
            issuer,
        }
    }

    pub async fn register(&self, command: RegisterCommand) -> Result<AuthTokens> {
        let first_name = PersonName::parse("first_name", &command.first_name)?;
        let last_name = PersonName::parse("last_name", &command.last_name)?;
        let address = Address::new(
            &command.street,
            &command.city,
            &command.postal_code,
            &command.country,
        )?;
        let email = Email::parse(&command.email)?;
        let phone = Phone::parse(&command.phone)?;
        let password = RawPassword::parse(&command.password)?;

        if self.users.exists_by_email(&email).await? {
            return Err(email_conflict(&email));
        }

        let credential = self.hasher.hash(&password)?;
        let user = UserIdentity::new(NewUserIdentity {
            first_name,
            last_name,
            email,
            phone,
            address,
            credential,
            role: Role::default(),
        });
        // A concurrent registration may have claimed the email while the
        // password was hashing.
        if self.users.add(&user).await? == AddUserOutcome::EmailTaken {
            debug!("registration lost a race for the same email");
            return Err(email_conflict(user.email()));
        }

        let tokens = self.issue_tokens(&user).await?;
        self.unit_of_work.commit().await?;

        info!(user_id = %user.id(), "registered account");
        Ok(tokens)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthTokens> {
        let user = match Email::parse(email) {
            Ok(email) => self.users.find_by_email(&email).await?,
            Err(_) => None,
        };

        let Some(mut user) = user else {
            self.hasher.dummy_verify(password);
            debug!("login rejected: no matching account");
            return Err(LifecycleError::Unauthorized);
        };

        if !self.hasher.verify(password, user.credential()) {
            debug!(user_id = %user.id(), "login rejected: password mismatch");
            return Err(LifecycleError::Unauthorized);
        }

        if self.hasher.needs_rehash(user.credential()) {
            let credential = self.hasher.rehash(password)?;
            user.replace_credential(credential);
            info!(
                user_id = %user.id(),
                algorithm = %self.hasher.settings().algorithm,
                "upgraded stored password credential"
            );
        }
        user.record_login();
        self.users.update(&user).await?;

        let tokens = self.issue_tokens(&user).await?;
        self.unit_of_work.commit().await?;

        info!(user_id = %user.id(), "login succeeded");
        Ok(tokens)
    }

    /// Strict rotate-on-use: the presented token is revoked and replaced.
    pub async fn refresh_token(&self, token: &str) -> Result<AuthTokens> {
        let token =
            RefreshToken::from_value(token).map_err(|_| LifecycleError::Unauthorized)?;
        let token_hash = token.digest();

        let record = self
            .refresh_tokens
            .find_by_hash(&token_hash)
            .await?
            .ok_or(LifecycleError::Unauthorized)?;

        let now = Utc::now();
        if record.revoked {
            warn!(
                record_id = %record.id,
                user_id = %record.user_id,
                "rejected refresh with revoked token"
            );
            return Err(LifecycleError::Unauthorized);
        }
        if record.is_expired_at(now) {
            debug!(record_id = %record.id, "rejected refresh with expired token");
            return Err(LifecycleError::Unauthorized);
        }

        let user = self
            .users
            .find_by_id(record.user_id)
            .await?
            .ok_or(LifecycleError::Unauthorized)?;

        let access = self
            .issuer
            .issue_access_token(user.id(), user.email(), user.role())?;
        let refresh_token = self.issuer.issue_refresh_token()?;
        let successor = self.new_record(&user, &refresh_token, now);

        let revoked = self
            .refresh_tokens
            .mark_revoked(
                &token_hash,
                Revocation::now(RevocationReason::Rotation).replaced_by(successor.id),
            )
            .await?;
        if !revoked {
            warn!(
                record_id = %record.id,
                user_id = %record.user_id,
                "refresh token was rotated concurrently"
            );
            return Err(LifecycleError::Unauthorized);
        }

        self.refresh_tokens.add(&successor).await?;
        self.unit_of_work.commit().await?;

        info!(
            user_id = %user.id(),
            previous = %record.id,
            current = %successor.id,
            "rotated refresh token"
        );
        Ok(AuthTokens {
            user_id: user.id(),
            access_token: access.token,
            refresh_token,
            expires_at: access.expires_at,
        })
    }

    /// Idempotent. Unknown or already revoked tokens are a silent no-op.
    pub async fn revoke_token(&self, token: &str) -> Result<()> {
        let Ok(token) = RefreshToken::from_value(token) else {
            return Ok(());
        };

        let Some(record) = self.refresh_tokens.find_by_hash(&token.digest()).await?
        else {
            debug!("revoke ignored: unknown token");
            return Ok(());
        };

        if record.revoked {
            debug!(record_id = %record.id, "revoke ignored: already revoked");
            return Ok(());
        }

        let changed = self
            .refresh_tokens
            .mark_revoked(&record.token_hash, Revocation::now(RevocationReason::UserLogout))
            .await?;
        if changed {
            self.unit_of_work.commit().await?;
            info!(record_id = %record.id, user_id = %record.user_id, "revoked refresh token");
        }

        Ok(())
    }

    /// Replace the password and end every session of the account.
    pub async fn change_password(
        &self,
        user_id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> Result<()> {
        let mut user = self.users.find_by_id(user_id).await?.ok_or(
            LifecycleError::NotFound {
                entity: "user",
                id: user_id,
            },
        )?;

        if !self.hasher.verify(current_password, user.credential()) {
            debug!(user_id = %user_id, "password change rejected: current password mismatch");
            return Err(LifecycleError::Unauthorized);
        }

        let password = RawPassword::parse(new_password)?;
        user.replace_credential(self.hasher.hash(&password)?);
        self.users.update(&user).await?;

        let revoked = self
            .refresh_tokens
            .revoke_all_for_user(user_id, Revocation::now(RevocationReason::PasswordChange))
            .await?;
        self.unit_of_work.commit().await?;

        info!(user_id = %user_id, revoked, "password changed");
        Ok(())
    }

    /// Log out everywhere. Returns how many refresh tokens were revoked.
    pub async fn revoke_all_sessions(&self, user_id: Uuid) -> Result<u64> {
        if self.users.find_by_id(user_id).await?.is_none() {
            return Err(LifecycleError::NotFound {
                entity: "user",
                id: user_id,
            });
        }

        let revoked = self
            .refresh_tokens
            .revoke_all_for_user(user_id, Revocation::now(RevocationReason::SessionsRevoked))
            .await?;
        self.unit_of_work.commit().await?;

        info!(user_id = %user_id, revoked, "revoked all sessions");
        Ok(revoked)
    }

    async fn issue_tokens(&self, user: &UserIdentity) -> Result<AuthTokens> {
        let access = self
            .issuer
            .issue_access_token(user.id(), user.email(), user.role())?;
        let refresh_token = self.issuer.issue_refresh_token()?;
        let record = self.new_record(user, &refresh_token, Utc::now());
        self.refresh_tokens.add(&record).await?;

        Ok(AuthTokens {
            user_id: user.id(),
            access_token: access.token,
            refresh_token,
            expires_at: access.expires_at,
        })
    }

    fn new_record(
        &self,
        user: &UserIdentity,
        token: &RefreshToken,
        issued_at: DateTime<Utc>,
    ) -> RefreshTokenRecord {
        RefreshTokenRecord::new(
            user.id(),
            token.digest(),
            issued_at,
            self.issuer.refresh_expiry(issued_at),
        )
    }
}

fn email_conflict(email: &Email) -> LifecycleError {
    LifecycleError::Conflict(format!("an account with email {email} already exists"))
}
