use std::fmt;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::domain::users::auth::domain::value_objects::{
    RefreshToken, RefreshTokenError,
};
use crate::domain::users::value_objects::{Email, Role};

#[derive(Debug, Error)]
pub enum TokenIssueError {
    #[error("signing secret must not be empty")]
    EmptySecret,
    #[error("{0} must not be empty")]
    EmptyClaim(&'static str),
    #[error("{name} must be at least 1 (got {value})")]
    InvalidLifetime { name: &'static str, value: i64 },
    #[error("failed to sign access token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
    #[error(transparent)]
    RefreshToken(#[from] RefreshTokenError),
}

/// Issuer configuration, read-only once the process has started.
#[derive(Clone)]
pub struct TokenSettings {
    signing_secret: Zeroizing<Vec<u8>>,
    issuer: String,
    audience: String,
    access_token_lifetime: Duration,
    refresh_token_lifetime: Duration,
}

impl TokenSettings {
    pub const DEFAULT_ACCESS_TOKEN_MINUTES: i64 = 15;
    pub const DEFAULT_REFRESH_TOKEN_DAYS: i64 = 7;

    pub fn new(
        signing_secret: impl AsRef<[u8]>,
        issuer: impl Into<String>,
        audience: impl Into<String>,
        access_token_minutes: i64,
        refresh_token_days: i64,
    ) -> Result<Self, TokenIssueError> {
        let secret = signing_secret.as_ref();
        if secret.is_empty() {
            return Err(TokenIssueError::EmptySecret);
        }

        let issuer = issuer.into().trim().to_string();
        if issuer.is_empty() {
            return Err(TokenIssueError::EmptyClaim("issuer"));
        }

        let audience = audience.into().trim().to_string();
        if audience.is_empty() {
            return Err(TokenIssueError::EmptyClaim("audience"));
        }

        let access_token_lifetime =
            lifetime("access_token_minutes", access_token_minutes, Duration::try_minutes)?;
        let refresh_token_lifetime =
            lifetime("refresh_token_days", refresh_token_days, Duration::try_days)?;

        Ok(Self {
            signing_secret: Zeroizing::new(secret.to_vec()),
            issuer,
            audience,
            access_token_lifetime,
            refresh_token_lifetime,
        })
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    pub fn access_token_lifetime(&self) -> Duration {
        self.access_token_lifetime
    }

    pub fn refresh_token_lifetime(&self) -> Duration {
        self.refresh_token_lifetime
    }
}

fn lifetime(
    name: &'static str,
    value: i64,
    build: fn(i64) -> Option<Duration>,
) -> Result<Duration, TokenIssueError> {
    if value < 1 {
        return Err(TokenIssueError::InvalidLifetime { name, value });
    }
    build(value).ok_or(TokenIssueError::InvalidLifetime { name, value })
}

impl fmt::Debug for TokenSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSettings")
            .field("signing_secret", &"***")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("access_token_lifetime", &self.access_token_lifetime)
            .field("refresh_token_lifetime", &self.refresh_token_lifetime)
            .finish()
    }
}

/// Claim set carried by an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: Uuid,
    pub email: String,
    pub role: String,
    pub jti: Uuid,
    pub iss: String,
    pub aud: String,
    pub exp: i64,
    pub iat: i64,
}

/// A freshly signed access token together with its metadata.
#[derive(Debug, Clone)]
pub struct IssuedAccessToken {
    pub token: String,
    pub jti: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// Mints HS256 access tokens and opaque refresh tokens.
///
/// Issuance only. Access-token verification belongs to whatever sits in
/// front of the core.
#[derive(Clone)]
pub struct TokenIssuer {
    settings: TokenSettings,
    key: EncodingKey,
}

impl fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    pub fn new(settings: TokenSettings) -> Self {
        let key = EncodingKey::from_secret(&settings.signing_secret);
        Self { settings, key }
    }

    pub fn settings(&self) -> &TokenSettings {
        &self.settings
    }

    pub fn issue_access_token(
        &self,
        user_id: Uuid,
        email: &Email,
        role: &Role,
    ) -> Result<IssuedAccessToken, TokenIssueError> {
        let now = Utc::now();
        let expires_at = now + self.settings.access_token_lifetime;
        let jti = Uuid::now_v7();

        let claims = AccessClaims {
            sub: user_id,
            email: email.as_str().to_string(),
            role: role.as_str().to_string(),
            jti,
            iss: self.settings.issuer.clone(),
            aud: self.settings.audience.clone(),
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.key)?;

        Ok(IssuedAccessToken {
            token,
            jti,
            expires_at,
        })
    }

    pub fn issue_refresh_token(&self) -> Result<RefreshToken, TokenIssueError> {
        Ok(RefreshToken::generate()?)
    }

    /// Expiry for a refresh token issued at `issued_at`.
    pub fn refresh_expiry(&self, issued_at: DateTime<Utc>) -> DateTime<Utc> {
        issued_at + self.settings.refresh_token_lifetime
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{DecodingKey, Validation, decode};

    const SECRET: &str = "an-adequately-long-signing-secret-for-tests";

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(
            TokenSettings::new(SECRET, "keyward", "keyward-clients", 15, 7).unwrap(),
        )
    }

    fn validation() -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&["keyward"]);
        validation.set_audience(&["keyward-clients"]);
        validation
    }

    #[test]
    fn access_token_carries_identity_claims() {
        let user_id = Uuid::now_v7();
        let email = Email::parse("ada@example.com").unwrap();
        let issued = issuer()
            .issue_access_token(user_id, &email, &Role::MANAGER)
            .unwrap();

        let data = decode::<AccessClaims>(
            &issued.token,
            &DecodingKey::from_secret(SECRET.as_bytes()),
            &validation(),
        )
        .unwrap();

        assert_eq!(data.header.alg, Algorithm::HS256);
        assert_eq!(data.claims.sub, user_id);
        assert_eq!(data.claims.email, "ada@example.com");
        assert_eq!(data.claims.role, "Manager");
        assert_eq!(data.claims.jti, issued.jti);
        assert_eq!(data.claims.exp, issued.expires_at.timestamp());
        assert_eq!(data.claims.exp - data.claims.iat, 15 * 60);
    }

    #[test]
    fn every_access_token_gets_a_fresh_jti() {
        let email = Email::parse("ada@example.com").unwrap();
        let issuer = issuer();
        let user_id = Uuid::now_v7();
        let first = issuer.issue_access_token(user_id, &email, &Role::USER).unwrap();
        let second = issuer.issue_access_token(user_id, &email, &Role::USER).unwrap();
        assert_ne!(first.jti, second.jti);
    }

    #[test]
    fn wrong_secret_does_not_verify() {
        let email = Email::parse("ada@example.com").unwrap();
        let issued = issuer()
            .issue_access_token(Uuid::now_v7(), &email, &Role::USER)
            .unwrap();

        let result = decode::<AccessClaims>(
            &issued.token,
            &DecodingKey::from_secret(b"some-other-secret-entirely-different"),
            &validation(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn refresh_expiry_uses_days() {
        let issuer = issuer();
        let now = Utc::now();
        assert_eq!(issuer.refresh_expiry(now) - now, Duration::days(7));
        assert!(!issuer.issue_refresh_token().unwrap().as_str().is_empty());
    }

    #[test]
    fn settings_reject_bad_values() {
        assert!(matches!(
            TokenSettings::new("", "iss", "aud", 15, 7),
            Err(TokenIssueError::EmptySecret)
        ));
        assert!(matches!(
            TokenSettings::new(SECRET, " ", "aud", 15, 7),
            Err(TokenIssueError::EmptyClaim("issuer"))
        ));
        assert!(matches!(
            TokenSettings::new(SECRET, "iss", "", 15, 7),
            Err(TokenIssueError::EmptyClaim("audience"))
        ));
        assert!(matches!(
            TokenSettings::new(SECRET, "iss", "aud", 0, 7),
            Err(TokenIssueError::InvalidLifetime { name: "access_token_minutes", value: 0 })
        ));
        assert!(matches!(
            TokenSettings::new(SECRET, "iss", "aud", 15, -1),
            Err(TokenIssueError::InvalidLifetime { name: "refresh_token_days", value: -1 })
        ));
    }

    #[test]
    fn debug_hides_the_secret() {
        let rendered = format!("{:?}", issuer());
        assert!(!rendered.contains(SECRET));
    }
}
