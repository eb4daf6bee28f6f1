use thiserror::Error;
use uuid::Uuid;

use crate::domain::users::auth::{PasswordHashError, TokenIssueError};
use crate::domain::users::value_objects::ValidationError;

/// Errors crossing the credential lifecycle boundary.
#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    Conflict(String),

    /// Deliberately uniform for every authentication failure.
    #[error("Invalid credentials")]
    Unauthorized,

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },

    /// Record store failure, passed through untouched.
    #[error(transparent)]
    Store(#[from] anyhow::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<PasswordHashError> for LifecycleError {
    fn from(err: PasswordHashError) -> Self {
        match err {
            PasswordHashError::Validation(err) => Self::Validation(err),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<TokenIssueError> for LifecycleError {
    fn from(err: TokenIssueError) -> Self {
        Self::Internal(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LifecycleError>;
