use std::fmt;

use serde::{Deserialize, Serialize};

/// Why a refresh token stopped being trusted.
///
/// Stored next to the revoked record so the audit trail says more than
/// "revoked".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevocationReason {
    /// Consumed by a successful refresh and replaced by a successor.
    Rotation,
    /// The holder asked for this token to be revoked.
    UserLogout,
    /// The account password changed, ending every session.
    PasswordChange,
    /// All sessions for the account were ended at once.
    SessionsRevoked,
}

impl RevocationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rotation => "rotation",
            Self::UserLogout => "user_logout",
            Self::PasswordChange => "password_change",
            Self::SessionsRevoked => "sessions_revoked",
        }
    }
}

impl fmt::Display for RevocationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
