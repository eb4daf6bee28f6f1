use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::validation::{ValidationError, trimmed_within};

const MAX_LENGTH: usize = 50;

/// Account role. Free-form, compared by value.
///
/// The well-known roles are constants, so they never go through parsing:
///
/// ```
/// use keyward_core::domain::users::value_objects::Role;
///
/// assert_eq!(Role::parse(" Admin ").unwrap(), Role::ADMIN);
/// assert!(Role::ADMIN.is_admin());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Role(Cow<'static, str>);

impl Role {
    pub const ADMIN: Role = Role(Cow::Borrowed("Admin"));
    pub const USER: Role = Role(Cow::Borrowed("User"));
    pub const MANAGER: Role = Role(Cow::Borrowed("Manager"));

    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        trimmed_within("role", raw, 1, MAX_LENGTH).map(|value| Self(Cow::Owned(value)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_admin(&self) -> bool {
        *self == Self::ADMIN
    }

    pub fn is_in(&self, roles: &[Role]) -> bool {
        roles.contains(self)
    }
}

impl Default for Role {
    fn default() -> Self {
        Self::USER
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Role {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Role> for String {
    fn from(value: Role) -> Self {
        value.0.into_owned()
    }
}
