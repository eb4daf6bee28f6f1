use std::fmt;

use zeroize::Zeroizing;

use super::validation::{ValidationError, ValidationReason};

const FIELD: &str = "password";

/// Characters that satisfy the special-character rule.
pub const PASSWORD_SPECIAL_CHARACTERS: &str = r#"!@#$%^&*()-_=+[{]}\|;:'",<.>/?"#;

/// Strength rules applied to raw passwords, checked in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordRule {
    MinLength(usize),
    Uppercase,
    Lowercase,
    Digit,
    Special,
}

impl PasswordRule {
    pub const MIN_LENGTH: usize = 10;

    /// Rules in the order they are evaluated. The first failure is reported.
    pub const ALL: [PasswordRule; 5] = [
        PasswordRule::MinLength(Self::MIN_LENGTH),
        PasswordRule::Uppercase,
        PasswordRule::Lowercase,
        PasswordRule::Digit,
        PasswordRule::Special,
    ];

    fn is_satisfied_by(&self, password: &str) -> bool {
        match self {
            Self::MinLength(min) => password.chars().count() >= *min,
            Self::Uppercase => password.chars().any(char::is_uppercase),
            Self::Lowercase => password.chars().any(char::is_lowercase),
            Self::Digit => password.chars().any(|c| c.is_ascii_digit()),
            Self::Special => password
                .chars()
                .any(|c| PASSWORD_SPECIAL_CHARACTERS.contains(c)),
        }
    }

    fn reason(&self) -> ValidationReason {
        match self {
            Self::MinLength(min) => ValidationReason::TooShort { min: *min },
            Self::Uppercase => ValidationReason::MissingUppercase,
            Self::Lowercase => ValidationReason::MissingLowercase,
            Self::Digit => ValidationReason::MissingDigit,
            Self::Special => ValidationReason::MissingSpecial,
        }
    }
}

/// A plaintext password that passed the strength rules.
///
/// Only exists between the inbound request and the hasher. The buffer is
/// wiped on drop and never printed.
#[derive(Clone)]
pub struct RawPassword(Zeroizing<String>);

impl RawPassword {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::new(FIELD, ValidationReason::Empty));
        }

        if let Some(rule) = PasswordRule::ALL
            .iter()
            .find(|rule| !rule.is_satisfied_by(trimmed))
        {
            return Err(ValidationError::new(FIELD, rule.reason()));
        }

        Ok(Self(Zeroizing::new(trimmed.to_string())))
    }

    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for RawPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RawPassword(***)")
    }
}

impl fmt::Display for RawPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}
