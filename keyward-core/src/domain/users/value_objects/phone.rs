use std::fmt;

use serde::{Deserialize, Serialize};

use super::validation::{ValidationError, ValidationReason};

const FIELD: &str = "phone";
const MIN_LENGTH: usize = 3;
const MAX_LENGTH: usize = 16;

/// International phone number in `+<digits>` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Phone(String);

impl Phone {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::new(FIELD, ValidationReason::Empty));
        }

        let length = trimmed.chars().count();
        if length < MIN_LENGTH {
            return Err(ValidationError::new(
                FIELD,
                ValidationReason::TooShort { min: MIN_LENGTH },
            ));
        }
        if length > MAX_LENGTH {
            return Err(ValidationError::new(
                FIELD,
                ValidationReason::TooLong { max: MAX_LENGTH },
            ));
        }

        let Some(digits) = trimmed.strip_prefix('+') else {
            return Err(ValidationError::new(
                FIELD,
                ValidationReason::MissingPrefix('+'),
            ));
        };

        if !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(ValidationError::new(FIELD, ValidationReason::NonDigit));
        }

        if digits.starts_with('0') {
            return Err(ValidationError::new(
                FIELD,
                ValidationReason::LeadingZero,
            ));
        }

        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Phone {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Phone> for String {
    fn from(value: Phone) -> Self {
        value.0
    }
}
