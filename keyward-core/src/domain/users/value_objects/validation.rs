use std::fmt;

use thiserror::Error;

/// Why a value object refused its input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationReason {
    /// Input was empty or whitespace only.
    Empty,
    /// Trimmed input is shorter than the minimum (in characters).
    TooShort { min: usize },
    /// Trimmed input is longer than the maximum (in characters).
    TooLong { max: usize },
    /// Input does not match the expected shape.
    InvalidFormat,
    /// Pattern matching exceeded its time budget.
    MatchTimeout,
    /// A required leading character is missing.
    MissingPrefix(char),
    /// Only digits are allowed after the prefix.
    NonDigit,
    /// The first digit must not be zero.
    LeadingZero,
    MissingUppercase,
    MissingLowercase,
    MissingDigit,
    MissingSpecial,
}

impl fmt::Display for ValidationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "cannot be empty or whitespace"),
            Self::TooShort { min } => {
                write!(f, "must be at least {min} characters")
            }
            Self::TooLong { max } => write!(f, "cannot exceed {max} characters"),
            Self::InvalidFormat => write!(f, "has an invalid format"),
            Self::MatchTimeout => write!(f, "validation timed out"),
            Self::MissingPrefix(prefix) => write!(f, "must start with '{prefix}'"),
            Self::NonDigit => write!(f, "must contain only digits after the prefix"),
            Self::LeadingZero => write!(f, "cannot start with a zero digit"),
            Self::MissingUppercase => {
                write!(f, "must contain at least one uppercase letter")
            }
            Self::MissingLowercase => {
                write!(f, "must contain at least one lowercase letter")
            }
            Self::MissingDigit => write!(f, "must contain at least one digit"),
            Self::MissingSpecial => {
                write!(f, "must contain at least one special character")
            }
        }
    }
}

/// Raised when input cannot become a value object.
///
/// Carries the offending field name so callers can point at the exact
/// input that needs correcting.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field} {reason}")]
pub struct ValidationError {
    field: &'static str,
    reason: ValidationReason,
}

impl ValidationError {
    pub fn new(field: &'static str, reason: ValidationReason) -> Self {
        Self { field, reason }
    }

    pub fn field(&self) -> &'static str {
        self.field
    }

    pub fn reason(&self) -> &ValidationReason {
        &self.reason
    }
}

/// Trim `raw` and enforce a character-length window, shared by the plain
/// text value objects.
pub(crate) fn trimmed_within(
    field: &'static str,
    raw: &str,
    min: usize,
    max: usize,
) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new(field, ValidationReason::Empty));
    }

    let length = trimmed.chars().count();
    if length > max {
        return Err(ValidationError::new(
            field,
            ValidationReason::TooLong { max },
        ));
    }
    if length < min {
        return Err(ValidationError::new(
            field,
            ValidationReason::TooShort { min },
        ));
    }

    Ok(trimmed.to_string())
}
