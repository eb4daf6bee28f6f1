use std::fmt;
use std::time::{Duration, Instant};

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use super::validation::{ValidationError, ValidationReason};

const FIELD: &str = "email";
const MIN_LENGTH: usize = 3;
const MAX_LENGTH: usize = 254;

/// Upper bound on time spent matching a single address.
pub const EMAIL_MATCH_BUDGET: Duration = Duration::from_millis(250);

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    // The compiled automaton is capped so a pathological pattern cannot
    // balloon memory; `regex` itself never backtracks.
    RegexBuilder::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
        .size_limit(1 << 20)
        .build()
        .expect("email regex should compile")
});

/// A normalized e-mail address.
///
/// ## Invariants
/// - trimmed and lower-cased
/// - 3 to 254 characters
/// - shaped `local@domain.tld`
///
/// ```
/// use keyward_core::domain::users::value_objects::Email;
///
/// let email = Email::parse("  Alice@Example.COM ").unwrap();
/// assert_eq!(email.as_str(), "alice@example.com");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        Self::parse_within(raw, EMAIL_MATCH_BUDGET)
    }

    /// Parse with an explicit match budget. A match that overruns the
    /// budget is rejected even if it would have succeeded.
    pub fn parse_within(
        raw: &str,
        budget: Duration,
    ) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::new(FIELD, ValidationReason::Empty));
        }

        let length = trimmed.chars().count();
        if length > MAX_LENGTH {
            return Err(ValidationError::new(
                FIELD,
                ValidationReason::TooLong { max: MAX_LENGTH },
            ));
        }
        if length < MIN_LENGTH {
            return Err(ValidationError::new(
                FIELD,
                ValidationReason::TooShort { min: MIN_LENGTH },
            ));
        }

        let started = Instant::now();
        let matched = EMAIL_REGEX.is_match(trimmed);
        within_budget(started.elapsed(), budget)?;
        if !matched {
            return Err(ValidationError::new(
                FIELD,
                ValidationReason::InvalidFormat,
            ));
        }

        Ok(Self(trimmed.to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The part after the last `@`.
    pub fn domain(&self) -> &str {
        self.0.rsplit('@').next().unwrap_or_default()
    }

    pub fn is_from_domain(&self, domains: &[&str]) -> bool {
        let own = self.domain();
        domains.iter().any(|domain| own.eq_ignore_ascii_case(domain))
    }
}

/// A match that took longer than `budget` counts as a failure, whatever it
/// returned.
fn within_budget(elapsed: Duration, budget: Duration) -> Result<(), ValidationError> {
    if elapsed > budget {
        return Err(ValidationError::new(FIELD, ValidationReason::MatchTimeout));
    }
    Ok(())
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Email {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.0
    }
}
