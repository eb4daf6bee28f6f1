use std::fmt;

use serde::{Deserialize, Serialize};

use super::validation::{ValidationError, trimmed_within};

/// Postal address. Every part is trimmed and length-checked.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "AddressParts")]
pub struct Address {
    street: String,
    city: String,
    postal_code: String,
    country: String,
}

impl Address {
    pub fn new(
        street: &str,
        city: &str,
        postal_code: &str,
        country: &str,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            street: trimmed_within("street", street, 2, 100)?,
            city: trimmed_within("city", city, 2, 50)?,
            postal_code: trimmed_within("postal_code", postal_code, 2, 20)?,
            country: trimmed_within("country", country, 2, 50)?,
        })
    }

    pub fn street(&self) -> &str {
        &self.street
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn postal_code(&self) -> &str {
        &self.postal_code
    }

    pub fn country(&self) -> &str {
        &self.country
    }

    /// `"street, postal city, country"`
    pub fn single_line(&self) -> String {
        format!(
            "{}, {} {}, {}",
            self.street, self.postal_code, self.city, self.country
        )
    }

    pub fn is_in_country(&self, countries: &[&str]) -> bool {
        countries
            .iter()
            .any(|country| self.country.to_lowercase() == country.to_lowercase())
    }
}

#[derive(Deserialize)]
struct AddressParts {
    street: String,
    city: String,
    postal_code: String,
    country: String,
}

impl TryFrom<AddressParts> for Address {
    type Error = ValidationError;

    fn try_from(parts: AddressParts) -> Result<Self, Self::Error> {
        Self::new(&parts.street, &parts.city, &parts.postal_code, &parts.country)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.street)?;
        writeln!(f, "{} {}", self.postal_code, self.city)?;
        write!(f, "{}", self.country)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::users::value_objects::ValidationReason;

    #[test]
    fn trims_every_part() {
        let address =
            Address::new(" Rue Neuve 1 ", " Bruxelles ", " 1000 ", " Belgique ")
                .unwrap();
        assert_eq!(address.street(), "Rue Neuve 1");
        assert_eq!(address.city(), "Bruxelles");
        assert_eq!(address.postal_code(), "1000");
        assert_eq!(address.country(), "Belgique");
        assert_eq!(address.single_line(), "Rue Neuve 1, 1000 Bruxelles, Belgique");
    }

    #[test]
    fn reports_the_failing_part() {
        let err = Address::new("Rue", "B", "1000", "Belgique").unwrap_err();
        assert_eq!(err.field(), "city");
        assert_eq!(err.reason(), &ValidationReason::TooShort { min: 2 });

        let err = Address::new("Rue", "Bruxelles", &"9".repeat(21), "Belgique")
            .unwrap_err();
        assert_eq!(err.field(), "postal_code");
        assert_eq!(err.reason(), &ValidationReason::TooLong { max: 20 });

        let err = Address::new("Rue", "Bruxelles", "1000", "  ").unwrap_err();
        assert_eq!(err.field(), "country");
        assert_eq!(err.reason(), &ValidationReason::Empty);
    }

    #[test]
    fn street_allows_one_hundred_characters() {
        assert!(Address::new(&"s".repeat(100), "City", "1000", "Land").is_ok());
        assert!(Address::new(&"s".repeat(101), "City", "1000", "Land").is_err());
    }

    #[test]
    fn country_match_ignores_case() {
        let address = Address::new("Rue", "Bruxelles", "1000", "Belgique").unwrap();
        assert!(address.is_in_country(&["france", "BELGIQUE"]));
        assert!(!address.is_in_country(&["Belgium"]));
    }

    #[test]
    fn display_spans_three_lines() {
        let address = Address::new("Rue", "Bruxelles", "1000", "Belgique").unwrap();
        assert_eq!(address.to_string(), "Rue\n1000 Bruxelles\nBelgique");
    }
}
