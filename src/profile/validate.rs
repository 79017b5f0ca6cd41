use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::models::ProfileField;

// Anchored at both ends: typed profile answers must be the field value and
// nothing else.
static STRICT_EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("strict email regex")
});

// 10 digits, first digit 6-9, optional +91 / 0 prefix.
static STRICT_PHONE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:\+?91[\s-]?|0)?[6-9][0-9]{9}$").expect("strict phone regex"));

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("name cannot be empty")]
    EmptyName,
    #[error("that does not look like a valid email address")]
    InvalidEmail,
    #[error("phone must be 10 digits starting with 6-9, with an optional country code")]
    InvalidPhone,
}

/// Checks a typed answer for the profile field it is about to fill. A failed
/// check mutates nothing; the caller re-prompts the same field.
pub fn validate_field(field: ProfileField, value: &str) -> Result<(), ValidationError> {
    let value = value.trim();
    match field {
        ProfileField::Name => {
            if value.is_empty() {
                Err(ValidationError::EmptyName)
            } else {
                Ok(())
            }
        }
        ProfileField::Email => {
            if STRICT_EMAIL.is_match(value) {
                Ok(())
            } else {
                Err(ValidationError::InvalidEmail)
            }
        }
        ProfileField::Phone => {
            if STRICT_PHONE.is_match(value) {
                Ok(())
            } else {
                Err(ValidationError::InvalidPhone)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_emails_pass() {
        for email in ["jane@x.com", "a.b+tag@sub.domain.org", "X_1@y.co"] {
            assert_eq!(validate_field(ProfileField::Email, email), Ok(()), "{email}");
        }
    }

    #[test]
    fn test_invalid_emails_rejected() {
        for email in ["jane", "jane@", "@x.com", "jane@x", "jane doe@x.com", "jane@x.com extra"] {
            assert_eq!(
                validate_field(ProfileField::Email, email),
                Err(ValidationError::InvalidEmail),
                "{email}"
            );
        }
    }

    #[test]
    fn test_valid_phones_pass() {
        for phone in ["9876543210", "6123456789", "+91 9876543210", "+919876543210", "09876543210"] {
            assert_eq!(validate_field(ProfileField::Phone, phone), Ok(()), "{phone}");
        }
    }

    #[test]
    fn test_short_or_misformed_phones_rejected() {
        for phone in ["12345", "1234567890", "98765432101", "phone", "98765 43210x"] {
            assert_eq!(
                validate_field(ProfileField::Phone, phone),
                Err(ValidationError::InvalidPhone),
                "{phone}"
            );
        }
    }

    #[test]
    fn test_name_only_requires_non_empty() {
        assert_eq!(validate_field(ProfileField::Name, "Jane Doe"), Ok(()));
        assert_eq!(
            validate_field(ProfileField::Name, "   "),
            Err(ValidationError::EmptyName)
        );
    }
}
