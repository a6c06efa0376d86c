//! Recipient Normalizer - canonical international phone addresses
//!
//! Rules, in order:
//! 1. Strip every non-digit character.
//! 2. A leading zero is replaced with the configured country prefix.
//! 3. A bare local number (digit count == configured local length) gets the
//!    prefix prepended.
//! 4. Anything else is assumed to already be international and returned
//!    unchanged.
//!
//! The only error case is input with no digits at all. Callers rely on
//! "never panics, worst case returns the digits as-is".

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizationError {
    #[error("recipient contains no digits")]
    NoDigits,
}

/// A canonical international-format address produced by the normalizer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedAddress(String);

impl NormalizedAddress {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for NormalizedAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Canonicalizes raw recipient strings.
#[derive(Debug, Clone)]
pub struct RecipientNormalizer {
    country_prefix: String,
    local_length: usize,
}

impl RecipientNormalizer {
    pub fn new(country_prefix: impl Into<String>, local_length: usize) -> Self {
        Self {
            country_prefix: country_prefix.into(),
            local_length,
        }
    }

    pub fn normalize(&self, raw: &str) -> Result<NormalizedAddress, NormalizationError> {
        let cleaned: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();

        if cleaned.is_empty() {
            return Err(NormalizationError::NoDigits);
        }

        let canonical = if let Some(rest) = cleaned.strip_prefix('0') {
            format!("{}{}", self.country_prefix, rest)
        } else if cleaned.len() == self.local_length {
            format!("{}{}", self.country_prefix, cleaned)
        } else {
            cleaned
        };

        Ok(NormalizedAddress(canonical))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> RecipientNormalizer {
        RecipientNormalizer::new("94", 9)
    }

    #[test]
    fn leading_zero_is_replaced_with_prefix() {
        let addr = normalizer().normalize("0771234567").unwrap();
        assert_eq!(addr.as_str(), "94771234567");
    }

    #[test]
    fn bare_local_number_gets_prefix() {
        let addr = normalizer().normalize("771234567").unwrap();
        assert_eq!(addr.as_str(), "94771234567");
    }

    #[test]
    fn international_form_passes_through() {
        let addr = normalizer().normalize("94771234567").unwrap();
        assert_eq!(addr.as_str(), "94771234567");
    }

    #[test]
    fn punctuation_and_spaces_are_stripped() {
        let addr = normalizer().normalize("+94 77-123 4567").unwrap();
        assert_eq!(addr.as_str(), "94771234567");
    }

    #[test]
    fn normalization_is_idempotent() {
        let n = normalizer();
        let once = n.normalize("0771234567").unwrap();
        let twice = n.normalize(once.as_str()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn no_digits_is_the_only_error() {
        assert_eq!(
            normalizer().normalize("not a number"),
            Err(NormalizationError::NoDigits)
        );
        assert_eq!(normalizer().normalize(""), Err(NormalizationError::NoDigits));
    }

    #[test]
    fn unusual_lengths_pass_through_unchanged() {
        // Neither local-length nor zero-prefixed: assumed international
        let addr = normalizer().normalize("4477123456789").unwrap();
        assert_eq!(addr.as_str(), "4477123456789");
    }
}
