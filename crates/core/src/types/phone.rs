//! Customer phone number type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Phone`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum PhoneError {
    /// The input string is empty after sanitization.
    #[error("phone number cannot be empty")]
    Empty,
    /// The number has the wrong digit count for any accepted format.
    #[error("phone number has an invalid format")]
    InvalidFormat,
}

/// A customer phone number, normalized to international Sudanese format.
///
/// Orders are confirmed by phone, so this is the one customer field that is
/// strictly validated. Accepted input shapes (after stripping everything but
/// digits and a leading `+`):
///
/// - `+2499XXXXXXXX` / `2499XXXXXXXX` (already international)
/// - `09XXXXXXXX` / `01XXXXXXXX` (local ten-digit form)
///
/// All of them normalize to `+249` followed by nine digits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Phone(String);

impl Phone {
    /// Country calling code for Sudan.
    pub const COUNTRY_CODE: &'static str = "+249";

    /// Parse and normalize a phone number.
    ///
    /// # Errors
    ///
    /// Returns [`PhoneError::Empty`] if nothing remains after sanitization,
    /// or [`PhoneError::InvalidFormat`] if the digits do not match any
    /// accepted shape.
    pub fn parse(input: &str) -> Result<Self, PhoneError> {
        // Keep digits and a leading plus, drop spaces, dashes and the rest.
        let mut sanitized = String::with_capacity(input.len());
        for (i, c) in input.trim().chars().enumerate() {
            if c.is_ascii_digit() || (c == '+' && i == 0) {
                sanitized.push(c);
            }
        }

        if sanitized.is_empty() {
            return Err(PhoneError::Empty);
        }

        let digits = sanitized.strip_prefix('+').unwrap_or(&sanitized);

        let national = if let Some(rest) = digits.strip_prefix("249") {
            rest
        } else if let Some(rest) = digits.strip_prefix('0') {
            rest
        } else {
            digits
        };

        // Nine national digits, mobile (9x) or landline-mobile (1x) ranges.
        if national.len() != 9 || !national.starts_with(['9', '1']) {
            return Err(PhoneError::InvalidFormat);
        }

        Ok(Self(format!("{}{national}", Self::COUNTRY_CODE)))
    }

    /// Returns the normalized number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
