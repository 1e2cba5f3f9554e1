//! Environment variable helpers shared by the server binaries.
//!
//! Secrets are validated at load time: a placeholder value or a
//! low-entropy string is a deployment mistake, and refusing to boot is
//! cheaper than finding out in production.

use std::collections::HashMap;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_SESSION_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Common placeholder patterns, matched case-insensitively.
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
];

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),

    #[error("insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Get a required environment variable.
///
/// # Errors
///
/// Returns [`ConfigError::MissingEnvVar`] when unset.
pub fn required(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_owned()))
}

/// Get an optional environment variable.
#[must_use]
pub fn optional(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable, falling back to a default.
#[must_use]
pub fn or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

/// Load a secret and refuse placeholders and low-entropy values.
///
/// # Errors
///
/// Returns [`ConfigError::InsecureSecret`] when the value looks like a
/// placeholder or its Shannon entropy is too low for a generated secret.
pub fn validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = required(key)?;
    validate_strength(&value, key)?;
    Ok(SecretString::from(value))
}

/// Load a session-signing secret: strength checks plus a length floor.
///
/// # Errors
///
/// Returns [`ConfigError::InsecureSecret`] on length or strength failure.
pub fn session_secret(key: &str) -> Result<SecretString, ConfigError> {
    let secret = validated_secret(key)?;
    if secret.expose_secret().len() < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            key.to_owned(),
            format!(
                "must be at least {MIN_SESSION_SECRET_LENGTH} characters (got {})",
                secret.expose_secret().len()
            ),
        ));
    }
    Ok(secret)
}

fn validate_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_owned(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_owned(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}); use a randomly generated value"
            ),
        ));
    }
    Ok(())
}

/// Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)]
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entropy_of_uniform_string_is_zero() {
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn entropy_of_random_string_is_high() {
        assert!(shannon_entropy("aB3$xY9!mK2@nL5#") > 3.3);
    }

    #[test]
    fn placeholder_secrets_rejected() {
        assert!(matches!(
            validate_strength("changeme123", "TEST_VAR"),
            Err(ConfigError::InsecureSecret(_, _))
        ));
        assert!(matches!(
            validate_strength("your-api-key-here", "TEST_VAR"),
            Err(ConfigError::InsecureSecret(_, _))
        ));
    }

    #[test]
    fn low_entropy_secrets_rejected() {
        assert!(matches!(
            validate_strength(&"ab".repeat(20), "TEST_VAR"),
            Err(ConfigError::InsecureSecret(_, _))
        ));
    }

    #[test]
    fn strong_secrets_accepted() {
        assert!(validate_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR").is_ok());
    }
}
