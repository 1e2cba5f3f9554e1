//! Identity provider client.
//!
//! Password accounts live with the hosted identity service; the server
//! only ever exchanges credentials or federated tokens for a verified
//! identity. Guest identities never reach this module.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use uuid::Uuid;

use mirra_core::Email;

const MIN_PASSWORD_LEN: usize = 6;

/// Errors from identity operations.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("email already registered")]
    EmailInUse,

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("password must be at least {MIN_PASSWORD_LEN} characters")]
    WeakPassword,

    #[error("federated token rejected")]
    InvalidToken,

    #[error("invalid base url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("identity service error ({status}): {message}")]
    Backend { status: u16, message: String },
}

/// A verified identity returned by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub uid: String,
    pub email: Email,
    pub display_name: Option<String>,
}

/// The identity service surface the binaries need.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Register a password account.
    async fn sign_up(&self, email: &Email, password: &str) -> Result<AuthUser, IdentityError>;

    /// Verify a password credential.
    async fn sign_in(&self, email: &Email, password: &str) -> Result<AuthUser, IdentityError>;

    /// Verify a federated sign-in token minted by an external provider.
    async fn verify_federated(&self, token: &str) -> Result<AuthUser, IdentityError>;
}

fn check_password(password: &str) -> Result<(), IdentityError> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(IdentityError::WeakPassword);
    }
    Ok(())
}

/// [`IdentityProvider`] backed by the hosted identity REST API.
#[derive(Debug, Clone)]
pub struct HttpIdentityProvider {
    client: Client,
    base_url: String,
    api_key: SecretString,
}

#[derive(serde::Deserialize)]
struct AccountResponse {
    uid: String,
    email: String,
    #[serde(default)]
    display_name: Option<String>,
}

impl HttpIdentityProvider {
    /// Build a client against `base_url`.
    ///
    /// # Errors
    ///
    /// Fails on a malformed base URL or if the underlying HTTP client
    /// cannot be constructed.
    pub fn new(base_url: &str, api_key: SecretString) -> Result<Self, IdentityError> {
        url::Url::parse(base_url)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            api_key,
        })
    }

    async fn call(
        &self,
        endpoint: &str,
        body: serde_json::Value,
    ) -> Result<AuthUser, IdentityError> {
        let url = format!("{}/accounts:{endpoint}", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("x-api-key", self.api_key.expose_secret())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                401 | 403 => match endpoint {
                    "verifyToken" => IdentityError::InvalidToken,
                    _ => IdentityError::InvalidCredentials,
                },
                409 => IdentityError::EmailInUse,
                code => IdentityError::Backend {
                    status: code,
                    message,
                },
            });
        }

        let account: AccountResponse = response.json().await?;
        let email = Email::parse(&account.email).map_err(|_| IdentityError::Backend {
            status: 502,
            message: "identity service returned a malformed email".to_owned(),
        })?;
        Ok(AuthUser {
            uid: account.uid,
            email,
            display_name: account.display_name,
        })
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn sign_up(&self, email: &Email, password: &str) -> Result<AuthUser, IdentityError> {
        check_password(password)?;
        self.call(
            "signUp",
            serde_json::json!({ "email": email.as_str(), "password": password }),
        )
        .await
    }

    async fn sign_in(&self, email: &Email, password: &str) -> Result<AuthUser, IdentityError> {
        self.call(
            "signInWithPassword",
            serde_json::json!({ "email": email.as_str(), "password": password }),
        )
        .await
    }

    async fn verify_federated(&self, token: &str) -> Result<AuthUser, IdentityError> {
        self.call("verifyToken", serde_json::json!({ "token": token }))
            .await
    }
}

/// In-memory [`IdentityProvider`] for tests.
#[derive(Default)]
pub struct MemoryIdentityProvider {
    accounts: Mutex<HashMap<String, (String, String)>>,
}

impl MemoryIdentityProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    async fn sign_up(&self, email: &Email, password: &str) -> Result<AuthUser, IdentityError> {
        check_password(password)?;
        let mut accounts = self
            .accounts
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if accounts.contains_key(email.as_str()) {
            return Err(IdentityError::EmailInUse);
        }
        let uid = Uuid::new_v4().simple().to_string();
        accounts.insert(email.as_str().to_owned(), (password.to_owned(), uid.clone()));
        Ok(AuthUser {
            uid,
            email: email.clone(),
            display_name: None,
        })
    }

    async fn sign_in(&self, email: &Email, password: &str) -> Result<AuthUser, IdentityError> {
        let accounts = self
            .accounts
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        match accounts.get(email.as_str()) {
            Some((stored, uid)) if stored == password => Ok(AuthUser {
                uid: uid.clone(),
                email: email.clone(),
                display_name: None,
            }),
            _ => Err(IdentityError::InvalidCredentials),
        }
    }

    async fn verify_federated(&self, token: &str) -> Result<AuthUser, IdentityError> {
        // Test tokens are "<uid>:<email>".
        let (uid, email) = token.split_once(':').ok_or(IdentityError::InvalidToken)?;
        let email = Email::parse(email).map_err(|_| IdentityError::InvalidToken)?;
        Ok(AuthUser {
            uid: uid.to_owned(),
            email,
            display_name: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email(s: &str) -> Email {
        Email::parse(s).expect("valid email")
    }

    #[tokio::test]
    async fn sign_up_then_sign_in() {
        let provider = MemoryIdentityProvider::new();
        let created = provider
            .sign_up(&email("amina@example.com"), "hunter24")
            .await
            .expect("sign up");
        let signed_in = provider
            .sign_in(&email("amina@example.com"), "hunter24")
            .await
            .expect("sign in");
        assert_eq!(created.uid, signed_in.uid);
    }

    #[tokio::test]
    async fn duplicate_registration_rejected() {
        let provider = MemoryIdentityProvider::new();
        provider
            .sign_up(&email("amina@example.com"), "hunter24")
            .await
            .expect("first");
        assert!(matches!(
            provider.sign_up(&email("amina@example.com"), "hunter24").await,
            Err(IdentityError::EmailInUse)
        ));
    }

    #[tokio::test]
    async fn short_password_rejected_before_any_call() {
        let provider = MemoryIdentityProvider::new();
        assert!(matches!(
            provider.sign_up(&email("amina@example.com"), "short").await,
            Err(IdentityError::WeakPassword)
        ));
    }

    #[tokio::test]
    async fn wrong_password_is_invalid_credentials() {
        let provider = MemoryIdentityProvider::new();
        provider
            .sign_up(&email("amina@example.com"), "hunter24")
            .await
            .expect("sign up");
        assert!(matches!(
            provider.sign_in(&email("amina@example.com"), "wrong-pass").await,
            Err(IdentityError::InvalidCredentials)
        ));
    }
}
