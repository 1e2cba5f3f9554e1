//! Staff role management.
//!
//! # Usage
//!
//! ```bash
//! mirra-cli admin grant -e staff@example.com -r manager
//! ```
//!
//! The account must already exist (the person signs up through the
//! storefront first); this only flips the role on their profile.
//!
//! # Environment Variables
//!
//! - `MIRRA_DOCUMENT_API_URL` - Base URL of the hosted document API
//! - `MIRRA_API_KEY` - Project API key

use thiserror::Error;
use tracing::info;

use mirra_backend::services::ProfileService;
use mirra_core::Role;

use super::gateway_from_env;

/// Errors that can occur during role management.
#[derive(Debug, Error)]
pub enum GrantError {
    /// Invalid role name.
    #[error("Invalid role: {0}. Valid roles: admin, manager, editor, viewer, user")]
    InvalidRole(String),
}

/// Assign `role` to the account registered under `email`.
///
/// # Errors
///
/// Returns an error for unknown roles, missing configuration, or when
/// no profile carries that email.
pub async fn grant_role(email: &str, role: &str) -> Result<(), Box<dyn std::error::Error>> {
    let role: Role = role
        .parse()
        .map_err(|_| GrantError::InvalidRole(role.to_owned()))?;

    let gateway = gateway_from_env()?;
    let profiles = ProfileService::new(gateway);

    let profile = profiles.grant_role(email, role).await?;
    info!(uid = %profile.id, %role, "role granted");
    if role.is_admin() {
        info!("account can now sign in to the admin API");
    }
    Ok(())
}
