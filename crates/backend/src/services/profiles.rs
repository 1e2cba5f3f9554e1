//! Customer and staff profile service.
//!
//! Profiles live under `users/<uid>` and are created lazily on first
//! sign-in. Roles are plain document fields; only the admin binary and
//! the CLI ever change them.

use chrono::Utc;
use serde_json::json;
use thiserror::Error;
use tracing::{info, instrument, warn};

use mirra_core::{Money, Phone, ProductId, Role, UserId};

use crate::Gateway;
use crate::identity::AuthUser;
use crate::models::UserProfile;
use crate::services::Page;
use crate::store::{Query, StoreError, collections};

/// Errors from profile operations.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("profile not found: {0}")]
    NotFound(UserId),

    #[error("no account registered for {0}")]
    UnknownEmail(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Service over the users collection.
#[derive(Clone)]
pub struct ProfileService {
    gateway: Gateway,
}

impl ProfileService {
    #[must_use]
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    /// Fetch one profile.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::NotFound`] for absent IDs.
    pub async fn get(&self, id: &UserId) -> Result<UserProfile, ProfileError> {
        let doc = self
            .gateway
            .get_doc(collections::USERS, id.as_str())
            .await?
            .ok_or_else(|| ProfileError::NotFound(id.clone()))?;
        Ok(UserProfile::from_document(&doc)?)
    }

    /// Fetch the profile for a verified identity, creating it when this
    /// is the first sign-in.
    ///
    /// # Errors
    ///
    /// Propagates store errors.
    #[instrument(skip(self, auth), fields(uid = %auth.uid))]
    pub async fn resolve(&self, auth: &AuthUser) -> Result<UserProfile, ProfileError> {
        let id = UserId::new(&auth.uid);
        if let Some(doc) = self.gateway.get_doc(collections::USERS, id.as_str()).await? {
            return Ok(UserProfile::from_document(&doc)?);
        }

        let now = Utc::now();
        let profile = UserProfile {
            id: id.clone(),
            email: auth.email.clone(),
            display_name: auth.display_name.clone(),
            role: Role::User,
            phone: None,
            address: None,
            favorites: Vec::new(),
            order_count: 0,
            total_spent: Money::ZERO,
            created_at: now,
            updated_at: now,
        };
        self.gateway
            .set(collections::USERS, id.as_str(), profile.to_value()?)
            .await?;
        info!("created profile on first sign-in");
        Ok(profile)
    }

    /// Merge contact details onto a profile. Best-effort; failures are
    /// logged, not surfaced.
    pub async fn sync_contact(&self, id: &UserId, phone: &Phone, address: &str) {
        let result = self
            .gateway
            .set(
                collections::USERS,
                id.as_str(),
                json!({
                    "phone": phone,
                    "address": address,
                    "updated_at": Utc::now(),
                }),
            )
            .await;
        if let Err(err) = result {
            warn!(uid = %id, error = %err, "failed to sync contact details");
        }
    }

    /// Add or remove a favorite. Returns the new favorite state.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::NotFound`] for absent profiles.
    pub async fn toggle_favorite(
        &self,
        id: &UserId,
        product_id: &ProductId,
    ) -> Result<bool, ProfileError> {
        let mut profile = self.get(id).await?;
        let now_favorite = if let Some(pos) = profile.favorites.iter().position(|p| p == product_id)
        {
            profile.favorites.remove(pos);
            false
        } else {
            profile.favorites.push(product_id.clone());
            true
        };

        self.gateway
            .update(
                collections::USERS,
                id.as_str(),
                json!({
                    "favorites": profile.favorites,
                    "updated_at": Utc::now(),
                }),
            )
            .await?;
        Ok(now_favorite)
    }

    /// Bump a profile's order counters after a placed order.
    /// Best-effort; failures are logged, not surfaced.
    pub async fn record_order(&self, id: &UserId, total: Money) {
        let result = async {
            let profile = self.get(id).await?;
            self.gateway
                .update(
                    collections::USERS,
                    id.as_str(),
                    json!({
                        "order_count": profile.order_count + 1,
                        "total_spent": profile.total_spent + total,
                        "updated_at": Utc::now(),
                    }),
                )
                .await?;
            Ok::<(), ProfileError>(())
        }
        .await;
        if let Err(err) = result {
            warn!(uid = %id, error = %err, "failed to record order on profile");
        }
    }

    /// Assign a role to the account registered under `email`.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::UnknownEmail`] when no profile carries
    /// that email.
    #[instrument(skip(self))]
    pub async fn grant_role(&self, email: &str, role: Role) -> Result<UserProfile, ProfileError> {
        let email = email.trim().to_lowercase();
        let docs = self
            .gateway
            .list(collections::USERS, &Query::all().with_eq("email", email.as_str()))
            .await?;
        let doc = docs
            .first()
            .ok_or_else(|| ProfileError::UnknownEmail(email.clone()))?;
        let mut profile = UserProfile::from_document(doc)?;

        profile.role = role;
        profile.updated_at = Utc::now();
        self.gateway
            .update(
                collections::USERS,
                doc.id.as_str(),
                json!({ "role": role, "updated_at": profile.updated_at }),
            )
            .await?;
        info!(uid = %profile.id, %role, "granted role");
        Ok(profile)
    }

    /// Customer listing for the back office, newest first.
    ///
    /// # Errors
    ///
    /// Propagates store errors.
    pub async fn list(
        &self,
        page: Option<usize>,
        page_size: Option<usize>,
    ) -> Result<Page<UserProfile>, ProfileError> {
        let docs = self
            .gateway
            .list(
                collections::USERS,
                &Query::all().order_by("created_at", true),
            )
            .await?;
        let profiles: Result<Vec<_>, _> = docs.iter().map(UserProfile::from_document).collect();
        Ok(Page::slice(profiles?, page, page_size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheTtls;
    use crate::store::MemoryStore;
    use mirra_core::Email;
    use std::sync::Arc;

    fn service() -> (Arc<MemoryStore>, ProfileService) {
        let store = Arc::new(MemoryStore::new());
        let gateway = Gateway::new(store.clone(), CacheTtls::default());
        (store, ProfileService::new(gateway))
    }

    fn auth(uid: &str, email: &str) -> AuthUser {
        AuthUser {
            uid: uid.to_owned(),
            email: Email::parse(email).expect("valid email"),
            display_name: None,
        }
    }

    #[tokio::test]
    async fn resolve_creates_once() {
        let (store, service) = service();
        let first = service
            .resolve(&auth("u1", "amina@example.com"))
            .await
            .expect("resolve");
        assert_eq!(first.role, Role::User);

        let writes = store.write_count();
        let second = service
            .resolve(&auth("u1", "amina@example.com"))
            .await
            .expect("resolve");
        assert_eq!(second.id, first.id);
        assert_eq!(store.write_count(), writes, "no rewrite on later sign-ins");
    }

    #[tokio::test]
    async fn favorites_toggle_both_ways() {
        let (_, service) = service();
        let profile = service
            .resolve(&auth("u1", "amina@example.com"))
            .await
            .expect("resolve");
        let product = ProductId::new("p1");

        assert!(service.toggle_favorite(&profile.id, &product).await.expect("add"));
        assert!(!service.toggle_favorite(&profile.id, &product).await.expect("remove"));
        let profile = service.get(&profile.id).await.expect("get");
        assert!(profile.favorites.is_empty());
    }

    #[tokio::test]
    async fn grant_role_finds_by_email() {
        let (_, service) = service();
        service
            .resolve(&auth("u1", "staff@example.com"))
            .await
            .expect("resolve");

        let updated = service
            .grant_role("Staff@Example.com", Role::Manager)
            .await
            .expect("grant");
        assert_eq!(updated.role, Role::Manager);
        assert!(updated.role.is_admin());

        assert!(matches!(
            service.grant_role("ghost@example.com", Role::Admin).await,
            Err(ProfileError::UnknownEmail(_))
        ));
    }

    #[tokio::test]
    async fn record_order_bumps_counters() {
        let (_, service) = service();
        let profile = service
            .resolve(&auth("u1", "amina@example.com"))
            .await
            .expect("resolve");

        service.record_order(&profile.id, Money::from(150u32)).await;
        service.record_order(&profile.id, Money::from(50u32)).await;

        let profile = service.get(&profile.id).await.expect("get");
        assert_eq!(profile.order_count, 2);
        assert_eq!(profile.total_spent, Money::from(200u32));
    }
}
