//! Session-stored types.
//!
//! Only minimal identity and the cart live in the session; everything
//! else is fetched through the gateway on demand.

use serde::{Deserialize, Serialize};

use mirra_core::{Email, Money, ProductId, Role, UserId};

/// Session-stored user identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub email: Option<Email>,
    pub role: Role,
    /// Guest identities are fabricated locally and never touch the
    /// identity provider or durable profile data.
    pub guest: bool,
}

impl CurrentUser {
    /// Identity for a signed-in account.
    #[must_use]
    pub fn account(id: UserId, email: Email, role: Role) -> Self {
        Self {
            id,
            email: Some(email),
            role,
            guest: false,
        }
    }

    /// A throwaway guest identity.
    #[must_use]
    pub fn guest() -> Self {
        Self {
            id: UserId::new(format!("guest_{}", uuid::Uuid::new_v4().simple())),
            email: None,
            role: Role::User,
            guest: true,
        }
    }
}

/// One line of the session cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub name: String,
    pub price: Money,
    pub quantity: u32,
}

/// The session cart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub items: Vec<CartItem>,
}

impl Cart {
    /// Add a quantity of a product, merging with an existing line.
    pub fn add(&mut self, item: CartItem) {
        if let Some(existing) = self
            .items
            .iter_mut()
            .find(|i| i.product_id == item.product_id)
        {
            existing.quantity += item.quantity;
        } else {
            self.items.push(item);
        }
    }

    /// Set a line's quantity; zero removes the line.
    pub fn set_quantity(&mut self, product_id: &ProductId, quantity: u32) {
        if quantity == 0 {
            self.remove(product_id);
        } else if let Some(item) = self.items.iter_mut().find(|i| &i.product_id == product_id) {
            item.quantity = quantity;
        }
    }

    /// Remove a line entirely.
    pub fn remove(&mut self, product_id: &ProductId) {
        self.items.retain(|i| &i.product_id != product_id);
    }

    /// Sum of line totals.
    #[must_use]
    pub fn subtotal(&self) -> Money {
        self.items.iter().map(|i| i.price * i.quantity).sum()
    }

    /// Total number of units.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Session keys for storefront state.
pub mod session_keys {
    /// Key for the signed-in (or guest) identity.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the cart.
    pub const CART: &str = "cart";
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, price: u32, quantity: u32) -> CartItem {
        CartItem {
            product_id: ProductId::new(id),
            name: format!("product {id}"),
            price: Money::from(price),
            quantity,
        }
    }

    #[test]
    fn add_merges_lines_for_the_same_product() {
        let mut cart = Cart::default();
        cart.add(item("p1", 100, 1));
        cart.add(item("p1", 100, 2));
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.count(), 3);
        assert_eq!(cart.subtotal(), Money::from(300u32));
    }

    #[test]
    fn zero_quantity_removes_the_line() {
        let mut cart = Cart::default();
        cart.add(item("p1", 100, 2));
        cart.set_quantity(&ProductId::new("p1"), 0);
        assert!(cart.is_empty());
    }

    #[test]
    fn guest_identities_are_unique() {
        let a = CurrentUser::guest();
        let b = CurrentUser::guest();
        assert_ne!(a.id, b.id);
        assert!(a.guest);
        assert_eq!(a.role, Role::User);
    }
}
