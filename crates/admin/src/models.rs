//! Session-stored admin identity.

use serde::{Deserialize, Serialize};

use mirra_core::{Email, Role, UserId};

/// The signed-in staff member, as stored in the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentAdmin {
    pub id: UserId,
    pub email: Email,
    pub role: Role,
}

/// Session keys for admin state.
pub mod session_keys {
    /// Key for the signed-in staff identity.
    pub const CURRENT_ADMIN: &str = "current_admin";
}
