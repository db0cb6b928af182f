//! Registered vendors.

use serde::{Deserialize, Serialize};
use ticketing_sdk::credentials::verify_password;
use uuid::Uuid;

/// Identifier of a registered vendor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VendorId(pub Uuid);

impl VendorId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for VendorId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for VendorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl From<Uuid> for VendorId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<VendorId> for Uuid {
    fn from(value: VendorId) -> Self {
        value.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vendor {
    pub id: VendorId,
    pub name: String,
    pub email: String,
    pub username: String,
    /// argon2 PHC string, never plaintext.
    pub password_hash: String,
    /// Tickets this vendor has released across all events.
    pub tickets_added: u64,
}

impl Vendor {
    pub fn verify_password(&self, plaintext: &str) -> bool {
        verify_password(plaintext, &self.password_hash)
    }
}
