//! Vendor identity request and response types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VendorRegisterRequest {
    pub name: String,
    pub email: String,
    pub username: String,
    /// Plaintext. Hashed before it is stored and never persisted as-is.
    pub password: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VendorRegistered {
    pub vendor_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VendorLoginRequest {
    pub username: String,
    pub password: String,
}

/// Returned after a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VendorLoggedIn {
    pub vendor_id: Uuid,
    pub username: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VendorDeleteRequest {
    pub vendor_id: Uuid,
}
