//! Persistence seams for configurations and vendors.
//!
//! The services only ever talk to these traits. The in-memory stores in
//! [`memory`] back the server and the tests; a database-backed store only
//! has to implement the same traits.

pub mod memory;

use crate::entities::{ConfigId, Configuration, Vendor, VendorId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

pub use memory::{InMemoryConfigurationRepository, InMemoryVendorRepository};

#[derive(Debug, Error)]
pub enum RepositoryError {
    /// A uniqueness constraint was violated.
    #[error("duplicate {field}: {value}")]
    Duplicate { field: &'static str, value: String },

    /// The backing store could not serve the request.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait ConfigurationRepository: Send + Sync {
    async fn save(&self, configuration: Arc<Configuration>) -> Result<ConfigId, RepositoryError>;

    async fn find_by_id(&self, id: ConfigId)
    -> Result<Option<Arc<Configuration>>, RepositoryError>;

    /// Returns `false` when there was nothing to delete.
    async fn delete(&self, id: ConfigId) -> Result<bool, RepositoryError>;

    async fn list(&self) -> Result<Vec<Arc<Configuration>>, RepositoryError>;
}

#[async_trait]
pub trait VendorRepository: Send + Sync {
    /// Store a new vendor. Usernames are unique.
    async fn save(&self, vendor: Vendor) -> Result<VendorId, RepositoryError>;

    async fn find_by_id(&self, id: VendorId) -> Result<Option<Vendor>, RepositoryError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<Vendor>, RepositoryError>;

    /// Returns `false` when there was nothing to delete.
    async fn delete(&self, id: VendorId) -> Result<bool, RepositoryError>;

    /// Add `tickets` to the vendor's running total. Returns `false` for an
    /// unknown vendor.
    async fn credit_tickets(&self, id: VendorId, tickets: u64) -> Result<bool, RepositoryError>;
}
