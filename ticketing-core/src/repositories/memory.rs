use super::{ConfigurationRepository, RepositoryError, VendorRepository};
use crate::entities::{ConfigId, Configuration, Vendor, VendorId};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Configurations held in process memory.
#[derive(Debug, Default)]
pub struct InMemoryConfigurationRepository {
    records: RwLock<HashMap<ConfigId, Arc<Configuration>>>,
}

impl InMemoryConfigurationRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConfigurationRepository for InMemoryConfigurationRepository {
    async fn save(&self, configuration: Arc<Configuration>) -> Result<ConfigId, RepositoryError> {
        let id = configuration.id();
        let mut records = self.records.write().await;
        if records.contains_key(&id) {
            return Err(RepositoryError::Duplicate {
                field: "config_id",
                value: id.to_string(),
            });
        }
        records.insert(id, configuration);
        Ok(id)
    }

    async fn find_by_id(
        &self,
        id: ConfigId,
    ) -> Result<Option<Arc<Configuration>>, RepositoryError> {
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn delete(&self, id: ConfigId) -> Result<bool, RepositoryError> {
        Ok(self.records.write().await.remove(&id).is_some())
    }

    async fn list(&self) -> Result<Vec<Arc<Configuration>>, RepositoryError> {
        let mut all: Vec<_> = self.records.read().await.values().cloned().collect();
        all.sort_by_key(|configuration| configuration.id());
        Ok(all)
    }
}

/// Vendors held in process memory, with a username index.
#[derive(Debug, Default)]
pub struct InMemoryVendorRepository {
    inner: RwLock<VendorTable>,
}

#[derive(Debug, Default)]
struct VendorTable {
    by_id: HashMap<VendorId, Vendor>,
    by_username: HashMap<String, VendorId>,
}

impl InMemoryVendorRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VendorRepository for InMemoryVendorRepository {
    async fn save(&self, vendor: Vendor) -> Result<VendorId, RepositoryError> {
        let mut table = self.inner.write().await;
        if table.by_username.contains_key(&vendor.username) {
            return Err(RepositoryError::Duplicate {
                field: "username",
                value: vendor.username,
            });
        }
        let id = vendor.id;
        table.by_username.insert(vendor.username.clone(), id);
        table.by_id.insert(id, vendor);
        Ok(id)
    }

    async fn find_by_id(&self, id: VendorId) -> Result<Option<Vendor>, RepositoryError> {
        Ok(self.inner.read().await.by_id.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Vendor>, RepositoryError> {
        let table = self.inner.read().await;
        Ok(table
            .by_username
            .get(username)
            .and_then(|id| table.by_id.get(id))
            .cloned())
    }

    async fn delete(&self, id: VendorId) -> Result<bool, RepositoryError> {
        let mut table = self.inner.write().await;
        let Some(vendor) = table.by_id.remove(&id) else {
            return Ok(false);
        };
        table.by_username.remove(&vendor.username);
        Ok(true)
    }

    async fn credit_tickets(&self, id: VendorId, tickets: u64) -> Result<bool, RepositoryError> {
        let mut table = self.inner.write().await;
        let Some(vendor) = table.by_id.get_mut(&id) else {
            return Ok(false);
        };
        vendor.tickets_added = vendor.tickets_added.saturating_add(tickets);
        Ok(true)
    }
}
