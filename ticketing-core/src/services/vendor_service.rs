//! Vendor registration and authentication.

use crate::entities::{Vendor, VendorId};
use crate::error::TicketingError;
use crate::repositories::{RepositoryError, VendorRepository};
use std::sync::Arc;
use ticketing_sdk::credentials::{hash_password, is_hashed};
use tracing::info;

pub struct VendorService {
    repository: Arc<dyn VendorRepository>,
}

impl VendorService {
    pub fn new(repository: Arc<dyn VendorRepository>) -> Self {
        Self { repository }
    }

    /// Register a vendor, hashing the password before anything is stored.
    #[tracing::instrument(skip(self, password), err)]
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        username: &str,
        password: &str,
    ) -> Result<VendorId, TicketingError> {
        if password.is_empty() {
            return Err(TicketingError::validation("password must not be empty"));
        }
        validate_identity(name, email, username)?;
        let password_hash = hash_password(password)?;
        self.enroll(name, email, username, password_hash).await
    }

    /// Store a vendor whose password has already been hashed.
    ///
    /// Anything that is not an argon2 hash is refused, so plaintext can
    /// never end up stored as a credential.
    #[tracing::instrument(skip(self, password_hash), err)]
    pub async fn enroll(
        &self,
        name: &str,
        email: &str,
        username: &str,
        password_hash: String,
    ) -> Result<VendorId, TicketingError> {
        validate_identity(name, email, username)?;
        if !is_hashed(&password_hash) {
            return Err(TicketingError::validation(
                "password hash is not an argon2 hash",
            ));
        }

        let vendor = Vendor {
            id: VendorId::new(),
            name: name.trim().to_owned(),
            email: email.trim().to_owned(),
            username: username.trim().to_owned(),
            password_hash,
            tickets_added: 0,
        };

        let vendor_id = self.repository.save(vendor).await.map_err(|e| match e {
            RepositoryError::Duplicate { value, .. } => {
                TicketingError::Conflict(format!("username {value} is already taken"))
            }
            other => other.into(),
        })?;

        info!(%vendor_id, username, "Vendor saved");
        Ok(vendor_id)
    }

    /// Check a username and password pair.
    #[tracing::instrument(skip(self, password), err)]
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Vendor, TicketingError> {
        let vendor = self
            .repository
            .find_by_username(username.trim())
            .await?
            .ok_or_else(|| TicketingError::Authentication("username does not exist".to_string()))?;

        if !vendor.verify_password(password) {
            return Err(TicketingError::Authentication(
                "password is incorrect".to_string(),
            ));
        }

        Ok(vendor)
    }

    pub async fn find(&self, vendor_id: VendorId) -> Result<Vendor, TicketingError> {
        self.repository
            .find_by_id(vendor_id)
            .await?
            .ok_or_else(|| TicketingError::not_found(format!("vendor {vendor_id}")))
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Vendor, TicketingError> {
        self.repository
            .find_by_username(username)
            .await?
            .ok_or_else(|| TicketingError::not_found(format!("vendor {username}")))
    }

    #[tracing::instrument(skip(self), err)]
    pub async fn delete(&self, vendor_id: VendorId) -> Result<(), TicketingError> {
        if !self.repository.delete(vendor_id).await? {
            return Err(TicketingError::not_found(format!("vendor {vendor_id}")));
        }
        info!(%vendor_id, "Vendor deleted");
        Ok(())
    }

    /// Add released tickets to a vendor's running total.
    pub async fn credit_tickets(&self, vendor_id: VendorId, tickets: u64) -> Result<(), TicketingError> {
        if !self.repository.credit_tickets(vendor_id, tickets).await? {
            return Err(TicketingError::not_found(format!("vendor {vendor_id}")));
        }
        Ok(())
    }
}

fn validate_identity(name: &str, email: &str, username: &str) -> Result<(), TicketingError> {
    if name.trim().is_empty() {
        return Err(TicketingError::validation("name must not be empty"));
    }
    if username.trim().is_empty() {
        return Err(TicketingError::validation("username must not be empty"));
    }
    match email.trim().split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(TicketingError::validation(format!(
            "{email:?} is not a valid email address"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::InMemoryVendorRepository;

    fn service() -> VendorService {
        VendorService::new(Arc::new(InMemoryVendorRepository::new()))
    }

    #[tokio::test]
    async fn test_register_then_authenticate() {
        let service = service();
        let id = service
            .register("Acme Tickets", "sales@acme.test", "acme", "hunter2")
            .await
            .unwrap();

        let vendor = service.authenticate("acme", "hunter2").await.unwrap();
        assert_eq!(vendor.id, id);
        assert_ne!(vendor.password_hash, "hunter2");
    }

    #[tokio::test]
    async fn test_authentication_failures() {
        let service = service();
        service
            .register("Acme Tickets", "sales@acme.test", "acme", "hunter2")
            .await
            .unwrap();

        let err = service.authenticate("acme", "wrong").await.unwrap_err();
        assert!(matches!(err, TicketingError::Authentication(ref m) if m == "password is incorrect"));

        let err = service.authenticate("nobody", "hunter2").await.unwrap_err();
        assert!(matches!(err, TicketingError::Authentication(ref m) if m == "username does not exist"));
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts() {
        let service = service();
        service
            .enroll("A", "a@x.test", "acme", "$argon2id$stub".to_string())
            .await
            .unwrap();

        let err = service
            .enroll("B", "b@x.test", "acme", "$argon2id$stub".to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, TicketingError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_identity_validation() {
        let service = service();
        for (name, email, username) in [("", "a@x.test", "a"), ("A", "nope", "a"), ("A", "a@x.test", " ")] {
            let err = service
                .enroll(name, email, username, "$argon2id$stub".to_string())
                .await
                .unwrap_err();
            assert!(matches!(err, TicketingError::Validation(_)));
        }
    }

    #[tokio::test]
    async fn test_delete_and_credit() {
        let service = service();
        let id = service
            .enroll("A", "a@x.test", "acme", "$argon2id$stub".to_string())
            .await
            .unwrap();

        service.credit_tickets(id, 40).await.unwrap();
        assert_eq!(service.find(id).await.unwrap().tickets_added, 40);

        service.delete(id).await.unwrap();
        assert!(matches!(service.delete(id).await, Err(TicketingError::NotFound(_))));
        assert!(matches!(
            service.credit_tickets(id, 1).await,
            Err(TicketingError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_enroll_refuses_plaintext() {
        let service = service();
        let err = service
            .enroll("A", "a@x.test", "acme", "hunter2".to_string())
            .await
            .unwrap_err();

        assert!(matches!(err, TicketingError::Validation(_)));
        assert!(matches!(
            service.find_by_username("acme").await,
            Err(TicketingError::NotFound(_))
        ));
    }
}
