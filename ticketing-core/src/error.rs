//! Error taxonomy shared by the ticketing services.

use crate::entities::PoolError;
use crate::repositories::RepositoryError;
use thiserror::Error;
use ticketing_sdk::credentials::CredentialError;

/// Everything a ticketing operation can fail with.
///
/// Every variant is raised before any state is mutated, so a caller that
/// sees an error can assume nothing changed.
#[derive(Debug, Error)]
pub enum TicketingError {
    /// Malformed or out-of-range parameters.
    #[error("validation error: {0}")]
    Validation(String),

    /// An add would breach the pool's capacity.
    #[error("{0}")]
    CapacityExceeded(PoolError),

    /// A remove would drive the pool below zero.
    #[error("{0}")]
    InsufficientStock(PoolError),

    /// An add would release more tickets than the event allows.
    #[error("{0}")]
    AllotmentExhausted(PoolError),

    /// The referenced configuration, vendor or event does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// Credential mismatch or unknown identity.
    #[error("{0}")]
    Authentication(String),

    /// The request collides with existing state.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Credential(#[from] CredentialError),
}

impl From<PoolError> for TicketingError {
    fn from(error: PoolError) -> Self {
        match error {
            PoolError::CapacityExceeded { .. } => TicketingError::CapacityExceeded(error),
            PoolError::InsufficientStock { .. } => TicketingError::InsufficientStock(error),
            PoolError::AllotmentExhausted { .. } => TicketingError::AllotmentExhausted(error),
        }
    }
}

impl TicketingError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        TicketingError::Validation(message.into())
    }

    pub(crate) fn not_found(what: impl std::fmt::Display) -> Self {
        TicketingError::NotFound(what.to_string())
    }
}
