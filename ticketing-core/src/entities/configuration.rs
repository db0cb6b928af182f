//! Event configuration and the pool it owns.

use crate::entities::ticket_pool::TicketPool;
use crate::error::TicketingError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use ticketing_sdk::objects::{ConfigurationView, CreateConfigurationRequest};
use uuid::Uuid;

/// Identifier of an event configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigId(pub Uuid);

impl ConfigId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for ConfigId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConfigId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl From<Uuid> for ConfigId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<ConfigId> for Uuid {
    fn from(value: ConfigId) -> Self {
        value.0
    }
}

/// Policy for one event, immutable once created.
///
/// The pool is built together with the configuration and lives exactly as
/// long as it does. The live ticket count is never stored here: it is read
/// from the pool, so the two cannot disagree.
#[derive(Debug)]
pub struct Configuration {
    id: ConfigId,
    event_name: String,
    location: String,
    total_tickets: u32,
    release_rate: u32,
    retrieval_rate: u32,
    max_capacity: u32,
    created_at: time::OffsetDateTime,
    pool: Arc<TicketPool>,
}

impl Configuration {
    /// Validate the request and build the configuration with an empty pool.
    ///
    /// Nothing is allocated for the pool unless every check passes.
    pub fn create(request: &CreateConfigurationRequest) -> Result<Self, TicketingError> {
        let event_name = request.event_name.trim();
        if event_name.is_empty() {
            return Err(TicketingError::validation("event name must not be empty"));
        }
        let location = request.location.trim();
        if location.is_empty() {
            return Err(TicketingError::validation("location must not be empty"));
        }

        let max_capacity = positive("max capacity", request.max_capacity)?;
        let total_tickets = non_negative("total tickets", request.total_tickets)?;
        let release_rate = positive("release rate", request.release_rate)?;
        let retrieval_rate = positive("retrieval rate", request.retrieval_rate)?;

        // A batch larger than the pool can never be admitted or withdrawn.
        if release_rate > max_capacity {
            return Err(TicketingError::validation(format!(
                "release rate {release_rate} exceeds max capacity {max_capacity}"
            )));
        }
        if retrieval_rate > max_capacity {
            return Err(TicketingError::validation(format!(
                "retrieval rate {retrieval_rate} exceeds max capacity {max_capacity}"
            )));
        }

        Ok(Self {
            id: ConfigId::new(),
            event_name: event_name.to_owned(),
            location: location.to_owned(),
            total_tickets,
            release_rate,
            retrieval_rate,
            max_capacity,
            created_at: time::OffsetDateTime::now_utc(),
            pool: Arc::new(TicketPool::with_allotment(max_capacity, total_tickets)),
        })
    }

    pub fn id(&self) -> ConfigId {
        self.id
    }

    pub fn event_name(&self) -> &str {
        &self.event_name
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn total_tickets(&self) -> u32 {
        self.total_tickets
    }

    pub fn release_rate(&self) -> u32 {
        self.release_rate
    }

    pub fn retrieval_rate(&self) -> u32 {
        self.retrieval_rate
    }

    pub fn max_capacity(&self) -> u32 {
        self.max_capacity
    }

    pub fn created_at(&self) -> time::OffsetDateTime {
        self.created_at
    }

    pub fn pool(&self) -> &Arc<TicketPool> {
        &self.pool
    }

    pub fn current_ticket_count(&self) -> u32 {
        self.pool.current_count()
    }

    pub fn to_view(&self) -> ConfigurationView {
        ConfigurationView {
            config_id: self.id.into(),
            event_name: self.event_name.clone(),
            location: self.location.clone(),
            total_tickets: self.total_tickets,
            release_rate: self.release_rate,
            retrieval_rate: self.retrieval_rate,
            max_capacity: self.max_capacity,
            current_ticket_count: self.current_ticket_count(),
            created_at: self.created_at.unix_timestamp(),
        }
    }
}

fn non_negative(field: &str, value: i64) -> Result<u32, TicketingError> {
    u32::try_from(value).map_err(|_| {
        TicketingError::validation(format!(
            "{field} must be between 0 and {}, got {value}",
            u32::MAX
        ))
    })
}

fn positive(field: &str, value: i64) -> Result<u32, TicketingError> {
    match non_negative(field, value)? {
        0 => Err(TicketingError::validation(format!(
            "{field} must be greater than 0"
        ))),
        value => Ok(value),
    }
}

/// Convert a caller-supplied ticket count into a pool request size.
pub fn ticket_count(value: i64) -> Result<u32, TicketingError> {
    non_negative("ticket count", value)
}
