//! Event configuration request and response types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request payload for creating a new event configuration.
///
/// Numeric fields are signed on purpose: the transport may hand us anything,
/// and range checks are the service's job so it can answer with a proper
/// validation message instead of a decode error.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CreateConfigurationRequest {
    pub event_name: String,
    pub location: String,
    /// Tickets that may ever be released into the pool for this event.
    pub total_tickets: i64,
    /// Tickets a vendor adds per production cycle.
    pub release_rate: i64,
    /// Tickets a customer withdraws per consumption cycle.
    pub retrieval_rate: i64,
    /// Most tickets the pool may hold at once.
    pub max_capacity: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GetConfigurationRequest {
    pub config_id: Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RemoveConfigurationRequest {
    pub config_id: Uuid,
}

/// Read model of a configuration, including the live pool count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigurationView {
    pub config_id: Uuid,
    pub event_name: String,
    pub location: String,
    pub total_tickets: u32,
    pub release_rate: u32,
    pub retrieval_rate: u32,
    pub max_capacity: u32,
    pub current_ticket_count: u32,
    /// Unix timestamp of when the configuration was created.
    pub created_at: i64,
}
