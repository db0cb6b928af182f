//! Event session request and report types.
//!
//! An event session is the set of vendor and customer actors running
//! against one configuration's pool.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request to start the actors of an event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StartEventRequest {
    pub config_id: Uuid,
    /// One vendor actor is spawned per listed vendor.
    pub vendor_ids: Vec<Uuid>,
    /// Number of customer actors to spawn.
    pub customers: u32,
}

/// Cancel a running event and collect its reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StopEventRequest {
    pub config_id: Uuid,
}

/// Wait for a running event to finish on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AwaitEventRequest {
    pub config_id: Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorKind {
    Vendor,
    Customer,
}

impl std::fmt::Display for ActorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActorKind::Vendor => write!(f, "vendor"),
            ActorKind::Customer => write!(f, "customer"),
        }
    }
}

/// Why an actor stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// Every ticket of the event has been released into the pool.
    AllotmentExhausted,
    /// No producer is left and the pool is empty.
    ProductionFinished,
    /// The event was stopped or its configuration removed.
    Cancelled,
}

impl std::fmt::Display for Termination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Termination::AllotmentExhausted => write!(f, "allotment_exhausted"),
            Termination::ProductionFinished => write!(f, "production_finished"),
            Termination::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorSummary {
    pub label: String,
    pub kind: ActorKind,
    /// Set for vendor actors only.
    pub vendor_id: Option<Uuid>,
    pub attempts: u64,
    pub rejections: u64,
    /// Tickets this actor moved into (vendor) or out of (customer) the pool.
    pub tickets: u64,
    pub termination: Termination,
}

/// Final accounting of an event session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSummary {
    pub config_id: Uuid,
    pub tickets_released: u64,
    pub tickets_retrieved: u64,
    pub final_count: u32,
    pub actors: Vec<ActorSummary>,
}
