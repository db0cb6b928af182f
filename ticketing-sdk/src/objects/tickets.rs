use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A one-off batch of tickets a vendor pushes into an event's pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AddTicketsRequest {
    pub config_id: Uuid,
    pub count: i64,
}

/// A one-off withdrawal of tickets on behalf of a customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RetrieveTicketsRequest {
    pub config_id: Uuid,
    pub count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PoolStatusRequest {
    pub config_id: Uuid,
}

/// Consistent snapshot of a pool and its ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStatus {
    pub count: u32,
    pub capacity: u32,
    /// Tickets successfully added over the pool's lifetime.
    pub released: u64,
    /// Tickets successfully removed over the pool's lifetime.
    pub retrieved: u64,
    /// `None` when the pool has no lifetime cap.
    pub remaining_allotment: Option<u64>,
}
