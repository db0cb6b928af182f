pub mod configuration;
pub mod ticket_pool;
pub mod vendor;

pub use configuration::{ConfigId, Configuration};
pub use ticket_pool::{PoolError, PoolSnapshot, ProducerGuard, TicketPool};
pub use vendor::{Vendor, VendorId};
