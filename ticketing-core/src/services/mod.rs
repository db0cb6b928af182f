//! Services implementing the ticketing operations.
//!
//! - `ConfigService`: configuration lifecycle, pool operations and event
//!   sessions
//! - `VendorService`: vendor registration and authentication
//! - `TicketingService`: the outward facade. Every request type from
//!   `ticketing_sdk::objects` is handled through a `Processor` impl that
//!   always answers with an `Outcome`

pub mod config_service;
pub mod ticketing;
pub mod vendor_service;

pub use config_service::ConfigService;
pub use ticketing::TicketingService;
pub use vendor_service::VendorService;
