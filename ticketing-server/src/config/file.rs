//! TOML file configuration structures.
//!
//! These structs directly map to the `ticketing.toml` file format.

use serde::{Deserialize, Serialize};
use ticketing_sdk::credentials::is_hashed;
use ticketing_sdk::objects::CreateConfigurationRequest;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub pacing: PacingConfig,
    #[serde(default)]
    pub vendors: Vec<VendorConfig>,
    #[serde(default)]
    pub events: Vec<EventConfig>,
}

/// How often actors act, in milliseconds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PacingConfig {
    #[serde(default = "default_interval_ms")]
    pub release_interval_ms: u64,
    #[serde(default = "default_interval_ms")]
    pub retrieval_interval_ms: u64,
    #[serde(default = "default_jitter_ms")]
    pub jitter_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            release_interval_ms: default_interval_ms(),
            retrieval_interval_ms: default_interval_ms(),
            jitter_ms: default_jitter_ms(),
        }
    }
}

fn default_interval_ms() -> u64 {
    1000
}

fn default_jitter_ms() -> u64 {
    100
}

/// A vendor enrolled on startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorConfig {
    pub name: String,
    pub email: String,
    pub username: String,
    /// The vendor password. If this is plaintext (doesn't start with
    /// `$argon2`), it will be hashed and the config file will be rewritten.
    pub password: String,
}

/// One event to create and run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventConfig {
    pub event_name: String,
    pub location: String,
    pub total_tickets: i64,
    pub release_rate: i64,
    pub retrieval_rate: i64,
    pub max_capacity: i64,
    /// Usernames of the vendors selling this event, one actor each.
    #[serde(default)]
    pub vendors: Vec<String>,
    #[serde(default)]
    pub customers: u32,
}

impl FileConfig {
    /// Check if every vendor password is already hashed (argon2 format).
    pub fn are_passwords_hashed(&self) -> bool {
        self.vendors.iter().all(|vendor| is_hashed(&vendor.password))
    }
}

impl EventConfig {
    pub fn to_request(&self) -> CreateConfigurationRequest {
        CreateConfigurationRequest {
            event_name: self.event_name.clone(),
            location: self.location.clone(),
            total_tickets: self.total_tickets,
            release_rate: self.release_rate,
            retrieval_rate: self.retrieval_rate,
            max_capacity: self.max_capacity,
        }
    }
}
