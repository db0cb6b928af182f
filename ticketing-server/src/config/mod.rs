//! Configuration module for ticketing-server.
//!
//! Handles loading the event plan from a TOML file, validating it, and
//! hashing plaintext vendor passwords.

pub mod file;

use crate::config::file::{EventConfig, FileConfig, PacingConfig, VendorConfig};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use ticketing_core::actors::{ActorPacing, Pacing};
use ticketing_sdk::credentials::{CredentialError, hash_password, is_hashed};

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error(transparent)]
    HashError(#[from] CredentialError),
}

/// Loaded configuration with every vendor password hashed.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub pacing: ActorPacing,
    pub vendors: Vec<VendorConfig>,
    pub events: Vec<EventConfig>,
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: PathBuf,
}

impl ConfigLoader {
    pub fn new(config_path: impl AsRef<Path>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
        }
    }

    /// Load and process the configuration.
    ///
    /// This will:
    /// 1. Read the TOML file
    /// 2. Validate the configuration
    /// 3. Hash plaintext vendor passwords (and rewrite the file)
    /// 4. Build the loaded configuration
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let config_content = std::fs::read_to_string(&self.config_path)?;
        let mut file_config: FileConfig = toml::from_str(&config_content)?;

        validate(&file_config)?;

        if !file_config.are_passwords_hashed() {
            let mut hashed = 0;
            for vendor in &mut file_config.vendors {
                if !is_hashed(&vendor.password) {
                    vendor.password = hash_password(&vendor.password)?;
                    hashed += 1;
                }
            }
            self.rewrite_config(&file_config)?;
            tracing::info!(hashed, "Vendor passwords hashed and config file updated");
        }

        Ok(LoadedConfig {
            pacing: actor_pacing(file_config.pacing),
            vendors: file_config.vendors,
            events: file_config.events,
        })
    }

    fn rewrite_config(&self, config: &FileConfig) -> Result<(), ConfigError> {
        let toml_string = toml::to_string_pretty(config)?;

        // Write atomically: write to temp file, then rename
        let temp_path = self.config_path.with_extension("toml.tmp");
        std::fs::write(&temp_path, toml_string)?;
        std::fs::rename(&temp_path, &self.config_path)?;

        Ok(())
    }
}

fn validate(config: &FileConfig) -> Result<(), ConfigError> {
    if config.pacing.release_interval_ms == 0 || config.pacing.retrieval_interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "pacing intervals must be greater than zero".to_string(),
        ));
    }

    let mut usernames = HashSet::new();
    for vendor in &config.vendors {
        if vendor.password.is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "vendor {} has an empty password",
                vendor.username
            )));
        }
        if !usernames.insert(vendor.username.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "vendor username {} is listed twice",
                vendor.username
            )));
        }
    }

    for event in &config.events {
        if let Some(unknown) = event
            .vendors
            .iter()
            .find(|username| !usernames.contains(username.as_str()))
        {
            return Err(ConfigError::ValidationError(format!(
                "event {} references unknown vendor {unknown}",
                event.event_name
            )));
        }
    }
    Ok(())
}

fn actor_pacing(config: PacingConfig) -> ActorPacing {
    let jitter = Duration::from_millis(config.jitter_ms);
    ActorPacing {
        release: Pacing::new(Duration::from_millis(config.release_interval_ms), jitter),
        retrieval: Pacing::new(Duration::from_millis(config.retrieval_interval_ms), jitter),
    }
}
