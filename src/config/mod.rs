//! Configuration management for genfetch
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use genfetch::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! println!("Fetching from: {}", config.api.base_url);
//! ```
//!
//! # Environment Variables
//!
//! Configuration can be overridden using environment variables with the pattern:
//! `GENFETCH__<section>__<key>`
//!
//! Examples:
//! - `GENFETCH__API__BASE_URL=https://generation.example`
//! - `GENFETCH__RETRY__INITIAL_BACKOFF=500ms`
//! - `GENFETCH__OUTPUT__FORMAT=csv`
//!
//! The API key is only ever read from `API_KEY`.
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/genfetch.toml`.
//! This can be overridden using the `GENFETCH_CONFIG` environment variable.

mod models;
mod sources;
mod validation;

pub use crate::humanize::HumanDuration;
pub use models::{ApiConfig, ClientConfig, Config, LoggingConfig, OutputConfig, RetryConfig};
pub use validation::ValidationError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables (`GENFETCH__*`, `API_KEY`)
    /// 2. TOML file (default: `config/genfetch.toml`)
    /// 3. Default values
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file is malformed or validation fails.
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources::load()?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path
    ///
    /// Useful for testing with custom configuration files.
    pub fn load_from_path(path: std::path::PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path)?;
        validation::validate(&config)?;
        Ok(config)
    }
}
