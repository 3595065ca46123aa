// src/config/mod.rs
//! Configuration management for the Scrypt miner
//!
//! This module handles all configuration-related functionality including:
//! - Loading and parsing configuration files
//! - Generating configuration templates
//! - Validating a configuration before mining starts
//!
//! The configuration uses TOML format and supports both solo and pool
//! mining.

/// Core configuration implementation
///
/// Contains the [`MiningConfiguration`] struct and its validation rules.
pub mod config;

// Re-export key items for easy access
pub use config::{MAX_THREADS, MIN_THREADS, MiningConfiguration, default_threads};

use crate::types::MiningMode;
use crate::utils::error::MinerError;
use std::path::PathBuf;

/// Loads miner configuration from a TOML file
///
/// # Arguments
/// * `path` - Path to the configuration file (anything convertible to PathBuf)
///
/// # Returns
/// * `Ok(MiningConfiguration)` - Successfully loaded configuration
/// * `Err(MinerError)` - If the file couldn't be read or parsed
pub fn load(path: impl Into<PathBuf>) -> Result<MiningConfiguration, MinerError> {
    MiningConfiguration::load(path)
}

/// Generates a commented configuration template
///
/// # Arguments
/// * `mode` - Mining mode the template is prepared for
///
/// # Returns
/// String containing a ready-to-use TOML configuration template
pub fn generate_template(mode: MiningMode) -> String {
    MiningConfiguration::generate_template(mode)
}
