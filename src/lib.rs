//! Scrypt Miner - CPU proof-of-work mining for Scrypt coins in Rust
//!
//! This crate provides a complete implementation of a Scrypt miner with support for:
//! - A from-scratch Scrypt key derivation used as the proof-of-work hash
//! - Pool mining over the line-delimited stratum protocol, with a simulated
//!   fallback pool when the network is unreachable
//! - Solo mining against a static job with block-target checking
//! - Per-thread nonce partitioning and hashrate/host statistics

#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Miner core implementation including algorithms, jobs and workers
pub mod miner;

/// Work sources: pool protocol client, simulated pool and solo jobs
pub mod network;

/// Statistics collection and reporting functionality
pub mod stats;

/// Utility functions and error handling
pub mod utils;

/// Command-line interface definitions
pub mod cli;

/// Configuration management
pub mod config;

/// Shared type definitions
pub mod types;

/// Mining engine lifecycle and share routing
pub mod engine;

// Core exports
pub use cli::Commands;
pub use config::MiningConfiguration;
pub use engine::{EngineEvent, EngineSettings, MiningEngine, MiningStatus};
pub use miner::{Algorithm, DifficultyContext, Job, MiningWorker, ScryptAlgo, Share, WorkerPool};
pub use network::{PoolClient, PoolState, SimulatedPool, test_connection};
pub use stats::{EngineStats, HardwareStats, StatsReporter};
pub use types::{Coin, MiningMode, OperationResult};
pub use utils::{MinerError, init_logging};
