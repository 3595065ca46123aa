// src/network/mod.rs
//! Work sources and pool communication
//!
//! This module provides everything that feeds jobs to the miner and takes
//! shares from it:
//! - `PoolClient`: the stratum pool protocol over line-delimited TCP
//! - `SimulatedPool`: local fallback used when the pool is unreachable
//! - `SoloWork`: a static job checked against the network block target

/// Wire frames of the pool protocol
pub mod messages;

/// Line-delimited TCP transport
pub mod connection;

/// Mining pool client implementation
///
/// Handles the subscribe/authorize/notify/submit exchange, reconnection and
/// the fallback to the simulated pool.
pub mod pool;

/// Simulated pool producing synthetic work
pub mod simulated;

/// Solo mining job and block check
pub mod solo;

/// TCP connectivity probe
pub mod probe;

// Re-export main components for cleaner imports
pub use connection::PoolEndpoint;
pub use pool::{PoolClient, PoolCredentials, PoolSettings, PoolState, WorkEvent};
pub use probe::test_connection;
pub use simulated::{SimulatedPool, SimulationSettings};
pub use solo::SoloWork;
