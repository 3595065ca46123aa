// src/miner/mod.rs
//! Core mining functionality
//!
//! This module contains all components related to the mining process:
//! - The scrypt proof-of-work hash and its trait seam
//! - Difficulty targets and the share check
//! - Job representation and header assembly
//! - Worker threads and the pool that owns them

/// Mining algorithm implementations
///
/// Contains the scrypt hash (N=1024, r=1, p=1 for Litecoin-family coins)
/// behind the [`Algorithm`] trait.
pub mod algorithm;

/// Difficulty to target conversion
pub mod difficulty;

/// Mining jobs and the 80-byte header layout
pub mod job;

/// Worker pool and job distribution
///
/// Publishes the current job and difficulty to workers and partitions the
/// nonce space between them.
pub mod scheduler;

/// Worker thread implementation
///
/// Contains the worker loop that performs the actual hash computations.
pub mod worker;

// Re-export main components for cleaner imports
pub use self::algorithm::{Algorithm, ScryptAlgo, ScryptParams};
pub use self::difficulty::DifficultyContext;
pub use self::job::Job;
pub use self::scheduler::{NONCE_RANGE_SIZE, WorkBoard, WorkerPool};
pub use self::worker::{MiningWorker, Share, WorkerEvent};
