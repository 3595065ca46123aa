//! Mining algorithm implementations
//!
//! This module contains the proof-of-work hash and its common interface.
//! Currently implements:
//! - Scrypt (Litecoin-family proof-of-work), written from first principles

/// Scrypt key derivation and the header hasher built on it
pub mod scrypt;

use crate::miner::difficulty;
use crate::utils::error::MinerError;

/// Common interface for proof-of-work hash functions
///
/// Workers only see this trait, so tests can swap in cheap hashers.
pub trait Algorithm: Send + Sync {
    /// Compute the proof-of-work hash of a serialized block header
    ///
    /// # Returns
    /// 32-byte hash in the order the hash function produces it
    /// (little-endian with respect to the target)
    fn hash(&self, header: &[u8]) -> Result<[u8; 32], MinerError>;

    /// Verify that a header's hash meets a 256-bit big-endian target
    fn verify(&self, header: &[u8], target: &[u8; 32]) -> Result<bool, MinerError> {
        let hash = self.hash(header)?;
        Ok(difficulty::meets(&hash, target))
    }

    /// Short algorithm name for logs
    fn name(&self) -> &'static str;
}

pub use scrypt::{ScryptAlgo, ScryptParams};
