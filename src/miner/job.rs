//! Mining jobs and block header assembly
//!
//! A [`Job`] is an immutable snapshot of one unit of work from a work source.
//! Workers never patch a job; a new one replaces it wholesale.

use sha2::{Digest, Sha256};

/// Serialized block header length in bytes
pub const HEADER_LEN: usize = 80;

/// Byte offset of the nonce inside the header
pub const NONCE_OFFSET: usize = 76;

/// Double SHA-256: `SHA256(SHA256(data))`
#[inline]
pub fn double_sha256(data: &[u8]) -> [u8; 32] {
    let first = Sha256::digest(data);
    let second = Sha256::digest(first);
    second.into()
}

/// One unit of proof-of-work search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    /// Opaque job identifier assigned by the work source
    pub job_id: String,
    /// Previous block hash, as delivered by the work source
    pub prev_hash: [u8; 32],
    /// Coinbase bytes before the extra-nonce section
    pub coinbase1: Vec<u8>,
    /// Coinbase bytes after the extra-nonce section
    pub coinbase2: Vec<u8>,
    /// Bytes spliced between the coinbase fragments (pool extranonce or
    /// the solo wallet tag)
    pub coinbase_extra: Vec<u8>,
    /// Ordered Merkle branch, each entry a 32-byte hash
    pub merkle_branch: Vec<[u8; 32]>,
    /// Block version
    pub version: u32,
    /// Compact difficulty bits
    pub nbits: u32,
    /// Header time field
    pub ntime: u32,
    /// Discard in-flight work from the prior job
    pub clean_jobs: bool,
}

impl Job {
    /// Assembles the full coinbase transaction bytes
    pub fn coinbase(&self) -> Vec<u8> {
        let mut coinbase = Vec::with_capacity(
            self.coinbase1.len() + self.coinbase_extra.len() + self.coinbase2.len(),
        );
        coinbase.extend_from_slice(&self.coinbase1);
        coinbase.extend_from_slice(&self.coinbase_extra);
        coinbase.extend_from_slice(&self.coinbase2);
        coinbase
    }

    /// Computes the Merkle root by folding the coinbase hash with the branch
    pub fn merkle_root(&self) -> [u8; 32] {
        let mut root = double_sha256(&self.coinbase());
        let mut pair = [0u8; 64];
        for branch in &self.merkle_branch {
            pair[..32].copy_from_slice(&root);
            pair[32..].copy_from_slice(branch);
            root = double_sha256(&pair);
        }
        root
    }

    /// Builds the 80-byte header with a zero nonce
    ///
    /// Layout: version (LE) | previous hash (reversed) | Merkle root |
    /// time (LE) | bits (LE) | nonce (LE).
    pub fn header_template(&self) -> [u8; HEADER_LEN] {
        let mut header = [0u8; HEADER_LEN];
        header[0..4].copy_from_slice(&self.version.to_le_bytes());

        let mut prev = self.prev_hash;
        prev.reverse();
        header[4..36].copy_from_slice(&prev);

        header[36..68].copy_from_slice(&self.merkle_root());
        header[68..72].copy_from_slice(&self.ntime.to_le_bytes());
        header[72..76].copy_from_slice(&self.nbits.to_le_bytes());
        header
    }

    /// Builds the header for a specific nonce
    pub fn header(&self, nonce: u32) -> [u8; HEADER_LEN] {
        let mut header = self.header_template();
        set_nonce(&mut header, nonce);
        header
    }
}

/// Writes `nonce` into a header template
#[inline]
pub fn set_nonce(header: &mut [u8; HEADER_LEN], nonce: u32) {
    header[NONCE_OFFSET..].copy_from_slice(&nonce.to_le_bytes());
}
