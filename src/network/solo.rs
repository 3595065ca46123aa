//! Solo work source
//!
//! Without a pool there is no job feed: the engine mines one static job whose
//! coinbase pays the configured wallet, and checks every share against the
//! coin's network-wide block target.

use crate::miner::{DifficultyContext, Job, Share};
use crate::types::Coin;
use std::time::{SystemTime, UNIX_EPOCH};

/// Coinbase prefix: tx version 1, one input spending the null outpoint
const COINBASE_PREFIX: [u8; 42] = {
    let mut prefix = [0u8; 42];
    prefix[0] = 0x01;
    prefix[5] = 0x01;
    // prevout index 0xffffffff
    prefix[37] = 0xff;
    prefix[38] = 0xff;
    prefix[39] = 0xff;
    prefix[40] = 0xff;
    prefix
};

/// Coinbase suffix: input sequence, no outputs, zero lock time
const COINBASE_SUFFIX: [u8; 9] = [0xff, 0xff, 0xff, 0xff, 0x00, 0x00, 0x00, 0x00, 0x00];

/// Static job and block check for solo mining
#[derive(Debug, Clone)]
pub struct SoloWork {
    job: Job,
    block: DifficultyContext,
}

impl SoloWork {
    /// Builds the solo job for `coin` paying `wallet_address`
    pub fn new(coin: Coin, wallet_address: &str) -> Self {
        let preset = coin.preset();
        let ntime = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as u32)
            .unwrap_or_default();

        let job = Job {
            job_id: format!("solo-{}-{:08x}", preset.symbol.to_lowercase(), ntime),
            prev_hash: [0u8; 32],
            coinbase1: COINBASE_PREFIX.to_vec(),
            coinbase2: COINBASE_SUFFIX.to_vec(),
            coinbase_extra: wallet_address.trim().as_bytes().to_vec(),
            merkle_branch: Vec::new(),
            version: 0x2000_0000,
            nbits: preset.nbits,
            ntime,
            clean_jobs: true,
        };
        log::info!(
            "Solo job {} for {} at network difficulty {}",
            job.job_id,
            preset.name,
            preset.network_difficulty
        );

        SoloWork {
            job,
            block: DifficultyContext::new(preset.network_difficulty),
        }
    }

    /// The static job
    pub fn job(&self) -> &Job {
        &self.job
    }

    /// Whether a share also solves a block
    pub fn is_block(&self, share: &Share) -> bool {
        self.block.accepts(&share.hash)
    }
}
