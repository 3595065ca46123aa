// src/types.rs
use crate::miner::algorithm::scrypt::ScryptParams;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported Scrypt proof-of-work coins
///
/// Every preset shares the classic Litecoin Scrypt parameters
/// (N=1024, r=1, p=1); they differ in network difficulty and the
/// default pool endpoint.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Coin {
    /// Litecoin (LTC)
    #[clap(name = "litecoin")]
    Litecoin,

    /// Dogecoin (DOGE)
    #[clap(name = "dogecoin")]
    Dogecoin,

    /// Feathercoin (FTC)
    #[clap(name = "feathercoin")]
    Feathercoin,
}

/// Static description of a coin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoinPreset {
    /// Display name
    pub name: &'static str,
    /// Ticker symbol
    pub symbol: &'static str,
    /// Scrypt cost parameters for the proof-of-work hash
    pub scrypt: ScryptParams,
    /// Network-wide difficulty used as the solo block-validity threshold
    pub network_difficulty: f64,
    /// Compact difficulty bits placed in solo block headers
    pub nbits: u32,
    /// Pool host used when no custom pool is configured
    pub default_pool_host: &'static str,
    /// Pool port used when no custom pool is configured
    pub default_pool_port: u16,
}

impl Coin {
    /// Returns the static preset for this coin
    pub fn preset(&self) -> CoinPreset {
        match self {
            Coin::Litecoin => CoinPreset {
                name: "Litecoin",
                symbol: "LTC",
                scrypt: ScryptParams::LITECOIN,
                network_difficulty: 12_345_678.0,
                nbits: 0x1a01_cd2d,
                default_pool_host: "litecoinpool.org",
                default_pool_port: 3333,
            },
            Coin::Dogecoin => CoinPreset {
                name: "Dogecoin",
                symbol: "DOGE",
                scrypt: ScryptParams::LITECOIN,
                network_difficulty: 9_876_543.0,
                nbits: 0x1a02_3a6e,
                default_pool_host: "prohashing.com",
                default_pool_port: 3332,
            },
            Coin::Feathercoin => CoinPreset {
                name: "Feathercoin",
                symbol: "FTC",
                scrypt: ScryptParams::LITECOIN,
                network_difficulty: 5_432_109.0,
                nbits: 0x1b01_0f4c,
                default_pool_host: "pool.feathercoin.com",
                default_pool_port: 3333,
            },
        }
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Coin::Litecoin => write!(f, "litecoin"),
            Coin::Dogecoin => write!(f, "dogecoin"),
            Coin::Feathercoin => write!(f, "feathercoin"),
        }
    }
}

impl FromStr for Coin {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "litecoin" | "ltc" => Ok(Coin::Litecoin),
            "dogecoin" | "doge" => Ok(Coin::Dogecoin),
            "feathercoin" | "ftc" => Ok(Coin::Feathercoin),
            _ => Err(format!("Unknown coin: {}", s)),
        }
    }
}

/// Where work comes from and where shares go
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MiningMode {
    /// Mine a static job and check shares against the network block target
    #[clap(name = "solo")]
    Solo,

    /// Take jobs from a stratum pool and submit shares to it
    #[clap(name = "pool")]
    Pool,
}

impl fmt::Display for MiningMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MiningMode::Solo => write!(f, "solo"),
            MiningMode::Pool => write!(f, "pool"),
        }
    }
}

/// Outcome of a public engine operation
///
/// Failures that are part of normal operation (already running, invalid
/// configuration, unreachable host) are reported here rather than as errors.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationResult {
    /// Whether the operation did what was asked
    pub success: bool,
    /// Human-readable explanation
    pub message: String,
}

impl OperationResult {
    /// A successful outcome
    pub fn ok(message: impl Into<String>) -> Self {
        OperationResult {
            success: true,
            message: message.into(),
        }
    }

    /// A failed outcome
    pub fn failed(message: impl Into<String>) -> Self {
        OperationResult {
            success: false,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coin_from_str_accepts_symbols() {
        assert_eq!("LTC".parse::<Coin>().unwrap(), Coin::Litecoin);
        assert_eq!("dogecoin".parse::<Coin>().unwrap(), Coin::Dogecoin);
        assert!("bitcoin".parse::<Coin>().is_err());
    }

    #[test]
    fn test_presets_use_litecoin_scrypt_params() {
        for coin in [Coin::Litecoin, Coin::Dogecoin, Coin::Feathercoin] {
            let preset = coin.preset();
            assert_eq!(preset.scrypt, ScryptParams::LITECOIN);
            assert!(preset.network_difficulty > 1.0);
        }
    }
}
