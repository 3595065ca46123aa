// src/cli/commands.rs
use crate::config::{MAX_THREADS, MIN_THREADS};
use crate::types::{Coin, MiningMode};
use crate::utils::error::MinerError;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Scrypt Miner CLI - CPU mining for Scrypt coins in Rust
#[derive(Parser, Debug)]
#[command(name = "scrypt-miner-rs")]
#[command(version, about, long_about = None)]
pub struct Commands {
    /// The action to perform
    #[command(subcommand)]
    pub action: Action,
}

/// Top-level commands for the miner application
#[derive(Subcommand, Debug)]
pub enum Action {
    /// Start mining with a configuration file
    Start(StartOptions),

    /// Measure raw Scrypt hashrate
    Benchmark(BenchmarkOptions),

    /// Generate a configuration file template
    Config(ConfigOptions),

    /// Check that a pool endpoint accepts TCP connections
    TestConnection(TestConnectionOptions),
}

/// Options for starting the mining operation
#[derive(Parser, Debug)]
pub struct StartOptions {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Number of worker threads (overrides config)
    #[arg(short, long)]
    pub threads: Option<usize>,

    /// Duty cycle between 0.1 and 1.0 (overrides config)
    #[arg(short, long)]
    pub intensity: Option<f64>,
}

/// Options for running the hashrate benchmark
#[derive(Parser, Debug)]
pub struct BenchmarkOptions {
    /// Coin whose Scrypt parameters are benchmarked
    #[arg(short, long, value_enum, default_value_t = Coin::Litecoin)]
    pub coin: Coin,

    /// Duration of benchmark in seconds
    #[arg(short, long, default_value_t = 30)]
    pub duration: u64,

    /// Number of threads to use (1 to 64)
    #[arg(short, long, default_value_t = num_cpus::get().clamp(MIN_THREADS, MAX_THREADS))]
    pub threads: usize,
}

impl BenchmarkOptions {
    /// Rejects thread counts outside the nonce partition
    pub fn validate(&self) -> Result<(), MinerError> {
        if !(MIN_THREADS..=MAX_THREADS).contains(&self.threads) {
            return Err(MinerError::ConfigError(format!(
                "Thread count must be between {} and {}",
                MIN_THREADS, MAX_THREADS
            )));
        }
        Ok(())
    }
}

/// Options for generating configuration files
#[derive(Parser, Debug)]
pub struct ConfigOptions {
    /// Output file path
    #[arg(short, long, default_value = "config.toml")]
    pub output: PathBuf,

    /// Template flavour
    #[arg(short, long, value_enum, default_value_t = MiningMode::Pool)]
    pub mode: MiningMode,
}

/// Options for probing a pool endpoint
#[derive(Parser, Debug)]
pub struct TestConnectionOptions {
    /// Pool host name or address
    #[arg(long)]
    pub host: String,

    /// Pool TCP port
    #[arg(long)]
    pub port: u16,
}
