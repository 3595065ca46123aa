//! Statistics collection and reporting module
//!
//! This module provides functionality for tracking and reporting mining statistics,
//! including:
//! - Trailing-window hashrate and total hash counts
//! - Share acceptance, rejection and staleness tracking
//! - Host monitoring (process and system CPU, process memory)
//!
//! The main component is [`StatsReporter`] which the engine's samplers feed
//! and status queries read.

/// Submodule containing the statistics reporter implementation
///
/// The reporter handles:
/// - Atomic collection of share and block counters
/// - Hashrate and uptime recomputation
/// - Hardware monitoring via sysinfo
pub mod reporter;

// Re-export main components
pub use reporter::{EngineStats, HardwareStats, HostSampler, StatsReporter};
