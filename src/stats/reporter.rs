// src/stats/reporter.rs
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use sysinfo::{Pid, ProcessesToUpdate, System};

/// Aggregate statistics for one mining session
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EngineStats {
    /// Hashes per second over the trailing window
    pub hashrate: f64,
    /// Total hashes computed this session
    pub hashes_total: u64,
    /// Shares credited by the work source
    pub accepted_shares: u64,
    /// Shares refused by the work source
    pub rejected_shares: u64,
    /// Shares dropped because their job was superseded
    pub stale_shares: u64,
    /// Solo shares that also met the block target
    pub blocks_found: u64,
    /// Seconds since the session started
    pub uptime: f64,
    /// `accepted / (accepted + rejected)`, 0 without verdicts
    pub efficiency: f64,
    /// Process CPU usage percent at the last host sample
    pub cpu_usage: f32,
    /// Process resident memory in MB at the last host sample
    pub memory_usage: f64,
}

/// Statistics related to hardware performance
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HardwareStats {
    /// CPU usage of this process (percent, may exceed 100 on multi-core)
    pub cpu_usage: f32,
    /// Memory used by this process (in bytes)
    pub memory_used: u64,
    /// Average usage across all CPUs (percent)
    pub system_cpu_usage: f32,
}

/// Share acceptance ratio
pub fn efficiency(accepted: u64, rejected: u64) -> f64 {
    let total = accepted + rejected;
    if total == 0 {
        0.0
    } else {
        accepted as f64 / total as f64
    }
}

/// Host resource sampler backed by sysinfo
pub struct HostSampler {
    system: System,
    pid: Option<Pid>,
}

impl HostSampler {
    /// Creates a sampler for the current process
    pub fn new() -> Self {
        HostSampler {
            system: System::new(),
            pid: sysinfo::get_current_pid().ok(),
        }
    }

    /// Refreshes and returns a hardware snapshot
    ///
    /// CPU figures are deltas since the previous call, so the first sample
    /// reads 0.
    pub fn sample(&mut self) -> HardwareStats {
        self.system.refresh_cpu_all();
        self.system.refresh_memory();

        let cpus = self.system.cpus();
        let system_cpu_usage = if cpus.is_empty() {
            0.0
        } else {
            cpus.iter().map(|c| c.cpu_usage()).sum::<f32>() / cpus.len() as f32
        };

        let (cpu_usage, memory_used) = match self.pid {
            Some(pid) => {
                self.system
                    .refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
                self.system
                    .process(pid)
                    .map(|p| (p.cpu_usage(), p.memory()))
                    .unwrap_or_default()
            }
            None => (0.0, 0),
        };

        HardwareStats {
            cpu_usage,
            memory_used,
            system_cpu_usage,
        }
    }
}

impl Default for HostSampler {
    fn default() -> Self {
        HostSampler::new()
    }
}

struct Session {
    hashes: Arc<AtomicU64>,
    started: Instant,
    samples: VecDeque<(Instant, u64)>,
    hashrate: f64,
    uptime: f64,
    hardware: HardwareStats,
}

impl Session {
    fn new(hashes: Arc<AtomicU64>) -> Self {
        let started = Instant::now();
        let mut samples = VecDeque::new();
        samples.push_back((started, hashes.load(Ordering::Relaxed)));
        Session {
            hashes,
            started,
            samples,
            hashrate: 0.0,
            uptime: 0.0,
            hardware: HardwareStats::default(),
        }
    }
}

/// Collects mining statistics from workers, work sources and samplers
///
/// Share counters are atomics written from several threads; derived values
/// (hashrate, uptime, host usage) are recomputed by the periodic samplers.
pub struct StatsReporter {
    accepted: AtomicU64,
    rejected: AtomicU64,
    stale: AtomicU64,
    blocks: AtomicU64,
    window: Duration,
    session: Mutex<Session>,
    host: Mutex<HostSampler>,
}

impl StatsReporter {
    /// Creates a reporter with the given hashrate window
    ///
    /// # Arguments
    /// * `window` - Length of the trailing hashrate window
    pub fn new(window: Duration) -> Self {
        StatsReporter {
            accepted: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
            stale: AtomicU64::new(0),
            blocks: AtomicU64::new(0),
            window,
            session: Mutex::new(Session::new(Arc::new(AtomicU64::new(0)))),
            host: Mutex::new(HostSampler::new()),
        }
    }

    fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Resets every counter and starts a new session
    ///
    /// # Arguments
    /// * `hashes` - The worker pool's hash counter for this session
    pub fn begin_session(&self, hashes: Arc<AtomicU64>) {
        self.accepted.store(0, Ordering::Relaxed);
        self.rejected.store(0, Ordering::Relaxed);
        self.stale.store(0, Ordering::Relaxed);
        self.blocks.store(0, Ordering::Relaxed);
        *self.session() = Session::new(hashes);
    }

    /// Counts a share credited by the work source
    pub fn record_accepted(&self) {
        self.accepted.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts a share refused by the work source
    pub fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts a share dropped as stale
    pub fn record_stale(&self) {
        self.stale.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts a solved block
    pub fn record_block(&self) {
        self.blocks.fetch_add(1, Ordering::Relaxed);
    }

    /// Recomputes hashrate and uptime (the 1 s sampler)
    pub fn sample_hashrate(&self) {
        let now = Instant::now();
        let mut session = self.session();
        let total = session.hashes.load(Ordering::Relaxed);
        session.samples.push_back((now, total));

        // Keep the newest sample at or before the window start as the base
        if let Some(cutoff) = now.checked_sub(self.window) {
            while session.samples.len() > 2 && session.samples[1].0 <= cutoff {
                session.samples.pop_front();
            }
        }

        if let Some(&(base_time, base_total)) = session.samples.front() {
            let elapsed = now.duration_since(base_time).as_secs_f64();
            if elapsed > 0.0 {
                session.hashrate = total.saturating_sub(base_total) as f64 / elapsed;
            }
        }
        session.uptime = now.duration_since(session.started).as_secs_f64();
    }

    /// Refreshes host CPU and memory usage (the 5 s sampler)
    pub fn sample_host(&self) -> HardwareStats {
        let hardware = self
            .host
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .sample();
        self.session().hardware = hardware.clone();
        hardware
    }

    /// Current statistics
    pub fn snapshot(&self) -> EngineStats {
        let session = self.session();
        let accepted = self.accepted.load(Ordering::Relaxed);
        let rejected = self.rejected.load(Ordering::Relaxed);

        EngineStats {
            hashrate: session.hashrate,
            hashes_total: session.hashes.load(Ordering::Relaxed),
            accepted_shares: accepted,
            rejected_shares: rejected,
            stale_shares: self.stale.load(Ordering::Relaxed),
            blocks_found: self.blocks.load(Ordering::Relaxed),
            uptime: session.uptime,
            efficiency: efficiency(accepted, rejected),
            cpu_usage: session.hardware.cpu_usage,
            memory_usage: session.hardware.memory_used as f64 / 1024.0 / 1024.0,
        }
    }

    /// One-line summary for periodic logging
    pub fn summary_line(&self) -> String {
        let stats = self.snapshot();
        format!(
            "Hashrate: {:.2} H/s | Accepted/Rejected/Stale: {}/{}/{} | Blocks: {} | CPU: {:.1}% | Mem: {:.1} MB",
            stats.hashrate,
            stats.accepted_shares,
            stats.rejected_shares,
            stats.stale_shares,
            stats.blocks_found,
            stats.cpu_usage,
            stats.memory_usage
        )
    }
}

impl Default for StatsReporter {
    fn default() -> Self {
        StatsReporter::new(Duration::from_secs(10))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_efficiency_ratio() {
        assert_eq!(efficiency(0, 0), 0.0);
        assert_eq!(efficiency(9, 1), 0.9);
        assert_eq!(efficiency(0, 5), 0.0);
        assert_eq!(efficiency(3, 0), 1.0);
    }

    #[test]
    fn test_snapshot_tracks_counters() {
        let reporter = StatsReporter::default();
        let hashes = Arc::new(AtomicU64::new(0));
        reporter.begin_session(hashes.clone());

        hashes.fetch_add(42, Ordering::Relaxed);
        reporter.record_accepted();
        reporter.record_accepted();
        reporter.record_accepted();
        reporter.record_rejected();
        reporter.record_stale();
        reporter.record_block();

        let stats = reporter.snapshot();
        assert_eq!(stats.hashes_total, 42);
        assert_eq!(stats.accepted_shares, 3);
        assert_eq!(stats.rejected_shares, 1);
        assert_eq!(stats.stale_shares, 1);
        assert_eq!(stats.blocks_found, 1);
        assert!((stats.efficiency - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_begin_session_resets() {
        let reporter = StatsReporter::default();
        reporter.begin_session(Arc::new(AtomicU64::new(0)));
        reporter.record_accepted();
        reporter.record_block();

        reporter.begin_session(Arc::new(AtomicU64::new(0)));
        let stats = reporter.snapshot();
        assert_eq!(stats, EngineStats::default());
    }

    #[test]
    fn test_hashrate_over_window() {
        let reporter = StatsReporter::new(Duration::from_secs(10));
        let hashes = Arc::new(AtomicU64::new(0));
        reporter.begin_session(hashes.clone());

        std::thread::sleep(Duration::from_millis(100));
        hashes.fetch_add(1000, Ordering::Relaxed);
        reporter.sample_hashrate();

        let stats = reporter.snapshot();
        assert!(stats.hashrate > 0.0);
        // 1000 hashes over at least 100 ms
        assert!(stats.hashrate <= 10_000.0);
        assert!(stats.uptime >= 0.1);
    }

    #[test]
    fn test_window_drops_old_samples() {
        let reporter = StatsReporter::new(Duration::from_millis(50));
        let hashes = Arc::new(AtomicU64::new(0));
        reporter.begin_session(hashes.clone());

        hashes.fetch_add(1_000_000, Ordering::Relaxed);
        reporter.sample_hashrate();
        std::thread::sleep(Duration::from_millis(80));
        reporter.sample_hashrate();
        std::thread::sleep(Duration::from_millis(80));
        reporter.sample_hashrate();

        // The early burst has left the window; nothing was hashed since
        assert_eq!(reporter.snapshot().hashrate, 0.0);
    }

    #[test]
    fn test_host_sample_reports_memory() {
        let reporter = StatsReporter::default();
        let hardware = reporter.sample_host();
        assert!(hardware.cpu_usage >= 0.0);
        assert!(reporter.snapshot().memory_usage >= 0.0);
    }
}
