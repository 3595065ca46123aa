// src/main.rs
use clap::Parser;
use scrypt_miner_rs::cli::{self, Action};
use scrypt_miner_rs::miner::{DifficultyContext, ScryptAlgo, WorkBoard, WorkerPool};
use scrypt_miner_rs::network::{SoloWork, test_connection};
use scrypt_miner_rs::utils::{init_bench_logging, init_logging};
use scrypt_miner_rs::{MinerError, MiningEngine, config};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::Runtime;

/// How often the `start` command logs a statistics line
const SUMMARY_INTERVAL: Duration = Duration::from_secs(10);

/// Main entry point for the Scrypt miner
///
/// # Returns
/// - `Ok(())` on successful execution
/// - `Err(MinerError)` if any operation fails
fn main() -> Result<(), MinerError> {
    let cli = cli::Commands::parse();

    match cli.action {
        Action::Start(opts) => start_mining(opts),
        Action::Benchmark(opts) => run_benchmark(opts),
        Action::Config(opts) => generate_config(opts),
        Action::TestConnection(opts) => probe_pool(opts),
    }
}

/// Runs the engine until Ctrl-C
///
/// # Operations
/// 1. Initializes logging
/// 2. Loads the configuration and applies CLI overrides
/// 3. Starts the engine and logs a summary every ten seconds
/// 4. Stops the engine on Ctrl-C
fn start_mining(opts: cli::StartOptions) -> Result<(), MinerError> {
    init_logging();

    let mut config = config::load(&opts.config)?;
    if let Some(threads) = opts.threads {
        config.threads = threads;
    }
    if let Some(intensity) = opts.intensity {
        config.intensity = intensity;
    }

    let rt = Runtime::new()?;
    rt.block_on(async {
        let engine = MiningEngine::default();
        let started = engine.start(config).await;
        if !started.success {
            return Err(MinerError::ConfigError(started.message));
        }
        log::info!("{}", started.message);

        let mut summary = tokio::time::interval(SUMMARY_INTERVAL);
        summary.tick().await;
        loop {
            tokio::select! {
                signal = tokio::signal::ctrl_c() => {
                    signal?;
                    log::info!("Interrupt received");
                    break;
                }
                _ = summary.tick() => {
                    let status = engine.status();
                    let source = if status.test_mode {
                        "simulated"
                    } else if status.pool_connected {
                        "pool"
                    } else {
                        "local"
                    };
                    log::info!("[{}] {}", source, engine.stats().summary_line());
                }
            }
        }

        let stopped = engine.stop().await;
        log::info!("{}", stopped.message);
        let stats = engine.status().stats;
        log::info!(
            "Session: {} hashes in {:.0}s, {} accepted, {} rejected, {} stale, {} blocks",
            stats.hashes_total,
            stats.uptime,
            stats.accepted_shares,
            stats.rejected_shares,
            stats.stale_shares,
            stats.blocks_found
        );
        Ok::<(), MinerError>(())
    })
}

/// Measures Scrypt hashrate with the regular worker pool
///
/// Workers mine a synthetic solo job at difficulty 1; shares are ignored.
fn run_benchmark(opts: cli::BenchmarkOptions) -> Result<(), MinerError> {
    init_bench_logging();
    opts.validate()?;

    let preset = opts.coin.preset();
    let algorithm = Arc::new(ScryptAlgo::new(preset.scrypt)?);
    let board = Arc::new(WorkBoard::new());
    board.set_difficulty(DifficultyContext::default());
    board.publish_job(SoloWork::new(opts.coin, "benchmark").job().clone());

    let (events, _ignored) = crossbeam_channel::unbounded();
    let mut pool = WorkerPool::new(opts.threads, 1.0, algorithm, board, events);

    log::info!(
        "Starting {} Scrypt benchmark on {} threads for {} seconds",
        preset.name,
        opts.threads,
        opts.duration
    );

    let started = Instant::now();
    pool.start()?;

    let deadline = Duration::from_secs(opts.duration);
    let mut last = 0u64;
    while started.elapsed() < deadline {
        std::thread::sleep(Duration::from_secs(1));
        let total = pool.total_hashes();
        log::debug!(
            "{:.1} H/s (per worker: {:?})",
            (total - last) as f64,
            pool.worker_hashes()
        );
        last = total;
    }
    pool.stop();

    let elapsed = started.elapsed().as_secs_f64();
    let total = pool.total_hashes();
    log::info!("Benchmark results:");
    log::info!("Total hashes: {}", total);
    log::info!("Average hashrate: {:.2} H/s", total as f64 / elapsed);
    log::logger().flush();

    Ok(())
}

/// Writes a configuration template
fn generate_config(opts: cli::ConfigOptions) -> Result<(), MinerError> {
    let template = config::generate_template(opts.mode);
    std::fs::write(&opts.output, template)?;
    println!("Wrote {} configuration to {}", opts.mode, opts.output.display());
    Ok(())
}

/// Reports whether a pool endpoint accepts TCP connections
fn probe_pool(opts: cli::TestConnectionOptions) -> Result<(), MinerError> {
    init_logging();

    let rt = Runtime::new()?;
    let result = rt.block_on(test_connection(&opts.host, opts.port));
    if result.success {
        log::info!("{}:{} - {}", opts.host, opts.port, result.message);
        Ok(())
    } else {
        Err(MinerError::ConnectionError(result.message))
    }
}
