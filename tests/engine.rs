use scrypt_miner_rs::engine::{EngineEvent, Lifecycle};
use scrypt_miner_rs::network::{PoolSettings, PoolState, SimulationSettings};
use scrypt_miner_rs::{Coin, EngineSettings, MiningConfiguration, MiningEngine};
use std::net::TcpListener;
use std::time::{Duration, Instant};

fn solo_config(threads: usize, intensity: f64) -> MiningConfiguration {
    let mut config = MiningConfiguration::solo(Coin::Litecoin, "LTestWalletAddress");
    config.threads = threads;
    config.intensity = intensity;
    config
}

/// A local port with nothing listening on it
fn refused_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

fn fast_settings() -> EngineSettings {
    EngineSettings {
        pool: PoolSettings {
            connect_timeout: Duration::from_millis(500),
            reconnect_delay: Duration::from_millis(200),
            simulation: SimulationSettings {
                job_interval: Duration::from_millis(300),
                accept_rate: 0.9,
            },
        },
        hashrate_interval: Duration::from_millis(250),
        ..EngineSettings::default()
    }
}

async fn wait_until(limit: Duration, mut check: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + limit;
    while Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    check()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn solo_mining_partitions_nonces_and_reports_hashrate() {
    let engine = MiningEngine::new(fast_settings());
    let mut events = engine.subscribe();

    let result = engine.start(solo_config(4, 0.8)).await;
    assert!(result.success, "{}", result.message);
    assert_eq!(result.message, "Mining started successfully");
    assert_eq!(
        events.recv().await.unwrap(),
        EngineEvent::Started {
            mode: scrypt_miner_rs::MiningMode::Solo,
            threads: 4
        }
    );

    assert_eq!(
        engine.worker_ranges(),
        vec![
            0..0x100_0000,
            0x100_0000..0x200_0000,
            0x200_0000..0x300_0000,
            0x300_0000..0x400_0000
        ]
    );

    let hashing = wait_until(Duration::from_secs(20), || {
        engine.status().stats.hashrate > 0.0
    })
    .await;
    assert!(hashing, "hashrate never became positive");

    // Every cursor stays inside its worker's range
    for (cursor, range) in engine.worker_cursors().iter().zip(engine.worker_ranges()) {
        assert!(range.contains(&(*cursor as u64)));
    }

    let status = engine.status();
    assert!(status.is_mining);
    assert!(!status.pool_connected);
    assert!(!status.test_mode);
    assert_eq!(status.config.as_ref().unwrap().threads, 4);
    assert!(status.stats.hashes_total > 0);

    let stopped = engine.stop().await;
    assert!(stopped.success);
    assert_eq!(stopped.message, "Mining stopped successfully");

    // No further hash counts after stop returns
    let after = engine.status().stats.hashes_total;
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(engine.status().stats.hashes_total, after);
    assert_eq!(engine.lifecycle(), Lifecycle::Idle);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn second_start_is_refused() {
    let engine = MiningEngine::new(fast_settings());
    assert!(engine.start(solo_config(2, 1.0)).await.success);

    let again = engine.start(solo_config(6, 1.0)).await;
    assert!(!again.success);
    assert_eq!(again.message, "Mining already running");
    assert_eq!(engine.worker_ranges().len(), 2);
    assert_eq!(engine.status().config.unwrap().threads, 2);

    assert!(engine.stop().await.success);
}

#[tokio::test]
async fn stop_while_idle_is_refused() {
    let engine = MiningEngine::default();
    let result = engine.stop().await;
    assert!(!result.success);
    assert_eq!(result.message, "Mining not running");
}

#[tokio::test]
async fn invalid_configuration_leaves_engine_idle() {
    let engine = MiningEngine::default();

    let mut no_wallet = solo_config(2, 1.0);
    no_wallet.wallet_address = None;
    let result = engine.start(no_wallet).await;
    assert!(!result.success);
    assert_eq!(result.message, "Wallet address is required for solo mining");

    let result = engine.start(solo_config(2, 0.05)).await;
    assert!(!result.success);
    assert_eq!(result.message, "Intensity must be between 0.1 and 1.0");

    let mut no_user = MiningConfiguration::pool(Coin::Dogecoin, "worker");
    no_user.pool_username = None;
    assert!(!engine.start(no_user).await.success);

    assert_eq!(engine.lifecycle(), Lifecycle::Idle);
    assert!(!engine.status().is_mining);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unreachable_pool_switches_to_test_mode() {
    let engine = MiningEngine::new(fast_settings());
    let mut config = MiningConfiguration::pool(Coin::Litecoin, "wallet.worker");
    config.custom_pool_address = Some("127.0.0.1".into());
    config.custom_pool_port = Some(refused_port());
    config.threads = 2;

    let result = engine.start(config).await;
    assert!(result.success, "{}", result.message);

    let simulated = wait_until(Duration::from_secs(10), || {
        let status = engine.status();
        status.test_mode && status.current_job_id.is_some()
    })
    .await;
    assert!(simulated, "engine never fell back to simulated work");

    let status = engine.status();
    assert!(status.is_mining);
    assert!(!status.pool_connected);
    assert_ne!(status.pool_state, Some(PoolState::Mining));
    assert!(status.current_job_id.unwrap().starts_with("sim-"));

    assert!(engine.stop().await.success);
    let status = engine.status();
    assert!(!status.test_mode);
    assert!(status.current_job_id.is_none());
}
