// src/engine.rs
//! Mining engine lifecycle and share routing
//!
//! A [`MiningEngine`] is an explicit handle: it validates a configuration,
//! picks a work source (pool, solo or the simulated fallback), runs the
//! worker pool and the statistics samplers, and routes every share either to
//! the work source or to the solo block check.
//!
//! Threads and tasks of one session:
//! - one OS thread per worker, plus a `share-router` thread draining the
//!   workers' crossbeam channel
//! - tokio tasks for the pool client, the work-event pump and the two
//!   samplers, all tied to one cancellation token

use crate::config::MiningConfiguration;
use crate::miner::{DifficultyContext, ScryptAlgo, Share, WorkBoard, WorkerEvent, WorkerPool};
use crate::network::{
    PoolClient, PoolCredentials, PoolSettings, PoolState, SoloWork, WorkEvent,
};
use crate::stats::{EngineStats, StatsReporter};
use crate::types::{MiningMode, OperationResult};
use crate::utils::error::MinerError;
use crossbeam_channel::Receiver;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;

/// Capacity of the engine event broadcast
const EVENT_CAPACITY: usize = 256;

/// Engine tunables that are not part of the user configuration
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    /// Pool connect timeout, reconnect delay and simulated-pool behaviour
    pub pool: PoolSettings,
    /// Length of the trailing hashrate window
    pub hashrate_window: Duration,
    /// Period of the hashrate/uptime sampler
    pub hashrate_interval: Duration,
    /// Period of the host-resource sampler
    pub host_interval: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            pool: PoolSettings::default(),
            hashrate_window: Duration::from_secs(10),
            hashrate_interval: Duration::from_secs(1),
            host_interval: Duration::from_secs(5),
        }
    }
}

/// Engine lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Lifecycle {
    /// Not mining
    Idle,
    /// `start` in progress
    Starting,
    /// Workers running
    Running,
    /// `stop` in progress
    Stopping,
}

/// Notifications for status adapters
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Mining started
    Started {
        /// Solo or pool
        mode: MiningMode,
        /// Number of workers
        threads: usize,
    },
    /// Mining stopped
    Stopped,
    /// A worker found a share for the current job
    ShareFound {
        /// Worker that found it
        worker_id: usize,
        /// Job it was computed against
        job_id: String,
        /// Winning nonce
        nonce: u32,
    },
    /// The work source credited a share
    ShareAccepted {
        /// Job the share was for
        job_id: String,
    },
    /// The work source refused a share
    ShareRejected {
        /// Job the share was for
        job_id: String,
        /// Reason given
        reason: String,
    },
    /// A solo share met the network block target
    BlockFound {
        /// Job the block was for
        job_id: String,
        /// Winning nonce
        nonce: u32,
    },
    /// A worker hit a non-fatal fault
    WorkerFault {
        /// Worker that hit it
        worker_id: usize,
        /// Description
        message: String,
    },
    /// The pool was unreachable; work is now simulated
    TestMode,
}

/// Status snapshot for API adapters
#[derive(Debug, Clone, Serialize)]
pub struct MiningStatus {
    /// Whether workers are running
    pub is_mining: bool,
    /// Engine lifecycle state
    pub lifecycle: Lifecycle,
    /// Session statistics
    pub stats: EngineStats,
    /// Configuration of the current or last session
    pub config: Option<MiningConfiguration>,
    /// Whether a real pool connection is up
    pub pool_connected: bool,
    /// Protocol state of the pool client, if in pool mode
    pub pool_state: Option<PoolState>,
    /// Identifier of the current job
    pub current_job_id: Option<String>,
    /// Current share difficulty
    pub difficulty: f64,
    /// Whether work comes from the simulated pool
    pub test_mode: bool,
}

/// State shared between the engine handle and its tasks
#[derive(Default)]
struct SourceState {
    pool_state: Mutex<Option<PoolState>>,
    test_mode: AtomicBool,
}

impl SourceState {
    fn set_pool_state(&self, state: Option<PoolState>) {
        *self
            .pool_state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = state;
    }

    fn pool_state(&self) -> Option<PoolState> {
        *self
            .pool_state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Where routed shares go
pub enum ShareSink {
    /// Forwarded to the pool client (or its simulated fallback)
    Pool(UnboundedSender<Share>),
    /// Checked against the network block target
    Solo(SoloWork),
}

/// What happened to a routed share
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Its job is no longer current; dropped
    Stale,
    /// Handed to the pool client
    Forwarded,
    /// Solo share that met the block target
    Block,
    /// Solo share below the block target
    BelowBlockTarget,
}

/// Moves worker output to its destination
pub struct ShareRouter {
    board: Arc<WorkBoard>,
    stats: Arc<StatsReporter>,
    events: broadcast::Sender<EngineEvent>,
    sink: ShareSink,
}

impl ShareRouter {
    /// Creates a router
    ///
    /// # Arguments
    /// * `board` - Current job, used for the staleness check
    /// * `stats` - Counters for stale shares and blocks
    /// * `events` - Engine event broadcast
    /// * `sink` - Pool or solo destination
    pub fn new(
        board: Arc<WorkBoard>,
        stats: Arc<StatsReporter>,
        events: broadcast::Sender<EngineEvent>,
        sink: ShareSink,
    ) -> Self {
        ShareRouter {
            board,
            stats,
            events,
            sink,
        }
    }

    /// Routes one share
    ///
    /// A share is current only if it was mined on the job instance now on
    /// the board; a republished job id with new coinbase data is a new
    /// instance.
    pub fn route(&self, share: Share) -> RouteOutcome {
        if self.board.current_generation() != Some(share.generation) {
            log::debug!(
                "Dropping stale share from worker {} for job {} (generation {})",
                share.worker_id,
                share.job_id,
                share.generation
            );
            self.stats.record_stale();
            return RouteOutcome::Stale;
        }

        log::info!(
            "Worker {} found share for job {} (nonce {:08x})",
            share.worker_id,
            share.job_id,
            share.nonce
        );
        let _ = self.events.send(EngineEvent::ShareFound {
            worker_id: share.worker_id,
            job_id: share.job_id.clone(),
            nonce: share.nonce,
        });

        match &self.sink {
            ShareSink::Pool(submit) => {
                if submit.send(share).is_err() {
                    log::debug!("Share dropped: pool client has shut down");
                }
                RouteOutcome::Forwarded
            }
            ShareSink::Solo(work) => {
                if work.is_block(&share) {
                    log::info!(
                        "Block found for job {} at nonce {:08x}",
                        share.job_id,
                        share.nonce
                    );
                    self.stats.record_block();
                    let _ = self.events.send(EngineEvent::BlockFound {
                        job_id: share.job_id,
                        nonce: share.nonce,
                    });
                    RouteOutcome::Block
                } else {
                    RouteOutcome::BelowBlockTarget
                }
            }
        }
    }

    /// Drains worker events until every worker sender is gone
    pub fn run(self, events: Receiver<WorkerEvent>) {
        for event in events.iter() {
            match event {
                WorkerEvent::Share(share) => {
                    self.route(share);
                }
                WorkerEvent::Fault { worker_id, message } => {
                    log::warn!("{} (worker {} continues)", message, worker_id);
                    let _ = self
                        .events
                        .send(EngineEvent::WorkerFault { worker_id, message });
                }
            }
        }
        log::debug!("Share router stopped");
    }
}

/// Resources of one running session
struct Session {
    config: MiningConfiguration,
    workers: WorkerPool,
    router: Option<JoinHandle<()>>,
    shutdown: CancellationToken,
    tasks: Vec<tokio::task::JoinHandle<()>>,
}

/// The mining engine handle
pub struct MiningEngine {
    settings: EngineSettings,
    lifecycle: Mutex<Lifecycle>,
    session: Mutex<Option<Session>>,
    last_config: Mutex<Option<MiningConfiguration>>,
    board: Arc<WorkBoard>,
    stats: Arc<StatsReporter>,
    source: Arc<SourceState>,
    events: broadcast::Sender<EngineEvent>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MiningEngine {
    /// Creates an idle engine
    pub fn new(settings: EngineSettings) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        MiningEngine {
            stats: Arc::new(StatsReporter::new(settings.hashrate_window)),
            settings,
            lifecycle: Mutex::new(Lifecycle::Idle),
            session: Mutex::new(None),
            last_config: Mutex::new(None),
            board: Arc::new(WorkBoard::new()),
            source: Arc::new(SourceState::default()),
            events,
        }
    }

    /// Subscribes to engine events
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    /// Current lifecycle state
    pub fn lifecycle(&self) -> Lifecycle {
        *lock(&self.lifecycle)
    }

    /// Shared statistics
    pub fn stats(&self) -> Arc<StatsReporter> {
        self.stats.clone()
    }

    /// Validates `config` and starts mining
    ///
    /// Must be called from within a tokio runtime. Only a configuration error
    /// (or an engine that is not idle) prevents mining; an unreachable pool
    /// falls back to simulated work.
    pub async fn start(&self, config: MiningConfiguration) -> OperationResult {
        {
            let mut lifecycle = lock(&self.lifecycle);
            if *lifecycle != Lifecycle::Idle {
                return OperationResult::failed("Mining already running");
            }
            *lifecycle = Lifecycle::Starting;
        }

        log::info!(
            "Starting {} {} mining with {} threads at intensity {}",
            config.coin,
            config.mode,
            config.threads,
            config.intensity
        );

        match self.launch(config.clone()) {
            Ok(session) => {
                *lock(&self.session) = Some(session);
                *lock(&self.last_config) = Some(config.clone());
                *lock(&self.lifecycle) = Lifecycle::Running;
                let _ = self.events.send(EngineEvent::Started {
                    mode: config.mode,
                    threads: config.threads,
                });
                log::info!("Mining engine started");
                OperationResult::ok("Mining started successfully")
            }
            Err(e) => {
                log::error!("Mining start failed: {}", e);
                *lock(&self.lifecycle) = Lifecycle::Idle;
                match e {
                    MinerError::ConfigError(message) => OperationResult::failed(message),
                    other => OperationResult::failed(other.to_string()),
                }
            }
        }
    }

    fn launch(&self, config: MiningConfiguration) -> Result<Session, MinerError> {
        config.validate()?;
        let algorithm = Arc::new(ScryptAlgo::new(config.coin.preset().scrypt)?);

        self.board.clear_job();
        self.board.set_difficulty(DifficultyContext::default());
        self.source.test_mode.store(false, Ordering::Release);
        self.source.set_pool_state(None);

        let (worker_tx, worker_rx) = crossbeam_channel::unbounded();
        let mut workers = WorkerPool::new(
            config.threads,
            config.intensity,
            algorithm,
            self.board.clone(),
            worker_tx,
        );
        self.stats.begin_session(workers.hash_counter());

        let shutdown = CancellationToken::new();
        let mut tasks = Vec::new();

        let sink = match config.mode {
            MiningMode::Solo => {
                let solo = SoloWork::new(config.coin, config.wallet());
                workers.set_job(solo.job().clone());
                ShareSink::Solo(solo)
            }
            MiningMode::Pool => {
                let endpoint = config.pool_endpoint()?;
                let (share_tx, share_rx) = mpsc::unbounded_channel();
                let (work_tx, work_rx) = mpsc::unbounded_channel();
                self.source.set_pool_state(Some(PoolState::Disconnected));

                let client = PoolClient::new(
                    endpoint,
                    PoolCredentials {
                        username: config.username().to_string(),
                        password: config.pool_password.clone(),
                    },
                    self.settings.pool.clone(),
                    work_tx,
                    share_rx,
                    shutdown.child_token(),
                );
                tasks.push(tokio::spawn(async move {
                    if let Err(e) = client.run().await {
                        log::error!("Pool client stopped: {}", e);
                    }
                }));
                tasks.push(tokio::spawn(pump_work_events(
                    work_rx,
                    self.board.clone(),
                    self.stats.clone(),
                    self.source.clone(),
                    self.events.clone(),
                    shutdown.clone(),
                )));
                ShareSink::Pool(share_tx)
            }
        };

        let router = ShareRouter::new(
            self.board.clone(),
            self.stats.clone(),
            self.events.clone(),
            sink,
        );
        let router = std::thread::Builder::new()
            .name("share-router".into())
            .spawn(move || router.run(worker_rx));
        let router = match router {
            Ok(handle) => handle,
            Err(e) => {
                shutdown.cancel();
                return Err(e.into());
            }
        };

        if let Err(e) = workers.start() {
            shutdown.cancel();
            return Err(e);
        }

        tasks.push(tokio::spawn(run_sampler(
            self.settings.hashrate_interval,
            shutdown.clone(),
            {
                let stats = self.stats.clone();
                move || stats.sample_hashrate()
            },
        )));
        tasks.push(tokio::spawn(run_sampler(
            self.settings.host_interval,
            shutdown.clone(),
            {
                let stats = self.stats.clone();
                move || {
                    let hardware = stats.sample_host();
                    log::debug!(
                        "Host: process CPU {:.1}%, memory {} bytes, system CPU {:.1}%",
                        hardware.cpu_usage,
                        hardware.memory_used,
                        hardware.system_cpu_usage
                    );
                }
            },
        )));

        Ok(Session {
            config,
            workers,
            router: Some(router),
            shutdown,
            tasks,
        })
    }

    /// Stops mining
    ///
    /// Once this returns no worker emits further shares or hash counts.
    pub async fn stop(&self) -> OperationResult {
        {
            let mut lifecycle = lock(&self.lifecycle);
            match *lifecycle {
                Lifecycle::Running => *lifecycle = Lifecycle::Stopping,
                Lifecycle::Idle => return OperationResult::failed("Mining not running"),
                Lifecycle::Starting | Lifecycle::Stopping => {
                    return OperationResult::failed("Mining is changing state");
                }
            }
        }

        log::info!("Stopping mining engine");
        let session = lock(&self.session).take();
        let result = match session {
            Some(session) => self.teardown(session).await,
            None => Ok(()),
        };

        self.board.clear_job();
        self.source.set_pool_state(None);
        self.source.test_mode.store(false, Ordering::Release);
        *lock(&self.lifecycle) = Lifecycle::Idle;
        let _ = self.events.send(EngineEvent::Stopped);

        match result {
            Ok(()) => {
                log::info!("Mining engine stopped");
                OperationResult::ok("Mining stopped successfully")
            }
            Err(e) => {
                log::error!("Mining stop incomplete: {}", e);
                OperationResult::failed(e.to_string())
            }
        }
    }

    async fn teardown(&self, session: Session) -> Result<(), MinerError> {
        let Session {
            config,
            mut workers,
            router,
            shutdown,
            tasks,
        } = session;
        log::debug!("Tearing down {} session", config.mode);
        shutdown.cancel();

        tokio::task::spawn_blocking(move || {
            workers.stop();
            if let Some(router) = router {
                if router.join().is_err() {
                    log::error!("Share router panicked");
                }
            }
        })
        .await?;

        for task in tasks {
            task.await?;
        }
        Ok(())
    }

    /// Status snapshot
    pub fn status(&self) -> MiningStatus {
        let lifecycle = self.lifecycle();
        let pool_state = self.source.pool_state();
        let test_mode = self.source.test_mode.load(Ordering::Acquire);
        let pool_connected = !test_mode
            && matches!(
                pool_state,
                Some(
                    PoolState::Connected
                        | PoolState::Subscribed
                        | PoolState::Authorized
                        | PoolState::Mining
                )
            );

        MiningStatus {
            is_mining: lifecycle == Lifecycle::Running,
            lifecycle,
            stats: self.stats.snapshot(),
            config: lock(&self.last_config).clone(),
            pool_connected,
            pool_state,
            current_job_id: self.board.current_job_id(),
            difficulty: self.board.difficulty().difficulty,
            test_mode,
        }
    }

    /// Nonce ranges of the running workers
    pub fn worker_ranges(&self) -> Vec<std::ops::Range<u64>> {
        lock(&self.session)
            .as_ref()
            .map(|s| s.workers.ranges())
            .unwrap_or_default()
    }

    /// Nonce cursors of the running workers
    pub fn worker_cursors(&self) -> Vec<u32> {
        lock(&self.session)
            .as_ref()
            .map(|s| s.workers.cursors())
            .unwrap_or_default()
    }
}

impl Default for MiningEngine {
    fn default() -> Self {
        MiningEngine::new(EngineSettings::default())
    }
}

impl Drop for MiningEngine {
    fn drop(&mut self) {
        if let Some(session) = lock(&self.session).take() {
            // WorkerPool joins its threads on drop
            session.shutdown.cancel();
        }
    }
}

/// Applies work-source events to the board and the counters
async fn pump_work_events(
    mut work: UnboundedReceiver<WorkEvent>,
    board: Arc<WorkBoard>,
    stats: Arc<StatsReporter>,
    source: Arc<SourceState>,
    events: broadcast::Sender<EngineEvent>,
    shutdown: CancellationToken,
) {
    loop {
        let event = tokio::select! {
            _ = shutdown.cancelled() => break,
            event = work.recv() => match event {
                Some(event) => event,
                None => break,
            },
        };

        match event {
            WorkEvent::StateChanged(state) => source.set_pool_state(Some(state)),
            WorkEvent::NewJob(job) => {
                log::info!("New job {} (clean={})", job.job_id, job.clean_jobs);
                board.publish_job(job);
            }
            WorkEvent::DifficultyChanged(difficulty) => {
                let context = DifficultyContext::new(difficulty);
                log::info!("Share difficulty set to {}", context.difficulty);
                board.set_difficulty(context);
            }
            WorkEvent::ShareAccepted { job_id } => {
                stats.record_accepted();
                let _ = events.send(EngineEvent::ShareAccepted { job_id });
            }
            WorkEvent::ShareRejected { job_id, reason } => {
                stats.record_rejected();
                let _ = events.send(EngineEvent::ShareRejected { job_id, reason });
            }
            WorkEvent::ShareStale { .. } => stats.record_stale(),
            WorkEvent::SimulationStarted => {
                log::warn!("Test mode: shares go to a simulated pool");
                source.test_mode.store(true, Ordering::Release);
                let _ = events.send(EngineEvent::TestMode);
            }
        }
    }
    log::debug!("Work event pump stopped");
}

/// Calls `sample` every `period` until cancelled
async fn run_sampler<F>(period: Duration, shutdown: CancellationToken, sample: F)
where
    F: Fn() + Send + 'static,
{
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => sample(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::miner::job::tests::sample_job;
    use crate::types::Coin;

    fn router_with(sink: ShareSink) -> (ShareRouter, Arc<WorkBoard>, Arc<StatsReporter>) {
        let board = Arc::new(WorkBoard::new());
        let stats = Arc::new(StatsReporter::default());
        let (events, _) = broadcast::channel(16);
        (
            ShareRouter::new(board.clone(), stats.clone(), events, sink),
            board,
            stats,
        )
    }

    fn share(job_id: &str, generation: u64, hash: [u8; 32]) -> Share {
        Share {
            worker_id: 2,
            job_id: job_id.into(),
            generation,
            nonce: 0x0200_0001,
            hash,
            ntime: 0,
        }
    }

    #[test]
    fn test_router_drops_stale_share_without_verdict() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let (router, board, stats) = router_with(ShareSink::Pool(tx));
        let old = board.publish_job(sample_job("old"));
        board.publish_job(sample_job("new"));

        assert_eq!(router.route(share("old", old, [0; 32])), RouteOutcome::Stale);
        assert!(rx.try_recv().is_err());

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.stale_shares, 1);
        assert_eq!(snapshot.accepted_shares, 0);
        assert_eq!(snapshot.rejected_shares, 0);
    }

    #[test]
    fn test_router_forwards_current_share_to_pool() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let (router, board, _) = router_with(ShareSink::Pool(tx));
        let current = board.publish_job(sample_job("cur"));

        assert_eq!(
            router.route(share("cur", current, [0; 32])),
            RouteOutcome::Forwarded
        );
        assert_eq!(rx.try_recv().unwrap().job_id, "cur");
    }

    #[test]
    fn test_router_drops_share_for_republished_job_id() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let (router, board, stats) = router_with(ShareSink::Pool(tx));

        let mut first = sample_job("1");
        first.coinbase_extra = vec![0xaa, 0xbb];
        let superseded = board.publish_job(first);

        // Same id after a reconnect, new extranonce
        let mut again = sample_job("1");
        again.coinbase_extra = vec![0xcc, 0xdd];
        board.publish_job(again);

        assert_eq!(
            router.route(share("1", superseded, [0; 32])),
            RouteOutcome::Stale
        );
        assert!(rx.try_recv().is_err());

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.stale_shares, 1);
        assert_eq!(snapshot.accepted_shares, 0);
        assert_eq!(snapshot.rejected_shares, 0);
    }

    #[test]
    fn test_router_solo_block_check() {
        let solo = SoloWork::new(Coin::Litecoin, "LWallet");
        let job_id = solo.job().job_id.clone();
        let (router, board, stats) = router_with(ShareSink::Solo(solo.clone()));
        let generation = board.publish_job(solo.job().clone());

        // Meets difficulty 1 but not the network target
        let mut weak = [0u8; 32];
        weak[27] = 0x0f;
        assert_eq!(router.route(share(&job_id, generation, weak)), RouteOutcome::BelowBlockTarget);
        assert_eq!(stats.snapshot().blocks_found, 0);

        assert_eq!(router.route(share(&job_id, generation, [0; 32])), RouteOutcome::Block);
        assert_eq!(stats.snapshot().blocks_found, 1);
    }

    #[tokio::test]
    async fn test_invalid_config_never_starts() {
        let engine = MiningEngine::default();
        let mut config = MiningConfiguration::solo(Coin::Litecoin, "LWallet");
        config.threads = 0;

        let result = engine.start(config).await;
        assert!(!result.success);
        assert_eq!(result.message, "Thread count must be between 1 and 64");
        assert_eq!(engine.lifecycle(), Lifecycle::Idle);
        assert!(!engine.status().is_mining);
    }

    #[tokio::test]
    async fn test_stop_when_idle_fails() {
        let engine = MiningEngine::default();
        let result = engine.stop().await;
        assert!(!result.success);
        assert_eq!(result.message, "Mining not running");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_solo_start_publishes_static_job() {
        let engine = MiningEngine::default();
        let mut config = MiningConfiguration::solo(Coin::Feathercoin, "6Wallet");
        config.threads = 2;

        assert!(engine.start(config).await.success);
        let status = engine.status();
        assert!(status.is_mining);
        assert!(status.current_job_id.unwrap().starts_with("solo-ftc-"));
        assert!(!status.test_mode);
        assert!(status.pool_state.is_none());
        assert_eq!(engine.worker_ranges().len(), 2);

        assert!(engine.stop().await.success);
        let status = engine.status();
        assert!(!status.is_mining);
        assert!(status.current_job_id.is_none());
        assert!(engine.worker_ranges().is_empty());
    }
}
