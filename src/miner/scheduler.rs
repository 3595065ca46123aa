// src/miner/scheduler.rs
//! Worker pool and job distribution
//!
//! The [`WorkBoard`] holds the single current job and difficulty; the work
//! source writes it and every worker reads it. The [`WorkerPool`] owns the
//! worker threads, assigns each a disjoint nonce range and aggregates their
//! hash counts.

use crate::miner::algorithm::Algorithm;
use crate::miner::difficulty::DifficultyContext;
use crate::miner::job::{HEADER_LEN, Job};
use crate::miner::worker::{MiningWorker, WorkerCounters, WorkerEvent};
use crate::utils::error::MinerError;
use arc_swap::{ArcSwap, ArcSwapOption};
use crossbeam_channel::Sender;
use std::ops::Range;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::JoinHandle;

/// Number of nonces owned by each worker
pub const NONCE_RANGE_SIZE: u64 = 0x100_0000;

/// Nonce range owned by worker `worker_id`: `[i·R, (i+1)·R)`
pub fn nonce_range(worker_id: usize) -> Range<u64> {
    let start = worker_id as u64 * NONCE_RANGE_SIZE;
    start..start + NONCE_RANGE_SIZE
}

/// A published job with its precomputed header template
#[derive(Debug)]
pub struct ActiveJob {
    /// Publication counter; a change means "new job"
    pub generation: u64,
    /// The job itself
    pub job: Job,
    /// Header with zero nonce
    pub header: [u8; HEADER_LEN],
}

/// Current job and difficulty, single writer and many readers
#[derive(Debug)]
pub struct WorkBoard {
    job: ArcSwapOption<ActiveJob>,
    difficulty: ArcSwap<DifficultyContext>,
    generation: AtomicU64,
}

impl WorkBoard {
    /// Creates an empty board at difficulty 1
    pub fn new() -> Self {
        WorkBoard {
            job: ArcSwapOption::empty(),
            difficulty: ArcSwap::from_pointee(DifficultyContext::default()),
            generation: AtomicU64::new(0),
        }
    }

    /// Replaces the current job wholesale
    ///
    /// # Returns
    /// The generation number assigned to the job
    pub fn publish_job(&self, job: Job) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let header = job.header_template();
        self.job.store(Some(Arc::new(ActiveJob {
            generation,
            job,
            header,
        })));
        generation
    }

    /// Drops the current job; workers go idle
    pub fn clear_job(&self) {
        self.job.store(None);
    }

    /// Current job, if any
    pub fn current_job(&self) -> Option<Arc<ActiveJob>> {
        self.job.load_full()
    }

    /// Identifier of the current job, if any
    pub fn current_job_id(&self) -> Option<String> {
        self.job.load().as_ref().map(|active| active.job.job_id.clone())
    }

    /// Generation of the current job, if any
    pub fn current_generation(&self) -> Option<u64> {
        self.job.load().as_ref().map(|active| active.generation)
    }

    /// Replaces the share difficulty
    pub fn set_difficulty(&self, difficulty: DifficultyContext) {
        self.difficulty.store(Arc::new(difficulty));
    }

    /// Current share difficulty
    pub fn difficulty(&self) -> DifficultyContext {
        **self.difficulty.load()
    }
}

impl Default for WorkBoard {
    fn default() -> Self {
        WorkBoard::new()
    }
}

struct WorkerHandle {
    range: Range<u64>,
    counters: WorkerCounters,
    thread: Option<JoinHandle<()>>,
}

/// Owns all mining workers and fans jobs out to them
pub struct WorkerPool {
    board: Arc<WorkBoard>,
    algorithm: Arc<dyn Algorithm>,
    events: Option<Sender<WorkerEvent>>,
    thread_count: usize,
    intensity: f64,
    active: Arc<AtomicBool>,
    hashes: Arc<AtomicU64>,
    workers: Vec<WorkerHandle>,
}

impl WorkerPool {
    /// Creates a pool of `thread_count` workers (not yet running)
    ///
    /// # Arguments
    /// * `thread_count` - Number of workers
    /// * `intensity` - Duty cycle handed to every worker
    /// * `algorithm` - Hash function shared by all workers
    /// * `board` - Shared current job and difficulty
    /// * `events` - Channel for shares and faults
    pub fn new(
        thread_count: usize,
        intensity: f64,
        algorithm: Arc<dyn Algorithm>,
        board: Arc<WorkBoard>,
        events: Sender<WorkerEvent>,
    ) -> Self {
        let workers = (0..thread_count)
            .map(|id| WorkerHandle {
                range: nonce_range(id),
                counters: WorkerCounters::default(),
                thread: None,
            })
            .collect();

        WorkerPool {
            board,
            algorithm,
            events: Some(events),
            thread_count,
            intensity,
            active: Arc::new(AtomicBool::new(false)),
            hashes: Arc::new(AtomicU64::new(0)),
            workers,
        }
    }

    /// Spawns one OS thread per worker
    ///
    /// # Errors
    /// Returns `MinerError` if the pool was already stopped or a thread
    /// cannot be spawned; already spawned threads are stopped again.
    pub fn start(&mut self) -> Result<(), MinerError> {
        let events = self
            .events
            .clone()
            .ok_or_else(|| MinerError::ChannelError("Worker pool already stopped".into()))?;

        self.active.store(true, Ordering::Release);
        for (id, handle) in self.workers.iter_mut().enumerate() {
            let counters = WorkerCounters {
                pool_hashes: self.hashes.clone(),
                ..handle.counters.clone()
            };
            let worker = MiningWorker::new(
                id,
                handle.range.clone(),
                self.algorithm.clone(),
                self.board.clone(),
                events.clone(),
                counters,
                self.intensity,
            );
            let active = self.active.clone();

            let spawned = std::thread::Builder::new()
                .name(format!("miner-{}", id))
                .spawn(move || worker.run(active));
            match spawned {
                Ok(thread) => handle.thread = Some(thread),
                Err(e) => {
                    self.stop();
                    return Err(e.into());
                }
            }
        }

        log::info!("Started {} mining workers", self.thread_count);
        Ok(())
    }

    /// Publishes a new job to every worker
    ///
    /// Workers pick it up on their next step and restart at their range start.
    pub fn set_job(&self, job: Job) {
        log::info!("New job {} (clean={})", job.job_id, job.clean_jobs);
        self.board.publish_job(job);
    }

    /// Number of workers in the pool
    pub fn worker_count(&self) -> usize {
        self.thread_count
    }

    /// Nonce ranges, one per worker in id order
    pub fn ranges(&self) -> Vec<Range<u64>> {
        self.workers.iter().map(|w| w.range.clone()).collect()
    }

    /// Current nonce cursor of each worker
    pub fn cursors(&self) -> Vec<u32> {
        self.workers
            .iter()
            .map(|w| w.counters.cursor.load(Ordering::Relaxed))
            .collect()
    }

    /// Hash count of each worker
    pub fn worker_hashes(&self) -> Vec<u64> {
        self.workers
            .iter()
            .map(|w| w.counters.hashes.load(Ordering::Relaxed))
            .collect()
    }

    /// Total hashes across all workers
    pub fn total_hashes(&self) -> u64 {
        self.hashes.load(Ordering::Relaxed)
    }

    /// Shared pool-wide hash counter
    pub fn hash_counter(&self) -> Arc<AtomicU64> {
        self.hashes.clone()
    }

    /// Whether worker threads are running
    pub fn is_running(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Stops and joins every worker
    ///
    /// Once this returns no worker emits further events or hash counts, and
    /// the pool's own event sender has been dropped.
    pub fn stop(&mut self) {
        self.active.store(false, Ordering::Release);
        for (id, handle) in self.workers.iter_mut().enumerate() {
            if let Some(thread) = handle.thread.take() {
                if thread.join().is_err() {
                    log::error!("Worker {} panicked", id);
                }
            }
        }
        self.events = None;
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::miner::job::tests::sample_job;
    use crate::miner::worker::tests::FixedHash;
    use crossbeam_channel::unbounded;
    use std::time::{Duration, Instant};

    fn pool(threads: usize) -> (WorkerPool, crossbeam_channel::Receiver<WorkerEvent>) {
        let (tx, rx) = unbounded();
        let pool = WorkerPool::new(
            threads,
            1.0,
            Arc::new(FixedHash([0xff; 32])),
            Arc::new(WorkBoard::new()),
            tx,
        );
        (pool, rx)
    }

    #[test]
    fn test_ranges_partition_prefix_for_all_thread_counts() {
        for threads in 1..=64usize {
            let (pool, _rx) = pool(threads);
            let ranges = pool.ranges();
            assert_eq!(ranges.len(), threads);

            let mut expected_start = 0u64;
            for range in &ranges {
                assert_eq!(range.start, expected_start);
                assert_eq!(range.end - range.start, NONCE_RANGE_SIZE);
                expected_start = range.end;
            }
            assert_eq!(expected_start, threads as u64 * NONCE_RANGE_SIZE);
        }
    }

    #[test]
    fn test_four_worker_ranges() {
        let (pool, _rx) = pool(4);
        assert_eq!(
            pool.ranges(),
            vec![
                0..0x100_0000,
                0x100_0000..0x200_0000,
                0x200_0000..0x300_0000,
                0x300_0000..0x400_0000
            ]
        );
        assert_eq!(pool.cursors(), vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_board_generation_increases() {
        let board = WorkBoard::new();
        assert!(board.current_job().is_none());
        let g1 = board.publish_job(sample_job("a"));
        let g2 = board.publish_job(sample_job("a"));
        assert!(g2 > g1);
        assert_eq!(board.current_job_id().as_deref(), Some("a"));
        board.clear_job();
        assert!(board.current_job_id().is_none());
    }

    #[test]
    fn test_running_pool_hashes_and_stops_cleanly() {
        let (mut pool, rx) = pool(2);
        pool.set_job(sample_job("run"));
        pool.start().unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while pool.total_hashes() < 10 && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        pool.stop();
        assert!(!pool.is_running());

        let after_stop = pool.total_hashes();
        assert!(after_stop >= 10);
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(pool.total_hashes(), after_stop);
        assert_eq!(pool.worker_hashes().iter().sum::<u64>(), after_stop);

        // Non-qualifying hashes never produce events; the channel is closed
        assert!(rx.try_recv().is_err());
        assert!(rx.recv().is_err());
        assert!(pool.start().is_err());
    }
}
