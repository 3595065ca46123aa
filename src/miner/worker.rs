// src/miner/worker.rs
//! Worker thread implementation
//!
//! Each worker owns a disjoint nonce range, follows the current job on the
//! shared [`WorkBoard`], hashes one header per step and reports shares and
//! faults back to the engine.

use crate::miner::algorithm::Algorithm;
use crate::miner::job::{HEADER_LEN, set_nonce};
use crate::miner::scheduler::{ActiveJob, WorkBoard};
use crate::utils::error::MinerError;
use crossbeam_channel::Sender;
use std::ops::Range;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// How long a worker without a job waits before looking again
const IDLE_WAIT: Duration = Duration::from_millis(50);

/// A hash that met the share target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Share {
    /// Worker that found the share
    pub worker_id: usize,
    /// Job the share was computed against
    pub job_id: String,
    /// Board generation of that job; tells apart republished job ids
    pub generation: u64,
    /// Nonce that produced the hash
    pub nonce: u32,
    /// Resulting hash, in hash-function byte order
    pub hash: [u8; 32],
    /// Header time field used
    pub ntime: u32,
}

/// Messages from workers to the engine
#[derive(Debug, Clone)]
pub enum WorkerEvent {
    /// A qualifying share
    Share(Share),
    /// A non-fatal fault in the header or hash step
    Fault {
        /// Worker that hit the fault
        worker_id: usize,
        /// Description of the fault
        message: String,
    },
}

/// Result of a single worker step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// No job is published yet
    Idle,
    /// A hash was computed and did not qualify
    Hashed,
    /// A hash was computed and emitted as a share
    ShareFound,
    /// The hash step failed; the worker resumes on the next step
    Fault,
}

/// Mutable per-worker state, touched only by its own worker
#[derive(Debug, Clone)]
pub struct WorkerState {
    /// Worker index within the pool
    pub worker_id: usize,
    /// Owned nonces, `[start, start + 0x1000000)`
    pub range: Range<u64>,
    /// Next nonce to try
    pub nonce: u32,
    /// Job currently being searched
    pub job: Option<Arc<ActiveJob>>,
}

/// Shared counters a worker feeds
#[derive(Debug, Clone, Default)]
pub struct WorkerCounters {
    /// Pool-wide hash counter
    pub pool_hashes: Arc<AtomicU64>,
    /// This worker's hash counter
    pub hashes: Arc<AtomicU64>,
    /// Published copy of the nonce cursor
    pub cursor: Arc<AtomicU32>,
}

/// Worker that performs mining computations over its own nonce range
pub struct MiningWorker {
    state: WorkerState,
    algorithm: Arc<dyn Algorithm>,
    board: Arc<WorkBoard>,
    events: Sender<WorkerEvent>,
    counters: WorkerCounters,
    intensity: f64,
    header: [u8; HEADER_LEN],
}

impl MiningWorker {
    /// Creates a new worker
    ///
    /// # Arguments
    /// * `worker_id` - Index within the pool
    /// * `range` - Owned nonce range
    /// * `algorithm` - Hash function to use
    /// * `board` - Where the current job and difficulty are published
    /// * `events` - Channel for shares and faults
    /// * `counters` - Hash and cursor counters to feed
    /// * `intensity` - Duty cycle in `[0.1, 1.0]`
    pub fn new(
        worker_id: usize,
        range: Range<u64>,
        algorithm: Arc<dyn Algorithm>,
        board: Arc<WorkBoard>,
        events: Sender<WorkerEvent>,
        counters: WorkerCounters,
        intensity: f64,
    ) -> Self {
        let start = range.start as u32;
        counters.cursor.store(start, Ordering::Relaxed);
        MiningWorker {
            state: WorkerState {
                worker_id,
                range,
                nonce: start,
                job: None,
            },
            algorithm,
            board,
            events,
            counters,
            intensity,
            header: [0u8; HEADER_LEN],
        }
    }

    /// Read-only view of the worker state
    pub fn state(&self) -> &WorkerState {
        &self.state
    }

    /// Performs one search step against the current job
    ///
    /// Picks up a newer job if one was published (resetting the nonce to the
    /// range start), hashes the header for the current nonce, emits a share
    /// if it qualifies and advances the nonce, wrapping at the range end.
    pub fn step(&mut self) -> StepOutcome {
        let Some(current) = self.board.current_job() else {
            return StepOutcome::Idle;
        };
        let stale = self
            .state
            .job
            .as_ref()
            .is_none_or(|job| job.generation != current.generation);
        if stale {
            self.adopt(current);
        }
        let Some(job) = self.state.job.as_ref() else {
            return StepOutcome::Idle;
        };

        let nonce = self.state.nonce;
        set_nonce(&mut self.header, nonce);

        let outcome = match self.algorithm.hash(&self.header) {
            Ok(hash) => {
                self.counters.pool_hashes.fetch_add(1, Ordering::Relaxed);
                self.counters.hashes.fetch_add(1, Ordering::Relaxed);

                if self.board.difficulty().accepts(&hash) {
                    let share = Share {
                        worker_id: self.state.worker_id,
                        job_id: job.job.job_id.clone(),
                        generation: job.generation,
                        nonce,
                        hash,
                        ntime: job.job.ntime,
                    };
                    log::debug!(
                        "Worker {} found share for job {} at nonce {:08x}",
                        share.worker_id,
                        share.job_id,
                        nonce
                    );
                    self.emit(WorkerEvent::Share(share));
                    StepOutcome::ShareFound
                } else {
                    StepOutcome::Hashed
                }
            }
            Err(e) => {
                let fault = MinerError::WorkerError {
                    worker_id: self.state.worker_id,
                    message: e.to_string(),
                };
                log::error!("{}", fault);
                self.emit(WorkerEvent::Fault {
                    worker_id: self.state.worker_id,
                    message: fault.to_string(),
                });
                StepOutcome::Fault
            }
        };

        self.advance();
        outcome
    }

    /// Runs the search loop until `active` is cleared
    pub fn run(mut self, active: Arc<AtomicBool>) {
        log::info!(
            "Worker {} started on nonces {:#010x}..{:#010x} using {}",
            self.state.worker_id,
            self.state.range.start,
            self.state.range.end,
            self.algorithm.name()
        );

        while active.load(Ordering::Acquire) {
            let started = Instant::now();
            match self.step() {
                StepOutcome::Idle => std::thread::sleep(IDLE_WAIT),
                _ => self.throttle(started.elapsed()),
            }
        }

        log::info!("Worker {} stopped", self.state.worker_id);
    }

    fn adopt(&mut self, job: Arc<ActiveJob>) {
        log::debug!(
            "Worker {} switching to job {} (clean={})",
            self.state.worker_id,
            job.job.job_id,
            job.job.clean_jobs
        );
        self.header = job.header;
        self.state.nonce = self.state.range.start as u32;
        self.state.job = Some(job);
        self.counters
            .cursor
            .store(self.state.nonce, Ordering::Relaxed);
    }

    fn advance(&mut self) {
        let next = self.state.nonce as u64 + 1;
        self.state.nonce = if next >= self.state.range.end {
            self.state.range.start as u32
        } else {
            next as u32
        };
        self.counters
            .cursor
            .store(self.state.nonce, Ordering::Relaxed);
    }

    /// Idles for the remainder of the duty cycle set by `intensity`
    fn throttle(&self, busy: Duration) {
        if self.intensity < 1.0 && self.intensity > 0.0 {
            let idle = busy.mul_f64((1.0 - self.intensity) / self.intensity);
            std::thread::sleep(idle);
        }
    }

    fn emit(&self, event: WorkerEvent) {
        if self.events.send(event).is_err() {
            log::debug!(
                "Worker {} event dropped: engine receiver closed",
                self.state.worker_id
            );
        }
    }
}
