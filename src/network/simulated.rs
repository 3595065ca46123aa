//! Simulated pool used when the configured pool is unreachable
//!
//! Fabricates a pseudo-random job on a fixed interval and accepts submitted
//! shares with a fixed probability. Everything it produces is flagged as
//! test-mode activity by the engine; none of it is real income.

use crate::miner::{Job, Share};
use crate::network::pool::WorkEvent;
use crate::utils::error::MinerError;
use rand::Rng;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;

/// Tunables for the simulated pool
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationSettings {
    /// Time between fabricated jobs
    pub job_interval: Duration,
    /// Probability that a submitted share is accepted
    pub accept_rate: f64,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        SimulationSettings {
            job_interval: Duration::from_secs(30),
            accept_rate: 0.9,
        }
    }
}

/// Verdict on a submitted share
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitVerdict {
    /// Credited
    Accepted,
    /// Refused, with a reason
    Rejected(String),
    /// Computed against a superseded job; dropped without a verdict
    Stale,
}

/// Local stand-in for a pool
#[derive(Debug)]
pub struct SimulatedPool {
    settings: SimulationSettings,
    sequence: u64,
    current_job_id: Option<String>,
}

impl SimulatedPool {
    /// Creates a simulated pool with no job yet
    pub fn new(settings: SimulationSettings) -> Self {
        SimulatedPool {
            settings,
            sequence: 0,
            current_job_id: None,
        }
    }

    /// Identifier of the last fabricated job
    pub fn current_job_id(&self) -> Option<&str> {
        self.current_job_id.as_deref()
    }

    /// Fabricates the next job and makes it current
    pub fn next_job(&mut self) -> Job {
        let mut rng = rand::rng();
        self.sequence += 1;
        let job_id = format!("sim-{:04x}", self.sequence);

        let branch_len = rng.random_range(0..4);
        let merkle_branch = (0..branch_len).map(|_| rng.random::<[u8; 32]>()).collect();
        let ntime = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as u32)
            .unwrap_or_default();

        self.current_job_id = Some(job_id.clone());
        Job {
            job_id,
            prev_hash: rng.random(),
            coinbase1: rng.random::<[u8; 32]>().to_vec(),
            coinbase2: rng.random::<[u8; 16]>().to_vec(),
            coinbase_extra: rng.random::<[u8; 8]>().to_vec(),
            merkle_branch,
            version: 0x2000_0000,
            nbits: 0x1e0f_fff0,
            ntime,
            clean_jobs: true,
        }
    }

    /// Decides the fate of a submitted share
    pub fn handle_submit(&mut self, share: &Share) -> SubmitVerdict {
        if self.current_job_id.as_deref() != Some(share.job_id.as_str()) {
            return SubmitVerdict::Stale;
        }
        let accept_rate = self.settings.accept_rate.clamp(0.0, 1.0);
        if rand::rng().random_bool(accept_rate) {
            SubmitVerdict::Accepted
        } else {
            SubmitVerdict::Rejected("Simulated rejection".to_string())
        }
    }

    /// Serves jobs and share verdicts until shutdown or the share channel closes
    ///
    /// The first job is published immediately.
    pub async fn run(
        mut self,
        shares: &mut UnboundedReceiver<Share>,
        events: &UnboundedSender<WorkEvent>,
        shutdown: &CancellationToken,
    ) -> Result<(), MinerError> {
        log::warn!(
            "Running against simulated pool: new job every {:?}, {:.0}% acceptance",
            self.settings.job_interval,
            self.settings.accept_rate * 100.0
        );
        let emit = |event: WorkEvent| {
            if events.send(event).is_err() {
                log::debug!("Simulated pool event dropped: engine receiver closed");
            }
        };
        emit(WorkEvent::SimulationStarted);

        let mut ticker = tokio::time::interval(self.settings.job_interval);
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    let job = self.next_job();
                    log::info!("Simulated job {}", job.job_id);
                    emit(WorkEvent::NewJob(job));
                }
                share = shares.recv() => {
                    let Some(share) = share else { break };
                    let job_id = share.job_id.clone();
                    match self.handle_submit(&share) {
                        SubmitVerdict::Accepted => {
                            log::info!("Simulated pool accepted share for job {}", job_id);
                            emit(WorkEvent::ShareAccepted { job_id });
                        }
                        SubmitVerdict::Rejected(reason) => {
                            log::info!("Simulated pool rejected share for job {}: {}", job_id, reason);
                            emit(WorkEvent::ShareRejected { job_id, reason });
                        }
                        SubmitVerdict::Stale => {
                            log::debug!("Simulated pool dropped stale share for job {}", job_id);
                            emit(WorkEvent::ShareStale { job_id });
                        }
                    }
                }
            }
        }

        log::info!("Simulated pool stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::unbounded_channel;

    fn share_for(job_id: &str) -> Share {
        Share {
            worker_id: 0,
            job_id: job_id.to_string(),
            generation: 1,
            nonce: 7,
            hash: [0u8; 32],
            ntime: 0,
        }
    }

    #[test]
    fn test_jobs_are_fresh_and_current() {
        let mut pool = SimulatedPool::new(SimulationSettings::default());
        assert!(pool.current_job_id().is_none());

        let first = pool.next_job();
        let second = pool.next_job();
        assert_ne!(first.job_id, second.job_id);
        assert_eq!(pool.current_job_id(), Some(second.job_id.as_str()));
        assert!(second.clean_jobs);
        assert!(second.merkle_branch.len() < 4);
    }

    #[test]
    fn test_stale_share_gets_no_verdict() {
        let mut pool = SimulatedPool::new(SimulationSettings::default());
        let old = pool.next_job();
        pool.next_job();
        assert_eq!(pool.handle_submit(&share_for(&old.job_id)), SubmitVerdict::Stale);
    }

    #[test]
    fn test_acceptance_rate_extremes() {
        let mut always = SimulatedPool::new(SimulationSettings {
            accept_rate: 1.0,
            ..SimulationSettings::default()
        });
        let job = always.next_job();
        for _ in 0..50 {
            assert_eq!(always.handle_submit(&share_for(&job.job_id)), SubmitVerdict::Accepted);
        }

        let mut never = SimulatedPool::new(SimulationSettings {
            accept_rate: 0.0,
            ..SimulationSettings::default()
        });
        let job = never.next_job();
        assert!(matches!(
            never.handle_submit(&share_for(&job.job_id)),
            SubmitVerdict::Rejected(_)
        ));
    }

    #[test]
    fn test_acceptance_rate_is_roughly_ninety_percent() {
        let mut pool = SimulatedPool::new(SimulationSettings::default());
        let job = pool.next_job();
        let accepted = (0..2000)
            .filter(|_| pool.handle_submit(&share_for(&job.job_id)) == SubmitVerdict::Accepted)
            .count();
        assert!((1650..=1950).contains(&accepted), "accepted {}", accepted);
    }

    #[tokio::test]
    async fn test_run_publishes_job_immediately_and_answers_shares() {
        let (share_tx, mut share_rx) = unbounded_channel();
        let (event_tx, mut event_rx) = unbounded_channel();
        let shutdown = CancellationToken::new();
        let pool = SimulatedPool::new(SimulationSettings {
            job_interval: Duration::from_secs(3600),
            accept_rate: 1.0,
        });

        let token = shutdown.clone();
        let task =
            tokio::spawn(async move { pool.run(&mut share_rx, &event_tx, &token).await });

        assert!(matches!(event_rx.recv().await, Some(WorkEvent::SimulationStarted)));
        let job = match event_rx.recv().await {
            Some(WorkEvent::NewJob(job)) => job,
            other => panic!("expected job, got {:?}", other),
        };

        share_tx.send(share_for(&job.job_id)).unwrap();
        assert!(matches!(
            event_rx.recv().await,
            Some(WorkEvent::ShareAccepted { job_id }) if job_id == job.job_id
        ));

        share_tx.send(share_for("gone")).unwrap();
        assert!(matches!(event_rx.recv().await, Some(WorkEvent::ShareStale { .. })));

        shutdown.cancel();
        task.await.unwrap().unwrap();
    }
}
