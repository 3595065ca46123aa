// src/network/pool.rs

//! Mining pool client implementation
//!
//! Speaks the line-delimited subscribe/authorize/notify/submit protocol over
//! TCP. Owns the reconnection policy: the first failed connect of a session
//! falls back to the [`SimulatedPool`], later disconnects reconnect after a
//! fixed delay until shutdown.
use crate::miner::{Job, Share};
use crate::network::connection::{Connection, PoolEndpoint, Transport};
use crate::network::messages::{
    self, AUTHORIZE, JsonRpcMessage, NOTIFY, SET_DIFFICULTY, SUBMIT, SUBSCRIBE, Subscription,
};
use crate::network::simulated::{SimulatedPool, SimulationSettings};
use crate::utils::error::MinerError;
use serde::Serialize;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;

/// Client identifier sent with `mining.subscribe`
pub const USER_AGENT: &str = concat!("scrypt_miner-rs/", env!("CARGO_PKG_VERSION"));

/// Protocol state of the pool connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PoolState {
    /// No connection
    Disconnected,
    /// TCP connect in progress
    Connecting,
    /// TCP connected, subscribe sent
    Connected,
    /// Subscribe acknowledged, authorize sent
    Subscribed,
    /// Credentials accepted, waiting for work
    Authorized,
    /// Receiving jobs
    Mining,
}

impl fmt::Display for PoolState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PoolState::Disconnected => "disconnected",
            PoolState::Connecting => "connecting",
            PoolState::Connected => "connected",
            PoolState::Subscribed => "subscribed",
            PoolState::Authorized => "authorized",
            PoolState::Mining => "mining",
        };
        f.write_str(name)
    }
}

/// Events from a work source to the engine
#[derive(Debug, Clone)]
pub enum WorkEvent {
    /// Protocol state changed
    StateChanged(PoolState),
    /// New current job
    NewJob(Job),
    /// New share difficulty (already clamped to at least 1)
    DifficultyChanged(f64),
    /// Share credited
    ShareAccepted {
        /// Job the share was for
        job_id: String,
    },
    /// Share refused
    ShareRejected {
        /// Job the share was for
        job_id: String,
        /// Reason reported by the pool
        reason: String,
    },
    /// Share dropped because its job is no longer current
    ShareStale {
        /// Job the share was for
        job_id: String,
    },
    /// The pool was unreachable; simulated work follows
    SimulationStarted,
}

/// Connection policy for the pool client
#[derive(Debug, Clone, PartialEq)]
pub struct PoolSettings {
    /// Upper bound on a connect attempt, and again on the handshake up to
    /// authorization
    pub connect_timeout: Duration,
    /// Pause between reconnect attempts
    pub reconnect_delay: Duration,
    /// Behaviour of the fallback pool
    pub simulation: SimulationSettings,
}

impl Default for PoolSettings {
    fn default() -> Self {
        PoolSettings {
            connect_timeout: Duration::from_secs(10),
            reconnect_delay: Duration::from_secs(5),
            simulation: SimulationSettings::default(),
        }
    }
}

/// Login credentials for the pool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolCredentials {
    /// Worker username (usually `wallet.worker`)
    pub username: String,
    /// Worker password (often "x")
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Pending {
    Subscribe,
    Authorize,
    Submit { job_id: String },
}

/// Client for communicating with a mining pool
pub struct PoolClient {
    endpoint: PoolEndpoint,
    credentials: PoolCredentials,
    settings: PoolSettings,
    events: UnboundedSender<WorkEvent>,
    shares: UnboundedReceiver<Share>,
    shutdown: CancellationToken,
    state: PoolState,
    next_id: u64,
    pending: HashMap<u64, Pending>,
    subscription: Subscription,
    current_job_id: Option<String>,
    established: bool,
}

impl PoolClient {
    /// Creates a new PoolClient instance
    ///
    /// # Arguments
    /// * `endpoint` - Pool host and port
    /// * `credentials` - Username and password for `mining.authorize`
    /// * `settings` - Timeouts and fallback behaviour
    /// * `events` - Channel for jobs, difficulty and share verdicts
    /// * `shares` - Channel of shares to submit
    /// * `shutdown` - Cancels the client and any fallback
    pub fn new(
        endpoint: PoolEndpoint,
        credentials: PoolCredentials,
        settings: PoolSettings,
        events: UnboundedSender<WorkEvent>,
        shares: UnboundedReceiver<Share>,
        shutdown: CancellationToken,
    ) -> Self {
        PoolClient {
            endpoint,
            credentials,
            settings,
            events,
            shares,
            shutdown,
            state: PoolState::Disconnected,
            next_id: 1,
            pending: HashMap::new(),
            subscription: Subscription::default(),
            current_job_id: None,
            established: false,
        }
    }

    /// Current protocol state
    pub fn state(&self) -> PoolState {
        self.state
    }

    /// Runs the client until shutdown
    ///
    /// Until a session has been authorized once, any failed attempt (connect
    /// error, timeout, closed socket, refused subscribe or authorize) hands
    /// over to the simulated pool.
    ///
    /// # Errors
    /// Only errors from the simulated fallback are returned; connection and
    /// protocol failures are handled by reconnecting.
    pub async fn run(mut self) -> Result<(), MinerError> {
        while !self.shutdown.is_cancelled() {
            self.set_state(PoolState::Connecting);
            let attempt = tokio::select! {
                _ = self.shutdown.cancelled() => break,
                attempt = tokio::time::timeout(
                    self.settings.connect_timeout,
                    Connection::connect(&self.endpoint),
                ) => attempt,
            };

            let failure = match attempt {
                Ok(Ok(conn)) => {
                    self.set_state(PoolState::Connected);
                    log::info!("Connected to pool {}", self.endpoint);
                    match self.run_with_transport(conn).await {
                        Ok(()) => None,
                        Err(e) => Some(e.to_string()),
                    }
                }
                Ok(Err(e)) => Some(e.to_string()),
                Err(_) => Some(format!(
                    "connect to {} timed out after {:?}",
                    self.endpoint, self.settings.connect_timeout
                )),
            };
            self.set_state(PoolState::Disconnected);

            if self.shutdown.is_cancelled() {
                break;
            }
            let reason = failure.unwrap_or_else(|| "session closed".to_string());

            if !self.established {
                log::warn!(
                    "Pool {} unreachable ({}), falling back to simulated pool",
                    self.endpoint,
                    reason
                );
                let simulated = SimulatedPool::new(self.settings.simulation.clone());
                return simulated
                    .run(&mut self.shares, &self.events, &self.shutdown)
                    .await;
            }

            log::warn!(
                "Pool connection lost ({}), reconnecting in {:?}",
                reason,
                self.settings.reconnect_delay
            );
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.settings.reconnect_delay) => {}
            }
        }

        self.set_state(PoolState::Disconnected);
        Ok(())
    }

    /// Runs one session over an established transport
    ///
    /// Sends subscribe, then processes frames and share submissions until the
    /// connection drops, authorization fails or shutdown is requested.
    pub(crate) async fn run_with_transport(
        &mut self,
        mut conn: impl Transport,
    ) -> Result<(), MinerError> {
        self.pending.clear();
        self.current_job_id = None;
        self.subscription = Subscription::default();
        self.discard_queued_shares();

        self.send_request(&mut conn, SUBSCRIBE, json!([USER_AGENT]), Pending::Subscribe)
            .await?;

        let handshake_deadline = tokio::time::Instant::now() + self.settings.connect_timeout;
        loop {
            let handshaking = !matches!(self.state, PoolState::Authorized | PoolState::Mining);
            tokio::select! {
                _ = tokio::time::sleep_until(handshake_deadline), if handshaking => {
                    return Err(MinerError::ConnectionError(format!(
                        "handshake with {} timed out after {:?}",
                        self.endpoint, self.settings.connect_timeout
                    )));
                }
                msg = conn.read_message() => {
                    match msg {
                        Ok(Some(msg)) => self.handle_message(&mut conn, msg).await?,
                        Ok(None) => {
                            return Err(MinerError::ConnectionError("Connection closed by pool".into()));
                        }
                        Err(MinerError::ProtocolError(e)) => {
                            log::warn!("Dropping malformed frame: {}", e);
                        }
                        Err(e) => return Err(e),
                    }
                }
                share = self.shares.recv() => {
                    match share {
                        Some(share) => self.submit(&mut conn, share).await?,
                        None => {
                            // Share sender gone: the engine is stopping
                            self.shutdown.cancel();
                            return Ok(());
                        }
                    }
                }
                _ = self.shutdown.cancelled() => return Ok(()),
            }
        }
    }

    async fn handle_message(
        &mut self,
        conn: &mut impl Transport,
        msg: JsonRpcMessage,
    ) -> Result<(), MinerError> {
        match msg {
            JsonRpcMessage::Response { id, result, error } => {
                self.handle_response(conn, id, result, error).await
            }
            JsonRpcMessage::Request { method, params, .. } => {
                self.handle_notification(&method, &params);
                Ok(())
            }
        }
    }

    fn handle_notification(&mut self, method: &str, params: &Value) {
        match method {
            NOTIFY => match messages::parse_notify(params, &self.subscription.coinbase_extra()) {
                Ok(job) => {
                    log::info!("Pool job {} (clean={})", job.job_id, job.clean_jobs);
                    if self.current_job_id.is_none() {
                        // Anything still queued was mined on an earlier session's work
                        self.discard_queued_shares();
                    }
                    self.current_job_id = Some(job.job_id.clone());
                    self.emit(WorkEvent::NewJob(job));
                    if self.state == PoolState::Authorized {
                        self.set_state(PoolState::Mining);
                    }
                }
                Err(e) => log::warn!("Dropping mining.notify: {}", e),
            },
            SET_DIFFICULTY => match messages::parse_difficulty(params) {
                Ok(difficulty) => {
                    log::info!("Pool difficulty {}", difficulty);
                    self.emit(WorkEvent::DifficultyChanged(difficulty));
                }
                Err(e) => log::warn!("Dropping mining.set_difficulty: {}", e),
            },
            other => log::debug!("Ignoring pool method {}", other),
        }
    }

    async fn handle_response(
        &mut self,
        conn: &mut impl Transport,
        id: u64,
        result: Option<Value>,
        error: Option<Value>,
    ) -> Result<(), MinerError> {
        let Some(pending) = self.pending.remove(&id) else {
            log::debug!("Unmatched response id {}", id);
            return Ok(());
        };
        let error = error.filter(|e| !e.is_null());

        match pending {
            Pending::Subscribe => {
                if let Some(error) = error {
                    return Err(MinerError::ProtocolError(format!(
                        "subscribe refused: {}",
                        messages::error_reason(&error)
                    )));
                }
                self.subscription = result
                    .as_ref()
                    .map(Subscription::from_result)
                    .transpose()
                    .unwrap_or_else(|e| {
                        log::warn!("Unusable subscribe result: {}", e);
                        None
                    })
                    .unwrap_or_default();
                self.set_state(PoolState::Subscribed);

                let params = json!([self.credentials.username, self.credentials.password]);
                self.send_request(conn, AUTHORIZE, params, Pending::Authorize)
                    .await
            }
            Pending::Authorize => {
                if result == Some(Value::Bool(true)) {
                    log::info!("Authorized as {}", self.credentials.username);
                    self.established = true;
                    self.set_state(PoolState::Authorized);
                    if self.current_job_id.is_some() {
                        self.set_state(PoolState::Mining);
                    }
                    Ok(())
                } else {
                    let reason = error
                        .map(|e| messages::error_reason(&e))
                        .unwrap_or_else(|| "refused".to_string());
                    Err(MinerError::ConnectionError(format!(
                        "Authorization rejected: {}",
                        reason
                    )))
                }
            }
            Pending::Submit { job_id } => {
                if result == Some(Value::Bool(true)) {
                    log::info!("Share accepted for job {}", job_id);
                    self.emit(WorkEvent::ShareAccepted { job_id });
                } else {
                    let reason = error
                        .map(|e| messages::error_reason(&e))
                        .unwrap_or_else(|| "rejected".to_string());
                    log::warn!("Share rejected for job {}: {}", job_id, reason);
                    self.emit(WorkEvent::ShareRejected { job_id, reason });
                }
                Ok(())
            }
        }
    }

    async fn submit(&mut self, conn: &mut impl Transport, share: Share) -> Result<(), MinerError> {
        let current = self.current_job_id.as_deref() == Some(share.job_id.as_str());
        let authorized = matches!(self.state, PoolState::Authorized | PoolState::Mining);
        if !current || !authorized {
            log::debug!("Dropping stale share for job {}", share.job_id);
            self.emit(WorkEvent::ShareStale {
                job_id: share.job_id,
            });
            return Ok(());
        }

        log::debug!(
            "Submitting share for job {} nonce {:08x}",
            share.job_id,
            share.nonce
        );
        let params = messages::submit_params(&self.credentials.username, &share);
        self.send_request(
            conn,
            SUBMIT,
            params,
            Pending::Submit {
                job_id: share.job_id,
            },
        )
        .await
    }

    fn discard_queued_shares(&mut self) {
        while let Ok(share) = self.shares.try_recv() {
            log::debug!("Dropping share for job {} from a previous session", share.job_id);
            self.emit(WorkEvent::ShareStale {
                job_id: share.job_id,
            });
        }
    }

    async fn send_request(
        &mut self,
        conn: &mut impl Transport,
        method: &str,
        params: Value,
        pending: Pending,
    ) -> Result<(), MinerError> {
        let id = self.next_id;
        self.next_id += 1;
        self.pending.insert(id, pending);
        conn.write_message(&JsonRpcMessage::request(id, method, params))
            .await
    }

    fn set_state(&mut self, state: PoolState) {
        if self.state != state {
            log::info!("Pool state {} -> {}", self.state, state);
            self.state = state;
            self.emit(WorkEvent::StateChanged(state));
        }
    }

    fn emit(&self, event: WorkEvent) {
        if self.events.send(event).is_err() {
            log::debug!("Pool event dropped: engine receiver closed");
        }
    }
}
