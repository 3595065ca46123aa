use serde_json;
use std::io;
use thiserror::Error;
use url;

/// Main error type for the mining application
///
/// This enum represents all possible error conditions that can occur
/// during mining operations, including configuration, network, protocol,
/// worker and cryptographic errors.
#[derive(Error, Debug)]
pub enum MinerError {
    /// Invalid coin, mode, credentials, thread count or intensity
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Errors related to network connectivity (connect failure or timeout)
    #[error("Network connection error: {0}")]
    ConnectionError(String),

    /// Malformed or unexpected protocol frames
    #[error("Protocol violation: {0}")]
    ProtocolError(String),

    /// Fault inside a worker's header or hash step
    #[error("Worker {worker_id} fault: {message}")]
    WorkerError {
        /// Worker that hit the fault
        worker_id: usize,
        /// Description of the fault
        message: String,
    },

    /// Invalid Scrypt parameters or other cryptographic misuse
    #[error("Cryptographic error: {0}")]
    CryptoError(String),

    /// Standard I/O operation errors
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// URL parsing errors
    #[error("URL parse error: {0}")]
    UrlError(#[from] url::ParseError),

    /// TOML configuration parse errors
    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// Thread communication channel errors
    #[error("Thread communication error: {0}")]
    ChannelError(String),

    /// Invalid user input or parameter errors
    #[error("Invalid input: {0}")]
    InputError(String),

    /// Async task execution errors
    #[error("Task execution error: {0}")]
    TaskError(String),
}

/// Converts hex decoding errors into MinerError
///
/// Used when invalid hex data is encountered in pool notifications
/// or configuration.
impl From<hex::FromHexError> for MinerError {
    fn from(e: hex::FromHexError) -> Self {
        MinerError::InputError(format!("Hex conversion failed: {}", e))
    }
}

/// Converts async task join errors into MinerError
///
/// Used when background tasks (pool client, samplers, worker joins)
/// fail unexpectedly.
impl From<tokio::task::JoinError> for MinerError {
    fn from(e: tokio::task::JoinError) -> Self {
        MinerError::TaskError(format!("Async task failed: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_error_display() {
        let err = MinerError::WorkerError {
            worker_id: 3,
            message: "bad header".into(),
        };
        assert_eq!(err.to_string(), "Worker 3 fault: bad header");
    }

    #[test]
    fn test_hex_error_becomes_input_error() {
        let err: MinerError = hex::decode("zz").unwrap_err().into();
        assert!(matches!(err, MinerError::InputError(_)));
    }
}
