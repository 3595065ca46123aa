//! Connectivity probe
//!
//! A bare TCP connect with a fixed timeout; no protocol traffic is sent.

use crate::types::OperationResult;
use std::time::Duration;
use tokio::net::TcpStream;

/// Timeout for a single probe
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Checks whether `host:port` accepts TCP connections
///
/// # Returns
/// `success: true` with "Connection successful" if the connect completes
/// within [`PROBE_TIMEOUT`], otherwise `success: false` with the reason.
pub async fn test_connection(host: &str, port: u16) -> OperationResult {
    test_connection_within(host, port, PROBE_TIMEOUT).await
}

/// [`test_connection`] with an explicit timeout
pub async fn test_connection_within(host: &str, port: u16, limit: Duration) -> OperationResult {
    log::info!("Testing connection to {}:{}", host, port);
    match tokio::time::timeout(limit, TcpStream::connect((host, port))).await {
        Ok(Ok(_stream)) => OperationResult::ok("Connection successful"),
        Ok(Err(e)) => {
            log::warn!("Connection to {}:{} failed: {}", host, port, e);
            OperationResult::failed(format!("Connection failed: {}", e))
        }
        Err(_) => {
            log::warn!("Connection to {}:{} timed out", host, port);
            OperationResult::failed("Connection timeout")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_probe_reaches_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let result = test_connection("127.0.0.1", port).await;
        assert!(result.success);
        assert_eq!(result.message, "Connection successful");
    }

    #[tokio::test]
    async fn test_probe_reports_refused_port() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };
        let result = test_connection_within("127.0.0.1", port, Duration::from_secs(2)).await;
        assert!(!result.success);
        assert!(result.message.starts_with("Connection"));
    }
}
