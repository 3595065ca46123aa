//! Line-delimited TCP transport
//!
//! The [`Transport`] trait abstracts message I/O so the pool client can run
//! over TCP or, in tests, over in-memory channels.

use crate::network::messages::JsonRpcMessage;
use crate::utils::error::MinerError;
use async_trait::async_trait;
use std::fmt;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use url::Url;

/// Host and port of a pool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolEndpoint {
    /// Hostname or IP address
    pub host: String,
    /// TCP port
    pub port: u16,
}

impl PoolEndpoint {
    /// Creates an endpoint from its parts
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        PoolEndpoint {
            host: host.into(),
            port,
        }
    }

    /// Parses `stratum+tcp://host:port`, `tcp://host:port` or `host:port`
    pub fn parse(address: &str) -> Result<Self, MinerError> {
        let address = address.trim();
        let with_scheme = if address.contains("://") {
            address.to_string()
        } else {
            format!("stratum+tcp://{}", address)
        };
        let url = Url::parse(&with_scheme)?;
        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| MinerError::ConfigError(format!("Pool address '{}' has no host", address)))?;
        let port = url
            .port()
            .ok_or_else(|| MinerError::ConfigError(format!("Pool address '{}' has no port", address)))?;
        Ok(PoolEndpoint::new(host, port))
    }
}

impl fmt::Display for PoolEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Message-level I/O for the pool protocol
#[async_trait]
pub trait Transport: Send {
    /// Reads one complete message
    ///
    /// Returns `Ok(None)` on a clean close. A `ProtocolError` means one
    /// malformed line was consumed; the connection is still usable.
    async fn read_message(&mut self) -> Result<Option<JsonRpcMessage>, MinerError>;

    /// Writes one message followed by a newline
    async fn write_message(&mut self, msg: &JsonRpcMessage) -> Result<(), MinerError>;
}

/// Buffered TCP connection to a pool
pub struct Connection {
    reader: BufReader<OwnedReadHalf>,
    writer: BufWriter<OwnedWriteHalf>,
    line: String,
}

impl Connection {
    /// Wraps an established stream
    pub fn new(stream: TcpStream) -> Self {
        let (read_half, write_half) = stream.into_split();
        Connection {
            reader: BufReader::new(read_half),
            writer: BufWriter::new(write_half),
            line: String::with_capacity(4096),
        }
    }

    /// Opens a TCP connection to `endpoint`
    ///
    /// The caller bounds this with its own timeout.
    pub async fn connect(endpoint: &PoolEndpoint) -> Result<Self, MinerError> {
        log::debug!("Connecting to pool {}", endpoint);
        let stream = TcpStream::connect((endpoint.host.as_str(), endpoint.port))
            .await
            .map_err(|e| MinerError::ConnectionError(format!("{}: {}", endpoint, e)))?;
        stream.set_nodelay(true)?;
        Ok(Connection::new(stream))
    }
}

#[async_trait]
impl Transport for Connection {
    async fn read_message(&mut self) -> Result<Option<JsonRpcMessage>, MinerError> {
        loop {
            self.line.clear();
            let n = self.reader.read_line(&mut self.line).await?;
            if n == 0 {
                return Ok(None);
            }

            let line = self.line.trim();
            if line.is_empty() {
                continue;
            }
            log::trace!("<- {}", line);

            return serde_json::from_str(line).map(Some).map_err(|e| {
                MinerError::ProtocolError(format!("unparseable frame '{}': {}", line, e))
            });
        }
    }

    async fn write_message(&mut self, msg: &JsonRpcMessage) -> Result<(), MinerError> {
        let json = serde_json::to_string(msg)?;
        log::trace!("-> {}", json);
        self.writer.write_all(json.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;
        Ok(())
    }
}

/// Channel-backed transport for tests
///
/// The transport is the client's side, the handle is the test's side.
#[cfg(test)]
pub(crate) struct MockTransport {
    rx: tokio::sync::mpsc::UnboundedReceiver<JsonRpcMessage>,
    tx: tokio::sync::mpsc::UnboundedSender<JsonRpcMessage>,
}

#[cfg(test)]
pub(crate) struct MockTransportHandle {
    tx: tokio::sync::mpsc::UnboundedSender<JsonRpcMessage>,
    rx: tokio::sync::mpsc::UnboundedReceiver<JsonRpcMessage>,
}

#[cfg(test)]
impl MockTransport {
    pub(crate) fn pair() -> (Self, MockTransportHandle) {
        let (client_tx, handle_rx) = tokio::sync::mpsc::unbounded_channel();
        let (handle_tx, client_rx) = tokio::sync::mpsc::unbounded_channel();
        (
            MockTransport {
                rx: client_rx,
                tx: client_tx,
            },
            MockTransportHandle {
                tx: handle_tx,
                rx: handle_rx,
            },
        )
    }
}

#[cfg(test)]
#[async_trait]
impl Transport for MockTransport {
    async fn read_message(&mut self) -> Result<Option<JsonRpcMessage>, MinerError> {
        Ok(self.rx.recv().await)
    }

    async fn write_message(&mut self, msg: &JsonRpcMessage) -> Result<(), MinerError> {
        self.tx
            .send(msg.clone())
            .map_err(|_| MinerError::ConnectionError("mock transport closed".into()))
    }
}

#[cfg(test)]
impl MockTransportHandle {
    pub(crate) fn send(&self, msg: JsonRpcMessage) {
        self.tx.send(msg).expect("transport dropped");
    }

    pub(crate) async fn recv(&mut self) -> JsonRpcMessage {
        self.rx.recv().await.expect("transport dropped")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::net::TcpListener;

    #[test]
    fn test_endpoint_parse_forms() {
        assert_eq!(
            PoolEndpoint::parse("stratum+tcp://litecoinpool.org:3333").unwrap(),
            PoolEndpoint::new("litecoinpool.org", 3333)
        );
        assert_eq!(
            PoolEndpoint::parse("127.0.0.1:4000").unwrap(),
            PoolEndpoint::new("127.0.0.1", 4000)
        );
        assert!(PoolEndpoint::parse("pool.example.com").is_err());
        assert_eq!(PoolEndpoint::new("a", 1).to_string(), "a:1");
    }

    #[tokio::test]
    async fn test_connection_skips_blank_lines_and_reports_bad_frames() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            socket
                .write_all(b"\n{not json}\n{\"id\":null,\"method\":\"mining.set_difficulty\",\"params\":[4]}\n")
                .await
                .unwrap();
            let mut reader = BufReader::new(socket);
            let mut line = String::new();
            reader.read_line(&mut line).await.unwrap();
            line
        });

        let endpoint = PoolEndpoint::new("127.0.0.1", addr.port());
        let mut conn = Connection::connect(&endpoint).await.unwrap();

        assert!(matches!(
            conn.read_message().await,
            Err(MinerError::ProtocolError(_))
        ));
        let msg = conn.read_message().await.unwrap().unwrap();
        assert_eq!(msg.method(), Some("mining.set_difficulty"));

        conn.write_message(&JsonRpcMessage::request(1, "mining.subscribe", json!([])))
            .await
            .unwrap();
        let written = server.await.unwrap();
        assert_eq!(written, "{\"id\":1,\"method\":\"mining.subscribe\",\"params\":[]}\n");
    }
}
