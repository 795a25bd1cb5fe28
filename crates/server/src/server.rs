//! TCP server for the room relay
//!
//! Accepts connections, validates inbound lines and forwards them to the
//! coordinator task. Each connection has its own writer task fed by an
//! unbounded channel, so a slow client never stalls the coordinator.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use blockfall_core::types::{DEFAULT_ROOM_LIMIT, PIECE_BATCH_SIZE};

use crate::protocol::{
    create_invalid, create_welcome, parse_message, ConnectionId, ProtocolError, ServerMessage,
};
use crate::registry::RoomRegistry;
use crate::runtime::{run_coordinator, Coordinator, InboundEvent, InboundPayload};

/// Default cap on one inbound line, newline excluded
pub const DEFAULT_MAX_LINE_BYTES: usize = 64 * 1024;

const EVENT_QUEUE_DEPTH: usize = 1024;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub room_limit: usize,
    pub piece_batch: usize,
    pub max_line_bytes: usize,
    /// Fixed seed for piece generation; entropy when absent
    pub seed: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            room_limit: DEFAULT_ROOM_LIMIT,
            piece_batch: PIECE_BATCH_SIZE,
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
            seed: None,
        }
    }
}

impl ServerConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        use std::env;

        fn parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
            env::var(key).ok().and_then(|s| s.trim().parse().ok())
        }

        let defaults = Self::default();
        Self {
            host: env::var("BLOCKFALL_HOST").unwrap_or(defaults.host),
            port: parsed("BLOCKFALL_PORT").unwrap_or(defaults.port),
            room_limit: parsed("BLOCKFALL_ROOM_LIMIT").unwrap_or(defaults.room_limit),
            piece_batch: parsed("BLOCKFALL_PIECE_BATCH").unwrap_or(defaults.piece_batch),
            max_line_bytes: parsed("BLOCKFALL_MAX_LINE_BYTES").unwrap_or(defaults.max_line_bytes),
            seed: parsed("BLOCKFALL_SEED"),
        }
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }

    fn registry(&self) -> RoomRegistry {
        match self.seed {
            Some(seed) => RoomRegistry::with_seed(seed, self.room_limit, self.piece_batch),
            None => RoomRegistry::new(self.room_limit, self.piece_batch),
        }
    }
}

/// Start the TCP server
///
/// The bound address is sent on `ready_tx` once the listener is up, which
/// lets callers bind port 0.
pub async fn run_server(
    config: ServerConfig,
    ready_tx: Option<oneshot::Sender<SocketAddr>>,
) -> anyhow::Result<()> {
    let addr = config.socket_addr()?;
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    let bound = listener.local_addr()?;
    info!(addr = %bound, "room server listening");
    if let Some(tx) = ready_tx {
        let _ = tx.send(bound);
    }

    let (event_tx, event_rx) = mpsc::channel::<InboundEvent>(EVENT_QUEUE_DEPTH);
    tokio::spawn(run_coordinator(Coordinator::new(config.registry()), event_rx));

    let mut connection_counter: ConnectionId = 0;

    // Accept incoming connections
    loop {
        let (socket, peer) = listener.accept().await?;
        connection_counter += 1;
        let connection_id = connection_counter;
        info!(conn = connection_id, peer = %peer, "client connected");

        let event_tx = event_tx.clone();
        let max_line_bytes = config.max_line_bytes;
        tokio::spawn(async move {
            if let Err(e) = handle_client(socket, connection_id, &event_tx, max_line_bytes).await {
                warn!(conn = connection_id, error = %e, "client error");
            }
            let _ = event_tx
                .send(InboundEvent {
                    connection_id,
                    payload: InboundPayload::Disconnected,
                })
                .await;
            info!(conn = connection_id, "client disconnected");
        });
    }
}

/// Handle a single client connection until it closes
async fn handle_client(
    socket: TcpStream,
    connection_id: ConnectionId,
    event_tx: &mpsc::Sender<InboundEvent>,
    max_line_bytes: usize,
) -> anyhow::Result<()> {
    let (reader, mut writer) = tokio::io::split(socket);
    let mut reader = BufReader::new(reader);

    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
    let _ = tx.send(create_welcome(connection_id));

    // Writer task; ends once the coordinator drops this connection's sender
    tokio::spawn(async move {
        let mut buf: Vec<u8> = Vec::with_capacity(4096);
        while let Some(msg) = rx.recv().await {
            buf.clear();
            if serde_json::to_writer(&mut buf, &msg).is_err() {
                continue;
            }
            buf.push(b'\n');
            if writer.write_all(&buf).await.is_err() {
                break;
            }
            if writer.flush().await.is_err() {
                break;
            }
        }
    });

    event_tx
        .send(InboundEvent {
            connection_id,
            payload: InboundPayload::Connected(tx.clone()),
        })
        .await
        .context("coordinator stopped")?;

    let limit = max_line_bytes as u64 + 1;
    let mut line: Vec<u8> = Vec::new();

    loop {
        line.clear();
        let bytes_read = match (&mut reader).take(limit).read_until(b'\n', &mut line).await {
            Ok(n) => n,
            Err(e) => break Err(e.into()),
        };

        if bytes_read == 0 {
            // Client disconnected
            break Ok(());
        }

        if line.len() > max_line_bytes && line.last() != Some(&b'\n') {
            let err = ProtocolError::TooLong(max_line_bytes);
            warn!(conn = connection_id, error = %err, "rejected line");
            let _ = tx.send(create_invalid(&err));
            if let Err(e) = discard_rest_of_line(&mut reader).await {
                break Err(e);
            }
            continue;
        }

        let text = match std::str::from_utf8(&line) {
            Ok(text) => text,
            Err(e) => {
                let err = ProtocolError::InvalidUtf8(e);
                warn!(conn = connection_id, error = %err, "rejected line");
                let _ = tx.send(create_invalid(&err));
                continue;
            }
        };

        let trimmed = text.trim();
        if trimmed.is_empty() {
            continue;
        }

        match parse_message(trimmed) {
            Ok(msg) => {
                debug!(conn = connection_id, room = msg.room_id(), "message received");
                if event_tx
                    .send(InboundEvent {
                        connection_id,
                        payload: InboundPayload::Message(msg),
                    })
                    .await
                    .is_err()
                {
                    break Err(anyhow::anyhow!("coordinator stopped"));
                }
            }
            Err(err) => {
                warn!(conn = connection_id, error = %err, "rejected line");
                let _ = tx.send(create_invalid(&err));
            }
        }
    }
}

async fn discard_rest_of_line<R>(reader: &mut R) -> anyhow::Result<()>
where
    R: tokio::io::AsyncBufRead + Unpin,
{
    loop {
        let (consumed, found) = {
            let buf = reader.fill_buf().await?;
            if buf.is_empty() {
                return Ok(());
            }
            match buf.iter().position(|&b| b == b'\n') {
                Some(pos) => (pos + 1, true),
                None => (buf.len(), false),
            }
        };
        reader.consume(consumed);
        if found {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.room_limit, 4);
        assert_eq!(config.piece_batch, 100);
        assert_eq!(
            config.socket_addr().unwrap(),
            "127.0.0.1:8080".parse::<SocketAddr>().unwrap()
        );
    }

    #[test]
    fn test_bad_host_is_an_error() {
        let config = ServerConfig {
            host: "not a host".to_string(),
            ..ServerConfig::default()
        };
        assert!(config.socket_addr().is_err());
    }
}
