//! Authenticates incoming connections against a match's one-time secret
//! table and turns each into a [`GameClient`] the state manager can play
//! against.
//!
//! Validation happens before a connection is ever counted as
//! registered — a connection whose secret is missing or already
//! consumed is closed immediately and never reaches the state manager,
//! and never blocks another agent's registration.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::mpsc;

use botbox_protocol::{Codec, ClientMessage, JsonCodec, ServerMessage};
use botbox_session::SecretTable;
use botbox_transport::Connection;

use crate::connection::IncomingConnection;
use crate::watchdog::{Guarded, Watchdog};
use crate::MatchError;

/// A transport-level failure surfaced by a client's reader or writer task.
#[derive(Debug, Clone)]
pub struct ClientError {
    pub message: String,
}

/// A registered agent, fully wired for the state manager to play
/// against: a channel to publish turns on, a channel to collect moves
/// from, an error channel fed by the reader/writer tasks, and its own
/// watchdog.
#[derive(Debug)]
pub struct GameClient {
    pub id: String,
    pub tx: mpsc::Sender<ServerMessage>,
    pub rx: mpsc::Receiver<ClientMessage>,
    pub err_rx: mpsc::Receiver<ClientError>,
    pub watchdog: Watchdog,
}

/// Spawns the reader/writer tasks for one authenticated connection and
/// returns the [`GameClient`] handle that owns their channels.
fn wire_client<C>(id: String, conn: C, move_timeout: Duration) -> GameClient
where
    C: Connection + 'static,
{
    let conn = std::sync::Arc::new(conn);
    let codec = JsonCodec;
    let (out_tx, mut out_rx) = mpsc::channel::<ServerMessage>(1);
    let (in_tx, in_rx) = mpsc::channel::<ClientMessage>(1);
    let (err_tx, err_rx) = mpsc::channel::<ClientError>(4);

    let writer_conn = conn.clone();
    let writer_err_tx = err_tx.clone();
    tokio::spawn(async move {
        while let Some(msg) = out_rx.recv().await {
            let encoded = match codec.encode(&msg) {
                Ok(bytes) => bytes,
                Err(err) => {
                    let _ = writer_err_tx
                        .send(ClientError {
                            message: err.to_string(),
                        })
                        .await;
                    continue;
                }
            };
            if let Err(err) = writer_conn.send(&encoded).await {
                let _ = writer_err_tx
                    .send(ClientError {
                        message: err.to_string(),
                    })
                    .await;
                break;
            }
        }
    });

    let reader_conn = conn;
    let reader_err_tx = err_tx;
    tokio::spawn(async move {
        loop {
            match reader_conn.recv().await {
                Ok(Some(bytes)) => match codec.decode::<ClientMessage>(&bytes) {
                    Ok(msg) => {
                        if in_tx.send(msg).await.is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        let _ = reader_err_tx
                            .send(ClientError {
                                message: err.to_string(),
                            })
                            .await;
                    }
                },
                Ok(None) => {
                    let _ = reader_err_tx
                        .send(ClientError {
                            message: "connection closed".to_string(),
                        })
                        .await;
                    break;
                }
                Err(err) => {
                    let _ = reader_err_tx
                        .send(ClientError {
                            message: err.to_string(),
                        })
                        .await;
                    break;
                }
            }
        }
    });

    GameClient {
        id,
        tx: out_tx,
        rx: in_rx,
        err_rx,
        watchdog: Watchdog::new(move_timeout),
    }
}

/// Drives the registration phase: authenticates each incoming connection
/// against `secrets`, and returns once every expected id has registered
/// or `conn_timeout` elapses first.
pub async fn run_client_manager<C>(
    mut incoming: mpsc::Receiver<IncomingConnection<C>>,
    mut secrets: SecretTable,
    expected_ids: Vec<String>,
    conn_timeout: Duration,
    move_timeout: Duration,
) -> Result<HashMap<String, GameClient>, MatchError>
where
    C: Connection + 'static,
{
    let mut clients = HashMap::with_capacity(expected_ids.len());
    let mut registration = Watchdog::new(conn_timeout);

    while clients.len() < expected_ids.len() {
        let next = incoming.recv();
        match registration.guard(next).await {
            Guarded::Completed(Some(incoming_conn)) => {
                let Some(header) = incoming_conn.auth_header else {
                    tracing::warn!("connection rejected: no Authorization header");
                    let _ = incoming_conn.conn.close().await;
                    continue;
                };
                match secrets.authenticate(&header) {
                    Ok(id) => {
                        tracing::info!(%id, "agent registered");
                        let client = wire_client(id.clone(), incoming_conn.conn, move_timeout);
                        clients.insert(id, client);
                    }
                    Err(err) => {
                        tracing::warn!(%err, "connection rejected: invalid secret");
                        let _ = incoming_conn.conn.close().await;
                    }
                }
            }
            Guarded::Completed(None) => {
                return Err(MatchError::ConnectionTimeout(
                    "connection manager closed before all agents registered".to_string(),
                ));
            }
            Guarded::Fired => {
                let missing: Vec<_> = expected_ids
                    .iter()
                    .filter(|id| !clients.contains_key(*id))
                    .cloned()
                    .collect();
                return Err(MatchError::ConnectionTimeout(missing.join(", ")));
            }
        }
    }

    Ok(clients)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::run_connection_manager;
    use botbox_transport::WebSocketTransport;
    use futures_util::SinkExt;
    use tokio_tungstenite::tungstenite::handshake::client::generate_key;
    use tokio_tungstenite::tungstenite::http::Request;
    use tokio_tungstenite::tungstenite::Message;

    async fn connect_with_secret(
        addr: std::net::SocketAddr,
        secret: Option<&str>,
    ) -> tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    > {
        let mut builder = Request::builder()
            .uri(format!("ws://{addr}/"))
            .header("Host", addr.to_string())
            .header("Connection", "Upgrade")
            .header("Upgrade", "websocket")
            .header("Sec-WebSocket-Version", "13")
            .header("Sec-WebSocket-Key", generate_key());
        if let Some(secret) = secret {
            builder = builder.header("Authorization", secret);
        }
        let request = builder.body(()).unwrap();
        let (stream, _) = tokio_tungstenite::connect_async(request).await.unwrap();
        stream
    }

    #[tokio::test]
    async fn test_registration_succeeds_with_valid_secret() {
        let transport = WebSocketTransport::bind("127.0.0.1:0").await.unwrap();
        let addr = transport.local_addr().unwrap();
        let (tx, rx) = mpsc::channel(4);
        tokio::spawn(run_connection_manager(transport, tx));

        let ids = vec!["agent-0".to_string()];
        let (secrets, issued) = SecretTable::issue(&ids).unwrap();
        let secret = issued.get("agent-0").unwrap().as_str().to_string();

        let manager = tokio::spawn(run_client_manager(
            rx,
            secrets,
            ids,
            Duration::from_secs(2),
            Duration::from_secs(2),
        ));

        let _client = connect_with_secret(addr, Some(&secret)).await;

        let clients = manager.await.unwrap().unwrap();
        assert!(clients.contains_key("agent-0"));
    }

    #[tokio::test]
    async fn test_invalid_secret_is_rejected_without_blocking_others() {
        let transport = WebSocketTransport::bind("127.0.0.1:0").await.unwrap();
        let addr = transport.local_addr().unwrap();
        let (tx, rx) = mpsc::channel(4);
        tokio::spawn(run_connection_manager(transport, tx));

        let ids = vec!["agent-0".to_string()];
        let (secrets, issued) = SecretTable::issue(&ids).unwrap();
        let good_secret = issued.get("agent-0").unwrap().as_str().to_string();

        let manager = tokio::spawn(run_client_manager(
            rx,
            secrets,
            ids,
            Duration::from_secs(2),
            Duration::from_secs(2),
        ));

        let mut bad = connect_with_secret(addr, Some("not-a-real-secret")).await;
        let _ = bad.send(Message::text("ignored")).await;
        let _good = connect_with_secret(addr, Some(&good_secret)).await;

        let clients = manager.await.unwrap().unwrap();
        assert_eq!(clients.len(), 1);
        assert!(clients.contains_key("agent-0"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_connection_timeout_reports_missing_ids() {
        let transport = WebSocketTransport::bind("127.0.0.1:0").await.unwrap();
        let (tx, rx) = mpsc::channel(4);
        tokio::spawn(run_connection_manager(transport, tx));

        let ids = vec!["agent-0".to_string(), "agent-1".to_string()];
        let (secrets, _issued) = SecretTable::issue(&ids).unwrap();

        let result = run_client_manager(
            rx,
            secrets,
            ids,
            Duration::from_millis(10),
            Duration::from_secs(2),
        )
        .await;

        match result {
            Err(MatchError::ConnectionTimeout(missing)) => {
                assert!(missing.contains("agent-0"));
                assert!(missing.contains("agent-1"));
            }
            other => panic!("expected ConnectionTimeout, got {other:?}"),
        }
    }
}
