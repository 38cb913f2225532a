//! Accepts websocket connections and forwards each to the registration
//! pipeline, holding it open until the match tells it to tear down.

use tokio::sync::mpsc;

use botbox_transport::{Connection, Transport};

/// A newly-accepted connection, handed off to the client manager.
///
/// Carries the raw `Authorization` header captured at the websocket
/// handshake — the client manager, not the connection manager, decides
/// whether it authenticates an agent.
pub struct IncomingConnection<C> {
    pub auth_header: Option<String>,
    pub conn: C,
}

/// Accepts connections from `transport` and forwards each one to
/// `registrations` until the transport is told to shut down.
///
/// Runs as its own task for the lifetime of the match's registration
/// phase. Accept failures are logged and do not stop the loop — a
/// malformed handshake from one client must not block the others.
pub async fn run_connection_manager<T>(
    mut transport: T,
    registrations: mpsc::Sender<IncomingConnection<T::Connection>>,
) where
    T: Transport,
{
    tracing::info!("connection manager accepting websocket connections");

    loop {
        match transport.accept().await {
            Ok(conn) => {
                let auth_header = conn.auth_header().map(str::to_string);
                let incoming = IncomingConnection { auth_header, conn };
                if registrations.send(incoming).await.is_err() {
                    tracing::debug!("registration pipeline closed, connection manager stopping");
                    break;
                }
            }
            Err(err) => {
                tracing::warn!(%err, "failed to accept a connection, continuing");
            }
        }
    }
}
