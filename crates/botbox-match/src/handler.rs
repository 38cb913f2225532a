//! Composes the connection manager, client manager, state manager, and
//! recorder behind one factory function — the match's single ownership
//! root. No collaborator reaches back into another; everything flows
//! downward from here.

use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::mpsc;

use botbox_session::SecretTable;
use botbox_transport::Transport;

use crate::client_manager::run_client_manager;
use crate::connection::run_connection_manager;
use crate::logic::{MatchLogic, Outcome};
use crate::recorder::GameRecorder;
use crate::state_manager::run_state_manager;
use crate::{MatchError, TurnError};

/// Deadlines the handler enforces. Distinct from `botbox`'s top-level
/// `Config` — only the two timeouts the match runtime itself needs.
#[derive(Debug, Clone, Copy)]
pub struct HandlerTimeouts {
    pub conn_timeout: Duration,
    pub move_timeout: Duration,
}

impl Default for HandlerTimeouts {
    fn default() -> Self {
        Self {
            conn_timeout: Duration::from_secs(10),
            move_timeout: Duration::from_secs(10),
        }
    }
}

/// Runs one match end to end: accept connections, authenticate every
/// expected agent, play turns until the game finishes, record the
/// result. Returns the per-player outcome, or a [`MatchError`] if
/// registration never completed.
///
/// `transport` is consumed for the lifetime of the registration phase
/// only — once every expected id has registered, the connection manager
/// task is left running (harmless; it simply has nowhere to forward
/// further connections since the channel's other end is dropped).
///
/// `errors` receives every `SendTimeout`/`ReceiveTimeout` raised while
/// the turn loop runs; the caller decides whether to log, count, or
/// otherwise act on them. A match is never aborted by one.
pub async fn run_match<T, G>(
    transport: T,
    game: G,
    ids: Vec<String>,
    secrets: SecretTable,
    timeouts: HandlerTimeouts,
    log_dir: impl Into<PathBuf>,
    errors: mpsc::Sender<TurnError>,
) -> Result<Vec<Outcome>, MatchError>
where
    T: Transport,
    G: MatchLogic,
{
    let recorder = GameRecorder::new(log_dir);
    let (tx, rx) = mpsc::channel(ids.len().max(1));

    tokio::spawn(run_connection_manager(transport, tx));

    let mut clients = run_client_manager(
        rx,
        secrets,
        ids.clone(),
        timeouts.conn_timeout,
        timeouts.move_timeout,
    )
    .await?;

    for id in &ids {
        recorder.record_connect(id).await.ok();
    }

    // `run_state_manager` expects player-index order; expected ids
    // define that order, not the order agents happened to connect in.
    let ordered: Vec<_> = ids
        .iter()
        .map(|id| {
            clients
                .remove(id)
                .expect("every expected id registered or run_client_manager would have errored")
        })
        .collect();

    let result = run_state_manager(game, ordered, &recorder, errors).await;
    Ok(result)
}
