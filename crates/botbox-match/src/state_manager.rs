//! The synchronized barrier turn loop.
//!
//! Every turn: broadcast each player their legal actions and current
//! view, collect exactly one move per player (in order, under that
//! player's watchdog), commit all of that turn's moves in ascending
//! player-index order, publish the resulting state, repeat until the
//! game reports itself finished. No client ever observes a peer's move
//! before the next broadcast — the state is only mutated between turns,
//! never mid-collection.

use tokio::sync::mpsc;

use botbox_protocol::ServerMessage;

use crate::client_manager::GameClient;
use crate::logic::{MatchLogic, Outcome};
use crate::recorder::GameRecorder;
use crate::watchdog::Guarded;

/// An out-of-band event raised while running the turn loop. Surfaced on
/// a channel the caller supplies, rather than failing the match — a
/// single slow or silent client never aborts play for everyone else.
#[derive(Debug, Clone)]
pub enum TurnError {
    /// The turn broadcast to `client` did not accept delivery before its
    /// watchdog fired.
    SendTimeout { client: String },
    /// `client`'s move did not arrive before its watchdog fired.
    ReceiveTimeout { client: String },
}

/// Runs turns against `clients` until `game.finished()`, recording every
/// turn and the final result through `recorder`. Timeouts and client
/// errors are pushed onto `errors` rather than ending the match.
///
/// `clients` is indexed by player position — `clients[i]` is player
/// `i`'s handle. Order is fixed for the whole match.
pub async fn run_state_manager<G: MatchLogic>(
    mut game: G,
    mut clients: Vec<GameClient>,
    recorder: &GameRecorder,
    errors: mpsc::Sender<TurnError>,
) -> Vec<Outcome> {
    let mut turn: u64 = 0;

    while !game.finished() {
        turn += 1;

        for (i, client) in clients.iter_mut().enumerate() {
            let actions = game.actions(i);
            let view = game.view(i);
            let message = ServerMessage {
                player: i,
                actions,
                state: view,
            };

            let send_fut = client.tx.send(message);
            match client.watchdog.guard(send_fut).await {
                Guarded::Completed(Ok(())) => {}
                Guarded::Completed(Err(err)) => {
                    tracing::warn!(id = %client.id, %err, "failed to queue turn broadcast");
                }
                Guarded::Fired => {
                    tracing::debug!(id = %client.id, "turn broadcast timed out");
                    let _ = errors
                        .send(TurnError::SendTimeout {
                            client: client.id.clone(),
                        })
                        .await;
                }
            }
        }

        let mut moves = vec![String::new(); clients.len()];
        for (i, client) in clients.iter_mut().enumerate() {
            moves[i] = collect_move(client, recorder, &errors).await;
        }

        for (i, action) in moves.into_iter().enumerate() {
            game.do_action(i, &action);
        }

        let state = game.view(0);
        let _ = recorder.record_state(turn, &state).await;
    }

    let result = game.result();
    if let Err(err) = recorder.record_result(&result).await {
        tracing::error!(%err, "failed to record match result");
    }
    tracing::info!(?result, "match finished");
    result
}

/// Outcome of racing a client's move receiver against its error channel.
enum RawMove {
    Message(Option<botbox_protocol::ClientMessage>),
    Error(Option<crate::client_manager::ClientError>),
}

/// Waits for one player's move, subject to their watchdog deadline.
///
/// A fired watchdog, a closed receiver, or a reported client error all
/// resolve to an empty action — the player's turn is simply skipped,
/// never a hang and never a match-ending error.
async fn collect_move(
    client: &mut GameClient,
    recorder: &GameRecorder,
    errors: &mpsc::Sender<TurnError>,
) -> String {
    let rx = &mut client.rx;
    let err_rx = &mut client.err_rx;
    let raced = async {
        tokio::select! {
            msg = rx.recv() => RawMove::Message(msg),
            err = err_rx.recv() => RawMove::Error(err),
        }
    };

    match client.watchdog.guard(raced).await {
        Guarded::Completed(RawMove::Message(Some(msg))) => msg.action,
        Guarded::Completed(RawMove::Message(None)) => {
            tracing::warn!(id = %client.id, "client channel closed, empty action");
            String::new()
        }
        Guarded::Completed(RawMove::Error(Some(err))) => {
            tracing::warn!(id = %client.id, message = %err.message, "client error, empty action");
            let _ = recorder.record_disconnect(&client.id, &err.message).await;
            String::new()
        }
        Guarded::Completed(RawMove::Error(None)) => String::new(),
        Guarded::Fired => {
            tracing::debug!(id = %client.id, "move timed out, empty action");
            let _ = errors
                .send(TurnError::ReceiveTimeout {
                    client: client.id.clone(),
                })
                .await;
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use botbox_protocol::ClientMessage;
    use serde_json::Value;
    use std::time::Duration;
    use tokio::sync::mpsc;

    struct Countdown {
        remaining: u32,
    }

    impl MatchLogic for Countdown {
        fn actions(&self, _player: usize) -> Value {
            Value::Null
        }

        fn do_action(&mut self, _player: usize, _action: &str) {
            if self.remaining > 0 {
                self.remaining -= 1;
            }
        }

        fn view(&self, _player: usize) -> Value {
            serde_json::json!({ "remaining": self.remaining })
        }

        fn finished(&self) -> bool {
            self.remaining == 0
        }

        fn result(&self) -> Vec<Outcome> {
            vec![Outcome::Tie, Outcome::Tie]
        }
    }

    fn test_client(id: &str) -> (GameClient, mpsc::Sender<ClientMessage>, mpsc::Receiver<ServerMessage>) {
        let (tx, rx) = mpsc::channel(4);
        let (in_tx, in_rx) = mpsc::channel(4);
        let (_err_tx, err_rx) = mpsc::channel(4);
        (
            GameClient {
                id: id.to_string(),
                tx,
                rx: in_rx,
                err_rx,
                watchdog: crate::watchdog::Watchdog::new(Duration::from_millis(50)),
            },
            in_tx,
            rx,
        )
    }

    fn tempdir() -> std::path::PathBuf {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let mut path = std::env::temp_dir();
        path.push(format!(
            "botbox-state-manager-test-{}-{}",
            std::process::id(),
            COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        std::fs::create_dir_all(&path).unwrap();
        path
    }

    #[tokio::test]
    async fn test_turn_loop_runs_to_completion_with_responsive_clients() {
        let dir = tempdir();
        let recorder = GameRecorder::new(&dir);
        let (client0, client0_in, mut client0_out) = test_client("agent-0");
        let (client1, client1_in, mut client1_out) = test_client("agent-1");

        let driver = tokio::spawn(async move {
            for _ in 0..3 {
                client0_out.recv().await.unwrap();
                client0_in
                    .send(ClientMessage {
                        action: "go".to_string(),
                    })
                    .await
                    .unwrap();
                client1_out.recv().await.unwrap();
                client1_in
                    .send(ClientMessage {
                        action: "go".to_string(),
                    })
                    .await
                    .unwrap();
            }
        });

        let (err_tx, _err_rx) = mpsc::channel(8);
        let game = Countdown { remaining: 3 };
        let result = run_state_manager(game, vec![client0, client1], &recorder, err_tx).await;

        driver.await.unwrap();
        assert_eq!(result, vec![Outcome::Tie, Outcome::Tie]);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_missed_deadline_yields_empty_action_not_a_hang() {
        let dir = tempdir();
        let recorder = GameRecorder::new(&dir);
        let (mut client0, _client0_in, mut client0_out) = test_client("agent-0");
        client0.watchdog = crate::watchdog::Watchdog::new(Duration::from_millis(5));

        let drainer = tokio::spawn(async move {
            // Never answers — just drains the broadcast so the channel doesn't block.
            while client0_out.recv().await.is_some() {}
        });

        let (err_tx, mut err_rx) = mpsc::channel(8);
        let game = Countdown { remaining: 1 };
        let result = run_state_manager(game, vec![client0], &recorder, err_tx).await;

        assert!(matches!(
            err_rx.try_recv(),
            Ok(TurnError::ReceiveTimeout { .. })
        ));

        drainer.abort();
        assert_eq!(result, vec![Outcome::Tie, Outcome::Tie]);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
