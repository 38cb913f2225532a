//! Appends the match transcript to newline-delimited JSON log files.
//!
//! Four files live under one per-match log directory: `state.log` (one
//! entry per published turn), `result.log` (the final outcome, written
//! once), `connect.log`/`disconnect.log` (one entry per registration or
//! drop). Every entry round-trips through the exact shape it was
//! written with — nothing is reformatted on the way out.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;

use crate::logic::Outcome;
use crate::MatchError;

#[derive(Debug, Serialize)]
struct StateEntry<'a> {
    turn: u64,
    state: &'a serde_json::Value,
}

#[derive(Debug, Serialize)]
struct ResultEntry<'a> {
    result: &'a [Outcome],
}

#[derive(Debug, Serialize)]
struct ConnectEntry<'a> {
    id: &'a str,
}

#[derive(Debug, Serialize)]
struct DisconnectEntry<'a> {
    id: &'a str,
    reason: &'a str,
}

/// Appends NDJSON records to a match's four log files under `log_dir`.
pub struct GameRecorder {
    log_dir: PathBuf,
}

impl GameRecorder {
    /// Creates a recorder writing under `log_dir`. The directory must
    /// already exist; the recorder only ever appends to files inside it.
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        Self {
            log_dir: log_dir.into(),
        }
    }

    /// Appends one entry to `state.log` for a committed turn.
    pub async fn record_state(
        &self,
        turn: u64,
        state: &serde_json::Value,
    ) -> Result<(), MatchError> {
        self.append("state.log", &StateEntry { turn, state }).await
    }

    /// Appends the match's final outcome to `result.log`. Called at most
    /// once per match — a missed deadline never reaches here.
    pub async fn record_result(&self, result: &[Outcome]) -> Result<(), MatchError> {
        self.append("result.log", &ResultEntry { result }).await
    }

    /// Appends one entry to `connect.log` when an agent registers.
    pub async fn record_connect(&self, id: &str) -> Result<(), MatchError> {
        self.append("connect.log", &ConnectEntry { id }).await
    }

    /// Appends one entry to `disconnect.log` when an agent's connection
    /// is lost or errors out mid-match.
    pub async fn record_disconnect(&self, id: &str, reason: &str) -> Result<(), MatchError> {
        self.append("disconnect.log", &DisconnectEntry { id, reason })
            .await
    }

    async fn append<T: Serialize>(&self, file_name: &str, entry: &T) -> Result<(), MatchError> {
        let path: &Path = &self.log_dir.join(file_name);
        let mut line = serde_json::to_vec(entry).map_err(botbox_protocol::ProtocolError::Encode)?;
        line.push(b'\n');

        let mut file: File = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;
        file.write_all(&line).await?;
        tracing::debug!(file = file_name, "recorder appended entry");
        Ok(())
    }
}
