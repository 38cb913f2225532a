//! Error types for the synchronized game runtime.

/// Errors that can occur while running a match.
#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    /// A connecting agent's `Authorization` header was missing, unrecognized,
    /// or already consumed. Only that connection is affected.
    #[error("secret rejected for connecting agent: {0}")]
    InvalidSecret(#[from] botbox_session::SessionError),

    /// An agent did not complete registration within the connection timeout.
    /// The whole match is aborted and its sandbox torn down; the HTTP
    /// response is still a 200 per the error taxonomy (no `result.log`).
    #[error("agent {0} did not connect before the registration deadline")]
    ConnectionTimeout(String),

    /// A connected agent's send or receive failed outright (closed socket,
    /// I/O error). Logged as a disconnect; that turn's action is empty.
    #[error("client {0} error: {1}")]
    ClientError(String, String),

    /// Appending to a log file failed.
    #[error("recorder I/O failure: {0}")]
    RecorderIo(#[from] std::io::Error),

    /// A wire message failed to decode as JSON.
    #[error("protocol error: {0}")]
    Protocol(#[from] botbox_protocol::ProtocolError),
}
