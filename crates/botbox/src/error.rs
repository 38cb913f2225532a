//! Unified error type for the Botbox HTTP service, and its mapping onto
//! the response taxonomy: malformed requests and corrupt archives are
//! the caller's fault (400), everything else that prevents a match from
//! running is ours (500).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use botbox_sandbox::{RequestError, SandboxError};
use botbox_session::SessionError;

/// Top-level error that wraps every sub-crate error the `/start`
/// handler can encounter. The `#[from]` attribute on each variant
/// auto-generates a `From` impl, so `?` converts sub-crate errors
/// automatically.
#[derive(Debug, thiserror::Error)]
pub enum BotboxError {
    /// The request body itself is malformed: missing fields, bad
    /// archive format, mismatched id/client counts.
    #[error(transparent)]
    Request(#[from] RequestError),

    /// Setting up, running, or tearing down a match's containers
    /// failed.
    #[error(transparent)]
    Sandbox(#[from] SandboxError),

    /// The secret generator could not source entropy. Fatal: nothing
    /// about this request can be retried until the host recovers.
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl IntoResponse for BotboxError {
    fn into_response(self) -> Response {
        let status = match &self {
            BotboxError::Request(_) => StatusCode::BAD_REQUEST,
            BotboxError::Sandbox(_) => StatusCode::INTERNAL_SERVER_ERROR,
            BotboxError::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}
