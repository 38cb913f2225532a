/// Errors that can occur while issuing or validating match secrets.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The OS random number generator is unavailable. Fatal — a match
    /// cannot start without being able to issue secrets.
    #[error("entropy source unavailable: {0}")]
    EntropyUnavailable(String),

    /// The secret presented by a connecting agent is missing, unrecognized,
    /// or was already consumed by a previous connection. Only that one
    /// connection is rejected; registration of other agents continues.
    #[error("invalid or already-used secret")]
    InvalidSecret,
}
