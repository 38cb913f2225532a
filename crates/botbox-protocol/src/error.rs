/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The message is well-formed JSON but invalid at the protocol level.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
