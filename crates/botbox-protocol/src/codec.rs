//! Codec trait and JSON implementation for wire messages.
//!
//! A codec converts between Rust types and the raw bytes that travel
//! over the websocket connection. The rest of the crate doesn't care
//! how messages are serialized — it just needs something implementing
//! [`Codec`].

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// Encodes and decodes wire messages.
///
/// `Send + Sync + 'static` because codecs are shared across the tasks
/// the match runtime spawns per client.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

/// A [`Codec`] that uses JSON, matching the agent protocol's wire format.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ClientMessage, ServerMessage};

    #[test]
    fn test_json_codec_round_trips_client_message() {
        let codec = JsonCodec;
        let msg = ClientMessage {
            action: "fire".into(),
        };
        let bytes = codec.encode(&msg).unwrap();
        let decoded: ClientMessage = codec.decode(&bytes).unwrap();
        assert_eq!(msg, decoded);
    }

    #[test]
    fn test_json_codec_round_trips_server_message() {
        let codec = JsonCodec;
        let msg = ServerMessage {
            player: 0,
            actions: serde_json::json!(["a", "b"]),
            state: serde_json::json!({ "turn": 3 }),
        };
        let bytes = codec.encode(&msg).unwrap();
        let decoded: ServerMessage = codec.decode(&bytes).unwrap();
        assert_eq!(msg, decoded);
    }

    #[test]
    fn test_json_codec_decode_rejects_garbage() {
        let codec = JsonCodec;
        let result: Result<ClientMessage, _> = codec.decode(b"not json");
        assert!(result.is_err());
    }
}
