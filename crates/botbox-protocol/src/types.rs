//! Wire types for the Botbox agent protocol.
//!
//! Every message an agent and the game server exchange is one of the two
//! types here. Both the `actions` and `state`/`view` payloads are kept as
//! opaque [`serde_json::Value`] — the game logic on the server side owns
//! their shape, the protocol layer just forwards them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Agent → server: the action the agent is taking this turn.
///
/// A bare string by design — the game logic parses it, so a malformed
/// or nonsensical action is the game's problem to penalize, not the
/// protocol's problem to reject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientMessage {
    pub action: String,
}

/// Server → agent: this player's turn.
///
/// `actions` is whatever the game considers valid moves for this player
/// right now (e.g. a list of legal actions); `state` is this player's
/// view of the board. Both are opaque JSON — only the concrete
/// `MatchLogic` implementation knows their shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerMessage {
    pub player: usize,
    pub actions: Value,
    pub state: Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_message_round_trip() {
        let msg = ClientMessage {
            action: "up".into(),
        };
        let bytes = serde_json::to_vec(&msg).unwrap();
        let decoded: ClientMessage = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(msg, decoded);
    }

    #[test]
    fn test_client_message_json_shape() {
        let msg = ClientMessage {
            action: "left".into(),
        };
        let json: Value = serde_json::to_value(&msg).unwrap();
        assert_eq!(json, serde_json::json!({ "action": "left" }));
    }

    #[test]
    fn test_server_message_round_trip() {
        let msg = ServerMessage {
            player: 1,
            actions: serde_json::json!(["up", "down", "left", "right"]),
            state: serde_json::json!({ "board": [[0, 0], [0, 1]] }),
        };
        let bytes = serde_json::to_vec(&msg).unwrap();
        let decoded: ServerMessage = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(msg, decoded);
    }

    #[test]
    fn test_server_message_json_shape() {
        let msg = ServerMessage {
            player: 0,
            actions: Value::Null,
            state: Value::Null,
        };
        let json: Value = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["player"], 0);
        assert!(json["actions"].is_null());
        assert!(json["state"].is_null());
    }

    #[test]
    fn test_decode_garbage_returns_error() {
        let garbage = b"not json at all";
        let result: Result<ClientMessage, _> = serde_json::from_slice(garbage);
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_missing_action_field_returns_error() {
        let json = r#"{"notaction": "up"}"#;
        let result: Result<ClientMessage, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }
}
