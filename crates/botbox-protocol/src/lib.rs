//! Wire protocol for the Botbox agent connection.
//!
//! The protocol is intentionally thin compared to a general-purpose game
//! framework's: there is no room management, no heartbeat, no handshake
//! message — authentication happens once at the websocket upgrade
//! (see `botbox-transport`), and every message after that is either a
//! [`ClientMessage`] (agent's move) or a [`ServerMessage`] (this turn's
//! view). This crate only knows how to encode and decode those two
//! shapes.

mod codec;
mod error;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use types::{ClientMessage, ServerMessage};
