//! The synchronized game runtime for Botbox matches.
//!
//! A match has exactly one of everything: one connection manager
//! accepting every agent's websocket, one client manager authenticating
//! each against the match's one-time secrets, one state manager running
//! the turn loop, one recorder writing the transcript. [`handler::run_match`]
//! is the single entry point composing all four.

mod client_manager;
mod connection;
mod error;
mod handler;
mod logic;
mod recorder;
mod state_manager;
mod watchdog;

pub use client_manager::{ClientError, GameClient};
pub use connection::IncomingConnection;
pub use error::MatchError;
pub use handler::{run_match, HandlerTimeouts};
pub use logic::{MatchLogic, Outcome};
pub use recorder::GameRecorder;
pub use state_manager::TurnError;
pub use watchdog::{Guarded, Watchdog};
