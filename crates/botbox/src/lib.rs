//! # Botbox
//!
//! Match sandbox orchestrator: accepts a `POST /start` request naming a
//! server archive, a set of agent ids, and one client archive per id,
//! then runs the whole match inside Docker containers on an isolated
//! network and tears everything down when it's done.
//!
//! The synchronized turn protocol the server container speaks lives in
//! `botbox-match`; this crate is strictly the sandbox lifecycle and the
//! HTTP surface in front of it.

mod config;
mod error;
mod server;

pub use config::Config;
pub use error::BotboxError;
pub use server::build_router;
