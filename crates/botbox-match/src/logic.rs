//! The `MatchLogic` trait — the extension point concrete games implement.
//!
//! Unlike a general-purpose room's `GameLogic`, a match's rules are not
//! trusted to shape the wire protocol themselves: every payload crossing
//! the boundary is an opaque [`serde_json::Value`], and a player's move
//! is a bare string. The state manager never needs to know how a game
//! interprets either; it only needs `finished` to know when to stop and
//! `result` to know what to log.

use serde_json::Value;

/// A single player's outcome when a match concludes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Win,
    Tie,
    Loss,
}

/// The game-specific rules driving one match.
///
/// The state manager calls `actions`/`view` for every player before each
/// turn's broadcast, then `do_action` once per player (in ascending
/// player-index order) after collecting that turn's moves, then checks
/// `finished` to decide whether to keep looping.
pub trait MatchLogic: Send + 'static {
    /// The legal-actions payload sent to `player` before they move.
    /// Opaque to the framework — whatever shape the game wants.
    fn actions(&self, player: usize) -> Value;

    /// Applies `player`'s action to the game state.
    ///
    /// `action` is whatever string the player's client sent, or an empty
    /// string if they missed the deadline or sent something unparsable.
    /// A `MatchLogic` implementation that can't parse `action` should
    /// treat it the same as an empty string — a punitive no-op, not a
    /// panic or an error return.
    fn do_action(&mut self, player: usize, action: &str);

    /// The state snapshot sent to `player` after every turn. May differ
    /// per player (fog of war, hidden information); most games return
    /// the same value for everyone.
    fn view(&self, player: usize) -> Value;

    /// Returns `true` once the match is over. Checked after every turn.
    fn finished(&self) -> bool;

    /// Per-player outcomes, valid only once `finished()` is `true`.
    fn result(&self) -> Vec<Outcome>;
}
