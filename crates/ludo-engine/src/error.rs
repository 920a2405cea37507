//! Error types for the engine.
//!
//! Two very different things can go wrong when a player tries to move:
//!
//! - **Rule violations** ([`RuleViolation`]): the move is well-formed but
//!   the rules forbid it (needs a six, overshoots home, ...). These are
//!   expected during normal play and are reported as outcome codes.
//! - **Programmer errors**: a token index outside the active slots or a
//!   dice value outside 1-6. These never happen with a correct caller.
//!
//! [`MoveError`] carries both so `?` works, and
//! [`MoveError::rule_violation`] tells them apart.

use serde::{Deserialize, Serialize};

/// A move the rules forbid.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error,
)]
pub enum RuleViolation {
    /// The token belongs to another player.
    #[error("token does not belong to the current player")]
    NotYourToken,

    /// The token has already reached home.
    #[error("token has already finished")]
    TokenFinished,

    /// A token at BASE can only leave on a six.
    #[error("a six is required to leave base")]
    NeedSixToExit,

    /// A blockade sits on the start tile or on the path.
    #[error("path is blocked by a blockade")]
    BlockedByBlockade,

    /// The move would go past FINISHED.
    #[error("move overshoots home")]
    Overshoot,

    /// None of the current player's tokens can use the rolled value.
    #[error("no valid moves for this roll")]
    NoValidMoves,
}

/// Why `validate_move` / `process_move` refused a move.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    /// The rules forbid this move.
    #[error("move rejected: {0}")]
    Rule(#[from] RuleViolation),

    /// The token index does not name an active slot.
    #[error("token index {token} out of range ({active} active slots)")]
    TokenOutOfRange { token: usize, active: usize },

    /// Dice values are 1 through 6.
    #[error("dice value {0} outside 1-6")]
    InvalidDice(u8),
}

impl MoveError {
    /// Returns the rule violation, or `None` for a programmer error.
    pub fn rule_violation(&self) -> Option<RuleViolation> {
        match self {
            Self::Rule(v) => Some(*v),
            _ => None,
        }
    }
}

/// Errors building or decoding a [`BoardState`](crate::BoardState).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    #[error("player count {0} outside 2-4")]
    InvalidPlayerCount(u8),

    #[error("current player {current} out of range for {player_count} players")]
    InvalidCurrentPlayer { current: u8, player_count: u8 },

    #[error("six streak {0} out of range")]
    InvalidSixStreak(u8),

    #[error("token {token} has invalid position {position}")]
    InvalidPosition { token: usize, position: i8 },

    #[error("inactive token slot {token} is not at base")]
    InactiveSlotInPlay { token: usize },

    #[error("encoded board must be {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Errors from the turn state machine in [`LocalGame`](crate::LocalGame).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    /// The game already has a winner.
    #[error("game is over")]
    GameOver,

    /// A roll is waiting for a move; rolling again is not allowed.
    #[error("a roll is already pending")]
    RollPending,

    /// Moving requires a roll first.
    #[error("no pending roll")]
    NoPendingRoll,

    /// The token index does not name an active slot.
    #[error("token index {token} out of range ({active} active slots)")]
    TokenOutOfRange { token: usize, active: usize },

    #[error("dice value {0} outside 1-6")]
    InvalidDice(u8),
}
