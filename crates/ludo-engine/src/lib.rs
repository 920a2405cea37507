//! Authoritative Ludo rules engine.
//!
//! This crate knows nothing about networking. It models the board, decides
//! which moves are legal, applies them, and tells the caller whose turn it is
//! next. Everything here is deterministic: dice values always come from the
//! caller.
//!
//! # Layers
//!
//! ```text
//! BoardState (positions)  →  RulesEngine (pure rules)  →  LocalGame (turn phases + events)
//! ```
//!
//! - [`BoardState`]: up to 16 token positions for 2-4 players, in each
//!   player's own relative frame. See [`coords`] for the mapping onto the
//!   shared 52-tile loop.
//! - [`RulesEngine`]: move validation, eviction, turn transitions and win
//!   detection over a `BoardState`.
//! - [`LocalGame`]: the roll → move state machine, emitting [`GameEvent`]s
//!   for presentation layers.

pub mod coords;

mod board;
mod encoding;
mod error;
mod game;
mod rules;

pub use board::{
    BASE, BoardState, Color, FINISHED, HOME_STRETCH_START, LAST_MAIN_LOOP_STEP,
    MAIN_LOOP_LEN, MAX_PLAYERS, MIN_PLAYERS, TOKEN_SLOTS, TOKENS_PER_PLAYER,
};
pub use encoding::ENCODED_LEN;
pub use error::{BoardError, GameError, MoveError, RuleViolation};
pub use game::{GameEvent, LocalGame, MoveSummary, RollSummary, TurnPhase};
pub use rules::{
    BlockadePolicy, DEFAULT_BLOCKADE_POLICY, MAX_CONSECUTIVE_SIXES, MovePlan,
    MoveReport, MoveResult, RuleConfig, RulesEngine,
};
