//! The board: token positions plus whose turn it is.
//!
//! Positions are stored in each player's *relative* frame, so the same
//! number means the same distance travelled for every colour:
//!
//! ```text
//!  -1        0 ............ 50   51 ... 56   57
//!  BASE      main loop (shared)  home stretch FINISHED
//! ```
//!
//! Slot `t` belongs to seat `t / 4`. Only the first `player_count * 4` slots
//! are active; the rest stay at BASE.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::BoardError;
use crate::coords;

/// Token not yet entered play.
pub const BASE: i8 = -1;
/// Last relative step on the shared loop before turning into the home stretch.
pub const LAST_MAIN_LOOP_STEP: i8 = 50;
/// First home-stretch position.
pub const HOME_STRETCH_START: i8 = 51;
/// Token has completed its path.
pub const FINISHED: i8 = 57;
/// Number of tiles on the shared loop.
pub const MAIN_LOOP_LEN: u8 = 52;

pub const MIN_PLAYERS: u8 = 2;
pub const MAX_PLAYERS: u8 = 4;
pub const TOKENS_PER_PLAYER: usize = 4;
pub const TOKEN_SLOTS: usize = MAX_PLAYERS as usize * TOKENS_PER_PLAYER;

/// One of the four colours around the board.
///
/// The colour fixes where a seat enters the shared loop: colours are spaced a
/// quarter-loop apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,
    Green,
    Yellow,
    Blue,
}

impl Color {
    pub const ALL: [Color; 4] = [Color::Red, Color::Green, Color::Yellow, Color::Blue];

    /// Absolute tile where this colour enters the loop.
    pub fn start_offset(self) -> u8 {
        self.index() * (MAIN_LOOP_LEN / 4)
    }

    pub fn index(self) -> u8 {
        match self {
            Self::Red => 0,
            Self::Green => 1,
            Self::Yellow => 2,
            Self::Blue => 3,
        }
    }

    /// Colour assigned to `seat` in a game of `player_count`.
    ///
    /// Two-player games sit in opposite corners (red and yellow); three and
    /// four player games take colours in order.
    pub fn for_seat(player_count: u8, seat: u8) -> Color {
        let index = if player_count == 2 { seat * 2 } else { seat };
        Self::ALL[usize::from(index % 4)]
    }
}

/// Compact board state for one game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardState {
    player_count: u8,
    current_player: u8,
    consecutive_sixes: u8,
    turn_count: u32,
    tokens: [i8; TOKEN_SLOTS],
}

impl BoardState {
    /// A fresh board: every token at BASE, seat 0 to roll.
    pub fn new(player_count: u8) -> Result<Self, BoardError> {
        Self::from_parts(player_count, 0, 0, [BASE; TOKEN_SLOTS])
    }

    /// Builds a board from raw parts, validating every invariant.
    ///
    /// Used by the decoder and for setting up specific positions.
    pub fn from_parts(
        player_count: u8,
        current_player: u8,
        consecutive_sixes: u8,
        tokens: [i8; TOKEN_SLOTS],
    ) -> Result<Self, BoardError> {
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&player_count) {
            return Err(BoardError::InvalidPlayerCount(player_count));
        }
        if current_player >= player_count {
            return Err(BoardError::InvalidCurrentPlayer {
                current: current_player,
                player_count,
            });
        }
        if consecutive_sixes >= crate::MAX_CONSECUTIVE_SIXES {
            return Err(BoardError::InvalidSixStreak(consecutive_sixes));
        }

        let active = usize::from(player_count) * TOKENS_PER_PLAYER;
        for (token, &position) in tokens.iter().enumerate() {
            if !(BASE..=FINISHED).contains(&position) {
                return Err(BoardError::InvalidPosition { token, position });
            }
            if token >= active && position != BASE {
                return Err(BoardError::InactiveSlotInPlay { token });
            }
        }

        Ok(Self {
            player_count,
            current_player,
            consecutive_sixes,
            turn_count: 0,
            tokens,
        })
    }

    pub fn player_count(&self) -> u8 {
        self.player_count
    }

    pub fn current_player(&self) -> u8 {
        self.current_player
    }

    pub fn consecutive_sixes(&self) -> u8 {
        self.consecutive_sixes
    }

    /// Number of times the turn has passed since the game started.
    pub fn turn_count(&self) -> u32 {
        self.turn_count
    }

    /// All 16 slots, including inactive ones.
    pub fn tokens(&self) -> &[i8; TOKEN_SLOTS] {
        &self.tokens
    }

    /// Number of slots in use for this player count.
    pub fn active_slots(&self) -> usize {
        usize::from(self.player_count) * TOKENS_PER_PLAYER
    }

    /// Position of an active token, `None` if the slot is inactive.
    pub fn position(&self, token: usize) -> Option<i8> {
        if token < self.active_slots() {
            Some(self.tokens[token])
        } else {
            None
        }
    }

    /// Seat that owns a token slot.
    pub fn owner(token: usize) -> u8 {
        (token / TOKENS_PER_PLAYER) as u8
    }

    /// Slot range belonging to `seat`.
    pub fn seat_tokens(seat: u8) -> Range<usize> {
        let first = usize::from(seat) * TOKENS_PER_PLAYER;
        first..first + TOKENS_PER_PLAYER
    }

    pub fn color_of(&self, seat: u8) -> Color {
        Color::for_seat(self.player_count, seat)
    }

    /// Counts tokens per seat on an absolute main-loop tile.
    ///
    /// Read-only: callers ask "who would I meet at tile X" without moving
    /// anything.
    pub fn occupancy(&self, absolute: u8) -> [u8; MAX_PLAYERS as usize] {
        let mut counts = [0u8; MAX_PLAYERS as usize];
        for token in 0..self.active_slots() {
            let seat = Self::owner(token);
            let color = self.color_of(seat);
            if coords::to_absolute(self.tokens[token], color) == Some(absolute) {
                counts[usize::from(seat)] += 1;
            }
        }
        counts
    }

    /// Tokens (slot indices) on an absolute main-loop tile.
    pub fn tokens_at(&self, absolute: u8) -> Vec<usize> {
        (0..self.active_slots())
            .filter(|&token| {
                let color = self.color_of(Self::owner(token));
                coords::to_absolute(self.tokens[token], color) == Some(absolute)
            })
            .collect()
    }

    pub(crate) fn set_position(&mut self, token: usize, position: i8) {
        self.tokens[token] = position;
    }

    pub(crate) fn reset_sixes(&mut self) {
        self.consecutive_sixes = 0;
    }

    pub(crate) fn bank_six(&mut self) {
        self.consecutive_sixes += 1;
    }

    pub(crate) fn pass_turn(&mut self) {
        self.current_player = (self.current_player + 1) % self.player_count;
        self.turn_count += 1;
    }
}
