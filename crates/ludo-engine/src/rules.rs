//! The rules engine: pure functions over a [`BoardState`].
//!
//! Nothing here rolls dice or reads a clock. The caller supplies the dice
//! value, the engine answers "is this legal?", "what happened?" and "whose
//! turn is it now?".

use serde::{Deserialize, Serialize};

use crate::board::{BASE, FINISHED, LAST_MAIN_LOOP_STEP};
use crate::coords::{self, is_safe_tile, loop_tile};
use crate::{BoardState, MoveError, RuleViolation};

/// Rolling this many sixes in a row forfeits the bonus and ends the turn.
pub const MAX_CONSECUTIVE_SIXES: u8 = 3;

const SIX: u8 = 6;

/// How blockades behave on the four safe tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BlockadePolicy {
    /// Safe tiles never hold a blockade; anyone may land on or pass them.
    #[default]
    SafeTilesExempt,
    /// Two same-colour tokens on a safe tile block landing and passage like
    /// anywhere else. Eviction on safe tiles is still impossible.
    SafeTilesEnforced,
}

/// Policy used when no [`RuleConfig`] is given.
pub const DEFAULT_BLOCKADE_POLICY: BlockadePolicy = BlockadePolicy::SafeTilesExempt;

/// Tunable rule variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleConfig {
    pub blockade_policy: BlockadePolicy,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            blockade_policy: DEFAULT_BLOCKADE_POLICY,
        }
    }
}

/// Result code of a move attempt (or of a roll with nothing to move).
///
/// The first five variants mean the move was applied; the rest are rule
/// violations. This is the code that travels to clients and drives
/// [`RulesEngine::advance_turn`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveResult {
    Success,
    /// Dice was a six: roll again.
    SuccessSix,
    /// Token landed exactly on FINISHED: roll again.
    SuccessRollAgain,
    /// An opposing token was sent back to BASE: roll again.
    SuccessEvictedOpponent,
    /// Third six in a row: the move stands but the turn passes.
    SuccessThirdSixPenalty,
    NotYourToken,
    TokenFinished,
    NeedSixToExit,
    BlockedByBlockade,
    Overshoot,
    NoValidMoves,
}

impl MoveResult {
    pub fn is_success(self) -> bool {
        matches!(
            self,
            Self::Success
                | Self::SuccessSix
                | Self::SuccessRollAgain
                | Self::SuccessEvictedOpponent
                | Self::SuccessThirdSixPenalty
        )
    }
}

impl From<RuleViolation> for MoveResult {
    fn from(v: RuleViolation) -> Self {
        match v {
            RuleViolation::NotYourToken => Self::NotYourToken,
            RuleViolation::TokenFinished => Self::TokenFinished,
            RuleViolation::NeedSixToExit => Self::NeedSixToExit,
            RuleViolation::BlockedByBlockade => Self::BlockedByBlockade,
            RuleViolation::Overshoot => Self::Overshoot,
            RuleViolation::NoValidMoves => Self::NoValidMoves,
        }
    }
}

/// A validated move, not yet applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovePlan {
    pub token: usize,
    pub from: i8,
    pub to: i8,
}

/// What `process_move` did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveReport {
    pub token: usize,
    pub from: i8,
    pub to: i8,
    pub result: MoveResult,
    /// Slots sent back to BASE by this move.
    pub evicted: Vec<usize>,
}

/// Stateless rules over a [`BoardState`], parameterised by [`RuleConfig`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RulesEngine {
    config: RuleConfig,
}

impl RulesEngine {
    pub fn new(config: RuleConfig) -> Self {
        Self { config }
    }

    /// Tokens of the current player that can legally move `dice` steps.
    pub fn compute_valid_moves(&self, state: &BoardState, dice: u8) -> Vec<usize> {
        BoardState::seat_tokens(state.current_player())
            .filter(|&token| self.validate_move(state, token, dice).is_ok())
            .collect()
    }

    /// Checks a move without touching the board.
    ///
    /// Checks run in a fixed order, so the first failing rule is the one
    /// reported.
    pub fn validate_move(
        &self,
        state: &BoardState,
        token: usize,
        dice: u8,
    ) -> Result<MovePlan, MoveError> {
        if !(1..=SIX).contains(&dice) {
            return Err(MoveError::InvalidDice(dice));
        }
        let from = state.position(token).ok_or(MoveError::TokenOutOfRange {
            token,
            active: state.active_slots(),
        })?;

        let seat = BoardState::owner(token);
        if seat != state.current_player() {
            return Err(RuleViolation::NotYourToken.into());
        }
        if from == FINISHED {
            return Err(RuleViolation::TokenFinished.into());
        }

        let color = state.color_of(seat);

        if from == BASE {
            if dice != SIX {
                return Err(RuleViolation::NeedSixToExit.into());
            }
            if self.is_blocked_for(state, color.start_offset(), seat) {
                return Err(RuleViolation::BlockedByBlockade.into());
            }
            return Ok(MovePlan { token, from, to: 0 });
        }

        let to = from + dice as i8;
        if to > FINISHED {
            return Err(RuleViolation::Overshoot.into());
        }

        // Home-stretch tiles are private, so only loop tiles up to step 50
        // can be blocked. The range is empty once the token is past step 50.
        let last_loop_step = to.min(LAST_MAIN_LOOP_STEP);
        for step in (from + 1)..=last_loop_step {
            let tile = loop_tile(step as u8, color);
            if self.is_blocked_for(state, tile, seat) {
                return Err(RuleViolation::BlockedByBlockade.into());
            }
        }

        Ok(MovePlan { token, from, to })
    }

    /// Validates, applies, and classifies a move.
    ///
    /// On error the board is untouched.
    pub fn process_move(
        &self,
        state: &mut BoardState,
        token: usize,
        dice: u8,
    ) -> Result<MoveReport, MoveError> {
        let plan = self.validate_move(state, token, dice)?;
        let seat = BoardState::owner(token);
        let third_six = dice == SIX && state.consecutive_sixes() + 1 >= MAX_CONSECUTIVE_SIXES;

        state.set_position(token, plan.to);

        let (result, evicted) = if third_six {
            (MoveResult::SuccessThirdSixPenalty, Vec::new())
        } else {
            let evicted = self.evict_at(state, plan.to, seat);
            let result = if !evicted.is_empty() {
                MoveResult::SuccessEvictedOpponent
            } else if plan.to == FINISHED {
                MoveResult::SuccessRollAgain
            } else if dice == SIX {
                MoveResult::SuccessSix
            } else {
                MoveResult::Success
            };
            (result, evicted)
        };

        tracing::trace!(token, from = plan.from, to = plan.to, ?result, "move applied");

        Ok(MoveReport {
            token,
            from: plan.from,
            to: plan.to,
            result,
            evicted,
        })
    }

    /// Updates the six streak and current player after a move or an empty
    /// roll. Returns `true` if the turn passed to the next seat.
    pub fn advance_turn(&self, state: &mut BoardState, result: MoveResult) -> bool {
        match result {
            MoveResult::SuccessSix => {
                state.bank_six();
                false
            }
            MoveResult::SuccessRollAgain | MoveResult::SuccessEvictedOpponent => {
                state.reset_sixes();
                false
            }
            _ => {
                state.reset_sixes();
                state.pass_turn();
                true
            }
        }
    }

    /// `true` once all four of the seat's tokens are FINISHED.
    pub fn has_player_won(&self, state: &BoardState, seat: u8) -> bool {
        if seat >= state.player_count() {
            return false;
        }
        BoardState::seat_tokens(seat).all(|token| state.tokens()[token] == FINISHED)
    }

    /// Whether `tile` holds a blockade that stops a token of `mover`.
    ///
    /// A pair of any colour blocks, the mover's own included. The one
    /// exception is a colour's own start tile, which its own pairs never
    /// close to it.
    fn is_blocked_for(&self, state: &BoardState, tile: u8, mover: u8) -> bool {
        if is_safe_tile(tile) && self.config.blockade_policy == BlockadePolicy::SafeTilesExempt {
            return false;
        }
        let own_start = state.color_of(mover).start_offset() == tile;
        state
            .occupancy(tile)
            .iter()
            .enumerate()
            .any(|(seat, &count)| count >= 2 && !(own_start && seat == usize::from(mover)))
    }

    /// Sends a lone opposing colour on `to` back to BASE. Returns the slots
    /// that were evicted.
    fn evict_at(&self, state: &mut BoardState, to: i8, mover: u8) -> Vec<usize> {
        let Some(tile) = coords::to_absolute(to, state.color_of(mover)) else {
            return Vec::new();
        };
        if is_safe_tile(tile) {
            return Vec::new();
        }

        let occupancy = state.occupancy(tile);
        let mut opponents = occupancy
            .iter()
            .enumerate()
            .filter(|&(seat, &count)| seat != usize::from(mover) && count > 0)
            .map(|(seat, _)| seat as u8);

        // Two stacked opposing colours are never evicted together.
        let (Some(victim), None) = (opponents.next(), opponents.next()) else {
            return Vec::new();
        };

        let evicted: Vec<usize> = state
            .tokens_at(tile)
            .into_iter()
            .filter(|&token| BoardState::owner(token) == victim)
            .collect();
        for &token in &evicted {
            state.set_position(token, BASE);
        }
        evicted
    }
}
