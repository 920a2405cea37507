//! Turn state machine and presentation events.
//!
//! [`LocalGame`] wraps a [`BoardState`] and a [`RulesEngine`] with the
//! roll → move cycle:
//!
//! ```text
//! AwaitingRoll(p) ──roll──→ AwaitingMove(p, dice, moves) ──move──→ AwaitingRoll(p | next)
//!        │                                                     │
//!        └──roll, nothing to move──→ AwaitingRoll(next)        └──win──→ Finished(p)
//! ```
//!
//! Every call returns the [`GameEvent`]s it produced, in order. Renderers and
//! animation layers consume those events and query the board; they never
//! mutate it.

use serde::{Deserialize, Serialize};

use crate::{
    BoardError, BoardState, GameError, MoveError, MoveResult, RuleConfig, RulesEngine,
};

/// Where the game is in the roll → move cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum TurnPhase {
    AwaitingRoll { player: u8 },
    AwaitingMove { player: u8, dice: u8, valid_moves: Vec<usize> },
    Finished { winner: u8 },
}

/// Notifications for presentation layers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    GameCreated { player_count: u8 },
    TurnStart { player: u8 },
    DiceRolled { player: u8, dice: u8, valid_moves: Vec<usize> },
    TokenMoved {
        player: u8,
        token: usize,
        from: i8,
        to: i8,
        result: MoveResult,
        evicted: Vec<usize>,
    },
    MoveFailed { player: u8, token: usize, result: MoveResult },
    TurnEnd { player: u8 },
    PlayerWon { player: u8 },
    GameStateChanged,
}

/// What a roll did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollSummary {
    pub player: u8,
    pub dice: u8,
    pub valid_moves: Vec<usize>,
    /// `true` when nothing could move and the turn passed.
    pub turn_switched: bool,
    pub next_player: u8,
    pub events: Vec<GameEvent>,
}

impl RollSummary {
    pub fn no_valid_moves(&self) -> bool {
        self.valid_moves.is_empty()
    }
}

/// What a move attempt did. `result.is_success()` tells whether the board
/// changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveSummary {
    pub player: u8,
    pub token: usize,
    pub result: MoveResult,
    /// Position after the attempt (unchanged on failure).
    pub new_position: i8,
    pub evicted: Vec<usize>,
    pub has_won: bool,
    pub turn_switched: bool,
    pub next_player: u8,
    pub events: Vec<GameEvent>,
}

/// A single game driven locally: board + rules + turn phase.
#[derive(Debug, Clone)]
pub struct LocalGame {
    board: BoardState,
    phase: TurnPhase,
    rules: RulesEngine,
}

impl LocalGame {
    /// Starts a new game. Seat 0 rolls first.
    pub fn create(
        player_count: u8,
        config: RuleConfig,
    ) -> Result<(Self, Vec<GameEvent>), BoardError> {
        let board = BoardState::new(player_count)?;
        let game = Self {
            board,
            phase: TurnPhase::AwaitingRoll { player: 0 },
            rules: RulesEngine::new(config),
        };
        let events = vec![
            GameEvent::GameCreated { player_count },
            GameEvent::TurnStart { player: 0 },
        ];
        Ok((game, events))
    }

    /// Resumes from a stored board, waiting for the current player to roll
    /// (or finished, if someone has already won).
    pub fn from_board(board: BoardState, config: RuleConfig) -> Self {
        let rules = RulesEngine::new(config);
        let winner = (0..board.player_count()).find(|&seat| rules.has_player_won(&board, seat));
        let phase = match winner {
            Some(winner) => TurnPhase::Finished { winner },
            None => TurnPhase::AwaitingRoll {
                player: board.current_player(),
            },
        };
        Self { board, phase, rules }
    }

    pub fn board(&self) -> &BoardState {
        &self.board
    }

    pub fn phase(&self) -> &TurnPhase {
        &self.phase
    }

    pub fn current_player(&self) -> u8 {
        self.board.current_player()
    }

    /// Dice value waiting for a move, if any.
    pub fn pending_dice(&self) -> Option<u8> {
        match &self.phase {
            TurnPhase::AwaitingMove { dice, .. } => Some(*dice),
            _ => None,
        }
    }

    /// Tokens that can use the pending dice (empty when no roll is pending).
    pub fn pending_moves(&self) -> &[usize] {
        match &self.phase {
            TurnPhase::AwaitingMove { valid_moves, .. } => valid_moves,
            _ => &[],
        }
    }

    pub fn winner(&self) -> Option<u8> {
        match self.phase {
            TurnPhase::Finished { winner } => Some(winner),
            _ => None,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.winner().is_some()
    }

    /// Applies a dice value for the current player.
    ///
    /// With nothing to move the turn passes immediately.
    pub fn process_dice_roll(&mut self, dice: u8) -> Result<RollSummary, GameError> {
        let player = match &self.phase {
            TurnPhase::Finished { .. } => return Err(GameError::GameOver),
            TurnPhase::AwaitingMove { .. } => return Err(GameError::RollPending),
            TurnPhase::AwaitingRoll { player } => *player,
        };
        if !(1..=6).contains(&dice) {
            return Err(GameError::InvalidDice(dice));
        }

        let valid_moves = self.rules.compute_valid_moves(&self.board, dice);
        let mut events = vec![GameEvent::DiceRolled {
            player,
            dice,
            valid_moves: valid_moves.clone(),
        }];

        let turn_switched = if valid_moves.is_empty() {
            self.rules.advance_turn(&mut self.board, MoveResult::NoValidMoves);
            self.phase = TurnPhase::AwaitingRoll {
                player: self.board.current_player(),
            };
            events.push(GameEvent::TurnEnd { player });
            events.push(GameEvent::TurnStart {
                player: self.board.current_player(),
            });
            events.push(GameEvent::GameStateChanged);
            true
        } else {
            self.phase = TurnPhase::AwaitingMove {
                player,
                dice,
                valid_moves: valid_moves.clone(),
            };
            false
        };

        Ok(RollSummary {
            player,
            dice,
            valid_moves,
            turn_switched,
            next_player: self.board.current_player(),
            events,
        })
    }

    /// Moves `token` by the pending dice value.
    ///
    /// A rule violation is returned as a failed [`MoveSummary`] and the roll
    /// stays pending so the player can pick another token.
    pub fn move_token(&mut self, token: usize) -> Result<MoveSummary, GameError> {
        let (player, dice) = match &self.phase {
            TurnPhase::Finished { .. } => return Err(GameError::GameOver),
            TurnPhase::AwaitingRoll { .. } => return Err(GameError::NoPendingRoll),
            TurnPhase::AwaitingMove { player, dice, .. } => (*player, *dice),
        };

        let report = match self.rules.process_move(&mut self.board, token, dice) {
            Ok(report) => report,
            Err(MoveError::Rule(violation)) => {
                let result = MoveResult::from(violation);
                let new_position = self.board.position(token).unwrap_or(crate::BASE);
                return Ok(MoveSummary {
                    player,
                    token,
                    result,
                    new_position,
                    evicted: Vec::new(),
                    has_won: false,
                    turn_switched: false,
                    next_player: player,
                    events: vec![GameEvent::MoveFailed { player, token, result }],
                });
            }
            Err(MoveError::TokenOutOfRange { token, active }) => {
                return Err(GameError::TokenOutOfRange { token, active });
            }
            Err(MoveError::InvalidDice(value)) => return Err(GameError::InvalidDice(value)),
        };

        let mut events = vec![GameEvent::TokenMoved {
            player,
            token,
            from: report.from,
            to: report.to,
            result: report.result,
            evicted: report.evicted.clone(),
        }];

        let has_won = self.rules.has_player_won(&self.board, player);
        let turn_switched = if has_won {
            // A win ends the game before any roll-again bonus applies.
            self.phase = TurnPhase::Finished { winner: player };
            events.push(GameEvent::PlayerWon { player });
            false
        } else {
            let switched = self.rules.advance_turn(&mut self.board, report.result);
            self.phase = TurnPhase::AwaitingRoll {
                player: self.board.current_player(),
            };
            if switched {
                events.push(GameEvent::TurnEnd { player });
                events.push(GameEvent::TurnStart {
                    player: self.board.current_player(),
                });
            }
            switched
        };
        events.push(GameEvent::GameStateChanged);

        tracing::debug!(player, token, result = ?report.result, has_won, "token moved");

        Ok(MoveSummary {
            player,
            token,
            result: report.result,
            new_position: report.to,
            evicted: report.evicted,
            has_won,
            turn_switched,
            next_player: self.board.current_player(),
            events,
        })
    }

    /// Ends the current turn without a move, dropping any pending roll.
    ///
    /// Used when the seat holding the turn can no longer play.
    pub fn skip_turn(&mut self) -> Result<Vec<GameEvent>, GameError> {
        if self.is_finished() {
            return Err(GameError::GameOver);
        }
        let player = self.board.current_player();
        self.rules.advance_turn(&mut self.board, MoveResult::NoValidMoves);
        self.phase = TurnPhase::AwaitingRoll {
            player: self.board.current_player(),
        };
        Ok(vec![
            GameEvent::TurnEnd { player },
            GameEvent::TurnStart {
                player: self.board.current_player(),
            },
            GameEvent::GameStateChanged,
        ])
    }
}
