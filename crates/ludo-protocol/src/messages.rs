//! Messages exchanged between clients and the server.
//!
//! Every frame is a JSON object with a snake_case `type` tag and a `payload`
//! object whose fields are camelCase:
//!
//! ```json
//! { "type": "move_token", "payload": { "tokenIndex": 2 } }
//! ```
//!
//! Both directions are closed enums, so a frame with an unknown `type` fails
//! to decode instead of being silently ignored. Messages without fields are
//! empty struct variants (`LeaveQueue {}`) so they still carry a `payload`
//! object.

use ludo_engine::{Color, MoveResult};
use serde::{Deserialize, Serialize};

use crate::{PlayerId, SessionId};

// ---------------------------------------------------------------------------
// Client → server
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum ClientMessage {
    /// Wait for a match of `player_count` players in the `room_type` bucket.
    JoinQueue {
        player_name: String,
        room_type: String,
        player_count: u8,
    },

    LeaveQueue {},

    /// Roll for the current turn. `forced_value` is only honoured when the
    /// server allows forced dice.
    RollDice {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        forced_value: Option<u8>,
    },

    /// Move one of the caller's tokens by the pending roll.
    MoveToken { token_index: usize },

    GetState {},

    /// Give up the seat in the current game.
    LeaveGame {},

    /// Reclaim a seat after the connection dropped.
    Reconnect { player_id: PlayerId },
}

impl ClientMessage {
    /// Wire tag, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::JoinQueue { .. } => "join_queue",
            Self::LeaveQueue {} => "leave_queue",
            Self::RollDice { .. } => "roll_dice",
            Self::MoveToken { .. } => "move_token",
            Self::GetState {} => "get_state",
            Self::LeaveGame {} => "leave_game",
            Self::Reconnect { .. } => "reconnect",
        }
    }
}

// ---------------------------------------------------------------------------
// Server → client
// ---------------------------------------------------------------------------

/// One seat as clients see it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub player_id: PlayerId,
    pub name: String,
    pub player_index: u8,
    pub color: Color,
    pub connected: bool,
    pub has_left: bool,
}

/// Full snapshot of a game, sent on match, after every move, and on request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStateView {
    pub session_id: SessionId,
    pub player_count: u8,
    pub current_player: u8,
    pub consecutive_sixes: u8,
    pub turn_count: u32,
    /// Active token slots only (`player_count * 4` entries).
    pub token_positions: Vec<i8>,
    pub pending_dice: Option<u8>,
    pub valid_moves: Vec<usize>,
    pub is_game_over: bool,
    pub winner_id: Option<PlayerId>,
    pub players: Vec<PlayerView>,
    /// Persisted 20-byte board layout, base64.
    pub board: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum ServerMessage {
    Connected { player_id: PlayerId, message: String },

    QueueJoined {
        players_in_queue: usize,
        needed_players: u8,
    },

    /// Bucket size changed for someone already waiting.
    QueueUpdate {
        current_players: usize,
        needed_players: u8,
    },

    QueueLeft {},

    MatchFound {
        session_id: SessionId,
        player_count: u8,
        players: Vec<PlayerView>,
        game_state: GameStateView,
    },

    DiceRolled {
        player_index: u8,
        dice_value: u8,
        valid_moves: Vec<usize>,
        no_valid_moves: bool,
        turn_switched: bool,
        next_player: u8,
    },

    TokenMoved {
        player_index: u8,
        token_index: usize,
        move_result: MoveResult,
        new_position: i8,
        evicted_tokens: Vec<usize>,
        has_won: bool,
        turn_switched: bool,
        next_player: u8,
        game_state: GameStateView,
    },

    /// A rule forbade the move; the roll is still pending. Sent to the mover
    /// only.
    MoveFailed {
        player_index: u8,
        token_index: usize,
        move_result: MoveResult,
        dice_value: u8,
        valid_moves: Vec<usize>,
    },

    GameState(GameStateView),

    GameOver {
        winner_id: PlayerId,
        winner_index: u8,
        winner_name: String,
    },

    PlayerLeft { player_id: PlayerId },

    PlayerDisconnected { player_id: PlayerId },

    PlayerReconnected { player_id: PlayerId },

    /// `code` follows HTTP conventions: 400 bad request, 403 not your turn,
    /// 404 not in a game, 409 conflicting state, 503 queue full.
    Error { code: u16, error: String },
}

impl ServerMessage {
    pub fn error(code: u16, error: impl Into<String>) -> Self {
        Self::Error {
            code,
            error: error.into(),
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
