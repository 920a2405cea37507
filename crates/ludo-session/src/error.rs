//! Error types for the session layer.

use ludo_engine::GameError;
use ludo_protocol::{PlayerId, SessionId};

/// Why a session refused a request.
///
/// None of these mutate the game. Rule violations on a move are not errors:
/// they come back as a `move_failed` outcome instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// The player has no seat in this session (or gave it up).
    #[error("player {0} is not in a game")]
    NotInGame(PlayerId),

    #[error("it is not {0}'s turn")]
    NotYourTurn(PlayerId),

    #[error("game is over")]
    GameOver,

    #[error("dice already rolled; move a token first")]
    RollPending,

    #[error("roll the dice first")]
    NoPendingRoll,

    #[error("forced dice values are disabled")]
    ForcedDiceDisallowed,

    #[error("forced dice value {0} outside 1-6")]
    InvalidForcedValue(u8),

    #[error("token {0} is not a valid token index")]
    InvalidToken(usize),

    #[error("a game needs 2-4 players, got {0}")]
    InvalidPlayerCount(usize),

    #[error("player {0} appears twice in one game")]
    DuplicatePlayer(PlayerId),

    #[error("player {0} is already in a game")]
    AlreadyInSession(PlayerId),

    /// `reconnect` named a seat whose connection is still open.
    #[error("player {0} is still connected")]
    StillConnected(PlayerId),

    /// The session actor's channel is closed.
    #[error("session {0} is unavailable")]
    Unavailable(SessionId),
}

impl SessionError {
    /// HTTP-style code for the wire `error` message.
    pub fn code(&self) -> u16 {
        match self {
            Self::NotYourTurn(_) => 403,
            Self::NotInGame(_) => 404,
            Self::GameOver
            | Self::RollPending
            | Self::NoPendingRoll
            | Self::DuplicatePlayer(_)
            | Self::AlreadyInSession(_)
            | Self::StillConnected(_) => 409,
            Self::ForcedDiceDisallowed
            | Self::InvalidForcedValue(_)
            | Self::InvalidToken(_)
            | Self::InvalidPlayerCount(_) => 400,
            Self::Unavailable(_) => 500,
        }
    }
}

impl From<GameError> for SessionError {
    fn from(e: GameError) -> Self {
        match e {
            GameError::GameOver => Self::GameOver,
            GameError::RollPending => Self::RollPending,
            GameError::NoPendingRoll => Self::NoPendingRoll,
            GameError::TokenOutOfRange { token, .. } => Self::InvalidToken(token),
            GameError::InvalidDice(value) => Self::InvalidForcedValue(value),
        }
    }
}
