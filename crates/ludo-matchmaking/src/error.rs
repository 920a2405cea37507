//! Error types for the matchmaking layer.

use ludo_protocol::PlayerId;

/// Why a `join_queue` request was turned away.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    #[error("player count {0} outside 2-4")]
    InvalidPlayerCount(u8),

    /// Empty, too long, or containing control characters.
    #[error("invalid room type {0:?}")]
    InvalidRoomType(String),

    #[error("player {0} is already queued")]
    AlreadyQueued(PlayerId),

    #[error("player {0} is already in a game")]
    AlreadyInSession(PlayerId),

    #[error("matchmaking queue is full")]
    QueueFull,
}

impl QueueError {
    /// HTTP-style code for the wire `error` message.
    pub fn code(&self) -> u16 {
        match self {
            Self::InvalidPlayerCount(_) | Self::InvalidRoomType(_) => 400,
            Self::AlreadyQueued(_) | Self::AlreadyInSession(_) => 409,
            Self::QueueFull => 503,
        }
    }
}
