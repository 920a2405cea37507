//! Unified error type for the Ludo server.

use ludo_matchmaking::QueueError;
use ludo_protocol::ProtocolError;
use ludo_session::SessionError;
use ludo_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The connection handler funnels every rejected request through this type
/// and turns it into a wire `error{code, error}` with [`LudoError::code`].
#[derive(Debug, thiserror::Error)]
pub enum LudoError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (turn order, pending roll, not in game).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A matchmaking error (bad player count, already queued, queue full).
    #[error(transparent)]
    Queue(#[from] QueueError),
}

impl LudoError {
    /// HTTP-style code for the wire `error` message.
    pub fn code(&self) -> u16 {
        match self {
            Self::Transport(_) => 500,
            Self::Protocol(e) => e.code(),
            Self::Session(e) => e.code(),
            Self::Queue(e) => e.code(),
        }
    }
}
