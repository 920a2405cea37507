//! Transport failures.

use std::io;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The socket was already shut when it was used.
    #[error("connection closed: {0}")]
    ConnectionClosed(String),

    #[error("failed to write frame: {0}")]
    SendFailed(#[source] io::Error),

    #[error("failed to read frame: {0}")]
    ReceiveFailed(#[source] io::Error),

    /// Covers both binding the listener and the WebSocket upgrade.
    #[error("could not accept client: {0}")]
    AcceptFailed(#[source] io::Error),
}
