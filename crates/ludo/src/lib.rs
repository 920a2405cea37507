//! # Ludo
//!
//! Networked Ludo: a server-authoritative rules engine behind a WebSocket
//! server with FIFO matchmaking and one actor per running game.
//!
//! Clients connect, receive a player id, and join a queue bucket keyed by
//! room type and table size. When a bucket fills, the players are seated in
//! a new session and every roll and move is validated on the server and
//! broadcast to the table.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ludo::prelude::*;
//!
//! # async fn start() -> Result<(), LudoError> {
//! let server = LudoServer::builder().bind("0.0.0.0:8080").build().await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod server;
mod sweep;

pub use error::LudoError;
pub use server::{LudoServer, LudoServerBuilder};

pub mod prelude {
    pub use crate::{LudoError, LudoServer, LudoServerBuilder};
    pub use ludo_engine::{BlockadePolicy, Color, MoveResult, RuleConfig};
    pub use ludo_matchmaking::{QueueConfig, QueueError};
    pub use ludo_protocol::{
        ClientMessage, Codec, GameStateView, JsonCodec, PlayerId, PlayerView, ServerMessage,
        SessionId,
    };
    pub use ludo_session::{SessionConfig, SessionError};
}
