//! Wire protocol for the Ludo server.
//!
//! - **Identity** ([`PlayerId`], [`SessionId`]) and [`Recipient`] addressing.
//! - **Messages** ([`ClientMessage`], [`ServerMessage`], [`GameStateView`]):
//!   the JSON frames clients and server exchange.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): bytes ↔ messages.
//! - **Errors** ([`ProtocolError`]).
//!
//! ```text
//! Transport (bytes) → Protocol (ClientMessage) → Session / Matchmaking
//! ```

mod codec;
mod error;
mod messages;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use messages::{ClientMessage, GameStateView, PlayerView, ServerMessage};
pub use types::{PlayerId, Recipient, SessionId};
