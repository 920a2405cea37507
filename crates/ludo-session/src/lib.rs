//! Game sessions for the Ludo server.
//!
//! Each game runs as an isolated Tokio task (actor model) that owns its
//! [`GameSession`]: seats, board, dice. The [`SessionRegistry`] spawns those
//! actors and keeps the `player → session` index the router looks up.
//!
//! # Key types
//!
//! - [`GameSession`]: synchronous game logic plus seat bookkeeping
//! - [`SessionHandle`]: send commands to a running session actor
//! - [`SessionRegistry`]: creates, finds, sweeps, and destroys sessions
//! - [`SessionConfig`]: rules, forced dice, sweep timings

mod actor;
mod config;
mod error;
mod registry;
mod session;

pub use actor::SessionHandle;
pub use config::SessionConfig;
pub use error::SessionError;
pub use registry::{SessionRegistry, SweptSession};
pub use session::{
    ExpiryReason, GameSession, Outbox, PlayerSender, Seat, SeatSpec, SessionInfo, idle_for,
};
