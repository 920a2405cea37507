//! Matchmaking for the Ludo server.
//!
//! Players wait in FIFO buckets keyed by `(room type, player count)`. As soon
//! as a bucket holds exactly the wanted number of players they are taken out
//! together, oldest first, and handed back as a formed match for the caller
//! to turn into a session.
//!
//! The queue is plain synchronous state. The server keeps it behind one
//! async mutex and creates the session while still holding it, so a player
//! can never end up both queued and seated.

mod config;
mod error;
mod queue;

pub use config::QueueConfig;
pub use error::QueueError;
pub use queue::{JoinOutcome, MatchmakingQueue, QueueEntry, QueueKey};
