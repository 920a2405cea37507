//! Session registry: creates session actors and tracks who is in which one.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use ludo_protocol::{PlayerId, SessionId};
use tokio::sync::Mutex;

use crate::actor::spawn_session;
use crate::session::idle_for;
use crate::{ExpiryReason, GameSession, SeatSpec, SessionConfig, SessionError, SessionHandle};

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// A session removed by [`SessionRegistry::sweep`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweptSession {
    pub session_id: SessionId,
    pub reason: ExpiryReason,
}

/// All running sessions plus the `player → session` index.
///
/// A player maps to at most one session. The registry never awaits a
/// session while borrowed: callers clone a [`SessionHandle`] out and talk to
/// the actor after releasing whatever lock guards the registry.
#[derive(Debug)]
pub struct SessionRegistry {
    config: SessionConfig,
    sessions: HashMap<SessionId, SessionHandle>,
    player_sessions: HashMap<PlayerId, SessionId>,
}

impl SessionRegistry {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            sessions: HashMap::new(),
            player_sessions: HashMap::new(),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Starts a session for `players`, seated in the given order.
    ///
    /// The new actor immediately sends `match_found` to every seat.
    pub fn create_session(&mut self, players: Vec<SeatSpec>) -> Result<SessionHandle, SessionError> {
        if let Some(busy) = players
            .iter()
            .find(|p| self.player_sessions.contains_key(&p.player_id))
        {
            return Err(SessionError::AlreadyInSession(busy.player_id.clone()));
        }

        let session_id = SessionId(NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed));
        let player_ids: Vec<PlayerId> = players.iter().map(|p| p.player_id.clone()).collect();
        let session = GameSession::new(session_id, players, &self.config, Instant::now())?;
        let handle = spawn_session(session, self.config.channel_size);

        for player_id in player_ids {
            self.player_sessions.insert(player_id, session_id);
        }
        self.sessions.insert(session_id, handle.clone());
        tracing::info!(%session_id, sessions = self.sessions.len(), "session created");
        Ok(handle)
    }

    /// The session a player is seated in, if any.
    pub fn session_of(&self, player_id: &PlayerId) -> Option<SessionId> {
        self.player_sessions.get(player_id).copied()
    }

    pub fn handle(&self, session_id: SessionId) -> Option<SessionHandle> {
        self.sessions.get(&session_id).cloned()
    }

    /// Handle of the session `player_id` is seated in.
    pub fn handle_for(&self, player_id: &PlayerId) -> Option<SessionHandle> {
        self.session_of(player_id).and_then(|id| self.handle(id))
    }

    /// Drops the player's mapping after they leave a game. Returns the
    /// session they were in.
    pub fn release_player(&mut self, player_id: &PlayerId) -> Option<SessionId> {
        self.player_sessions.remove(player_id)
    }

    /// Removes a session and every mapping that points at it.
    ///
    /// Returns the handle so the caller can shut the actor down after
    /// releasing the registry.
    pub fn destroy(&mut self, session_id: SessionId) -> Option<SessionHandle> {
        let handle = self.sessions.remove(&session_id)?;
        self.player_sessions.retain(|_, sid| *sid != session_id);
        tracing::info!(%session_id, "session destroyed");
        Some(handle)
    }

    /// Cloned handles to every running session.
    pub fn handles(&self) -> Vec<SessionHandle> {
        self.sessions.values().cloned().collect()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Removes every session that is finished past the grace period, fully
    /// disconnected, or idle past the inactivity timeout at `now`.
    ///
    /// Takes the registry's mutex instead of `&mut self` so the lock is only
    /// held for the bookkeeping, never while waiting on a session actor.
    pub async fn sweep(registry: &Mutex<Self>, now: Instant) -> Vec<SweptSession> {
        let (handles, config) = {
            let reg = registry.lock().await;
            (reg.handles(), reg.config.clone())
        };

        let mut expired = Vec::new();
        for handle in handles {
            let session_id = handle.session_id();
            match handle.info().await {
                Ok(info) => {
                    if let Some(reason) = info.expiry(now, &config) {
                        tracing::info!(
                            %session_id,
                            %reason,
                            idle_secs = idle_for(&info, now).as_secs(),
                            "sweeping session"
                        );
                        expired.push(SweptSession { session_id, reason });
                    }
                }
                // The actor is gone; nothing left to keep.
                Err(_) => expired.push(SweptSession {
                    session_id,
                    reason: ExpiryReason::Abandoned,
                }),
            }
        }

        let removed: Vec<SessionHandle> = {
            let mut reg = registry.lock().await;
            expired
                .iter()
                .filter_map(|swept| reg.destroy(swept.session_id))
                .collect()
        };
        for handle in removed {
            let _ = handle.shutdown().await;
        }
        expired
    }
}

// =========================================================================
// Tests
// =========================================================================
