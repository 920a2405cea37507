//! Session actor: a Tokio task that owns one [`GameSession`].
//!
//! Every request reaches the session through an mpsc channel and is handled
//! to completion before the next one is read, so rolls and moves for one
//! game are strictly serialised without any lock around the game state.

use std::time::Instant;

use ludo_protocol::{GameStateView, PlayerId, SessionId};
use tokio::sync::{mpsc, oneshot};

use crate::{GameSession, PlayerSender, SessionError, SessionInfo};

type Reply<T> = oneshot::Sender<Result<T, SessionError>>;

/// Commands sent to a session actor through its channel.
pub(crate) enum SessionCommand {
    RollDice {
        player_id: PlayerId,
        forced: Option<u8>,
        reply: Reply<()>,
    },
    MoveToken {
        player_id: PlayerId,
        token: usize,
        reply: Reply<()>,
    },
    GetState {
        player_id: PlayerId,
        reply: Reply<GameStateView>,
    },
    Disconnect {
        player_id: PlayerId,
        sender: PlayerSender,
        reply: Reply<()>,
    },
    Reconnect {
        player_id: PlayerId,
        sender: PlayerSender,
        reply: Reply<()>,
    },
    Leave {
        player_id: PlayerId,
        reply: Reply<()>,
    },
    Info {
        reply: oneshot::Sender<SessionInfo>,
    },
    Shutdown,
}

/// Handle to a running session actor.
///
/// Cheap to clone. Callers clone it out of the registry and drop the
/// registry lock before awaiting any of these methods.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    session_id: SessionId,
    sender: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Rolls for `player_id`; the outcome is broadcast by the session.
    pub async fn roll_dice(
        &self,
        player_id: PlayerId,
        forced: Option<u8>,
    ) -> Result<(), SessionError> {
        self.request(|reply| SessionCommand::RollDice {
            player_id,
            forced,
            reply,
        })
        .await
    }

    pub async fn move_token(&self, player_id: PlayerId, token: usize) -> Result<(), SessionError> {
        self.request(|reply| SessionCommand::MoveToken {
            player_id,
            token,
            reply,
        })
        .await
    }

    pub async fn get_state(&self, player_id: PlayerId) -> Result<GameStateView, SessionError> {
        self.request(|reply| SessionCommand::GetState { player_id, reply })
            .await
    }

    /// Marks the seat disconnected if the connection owning `sender` still
    /// holds it.
    pub async fn disconnect(
        &self,
        player_id: PlayerId,
        sender: PlayerSender,
    ) -> Result<(), SessionError> {
        self.request(|reply| SessionCommand::Disconnect {
            player_id,
            sender,
            reply,
        })
        .await
    }

    pub async fn reconnect(
        &self,
        player_id: PlayerId,
        sender: PlayerSender,
    ) -> Result<(), SessionError> {
        self.request(|reply| SessionCommand::Reconnect {
            player_id,
            sender,
            reply,
        })
        .await
    }

    /// Gives up `player_id`'s seat.
    pub async fn leave(&self, player_id: PlayerId) -> Result<(), SessionError> {
        self.request(|reply| SessionCommand::Leave { player_id, reply })
            .await
    }

    pub async fn info(&self) -> Result<SessionInfo, SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(SessionCommand::Info { reply: reply_tx })
            .await
            .map_err(|_| SessionError::Unavailable(self.session_id))?;
        reply_rx
            .await
            .map_err(|_| SessionError::Unavailable(self.session_id))
    }

    /// Tells the actor to stop. Pending commands behind it are dropped.
    pub async fn shutdown(&self) -> Result<(), SessionError> {
        self.sender
            .send(SessionCommand::Shutdown)
            .await
            .map_err(|_| SessionError::Unavailable(self.session_id))
    }

    /// Sends a command carrying a reply channel and waits for the answer.
    async fn request<T>(
        &self,
        command: impl FnOnce(Reply<T>) -> SessionCommand,
    ) -> Result<T, SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(command(reply_tx))
            .await
            .map_err(|_| SessionError::Unavailable(self.session_id))?;
        reply_rx
            .await
            .map_err(|_| SessionError::Unavailable(self.session_id))?
    }
}

/// The actor state. Runs inside a Tokio task.
struct SessionActor {
    session: GameSession,
    receiver: mpsc::Receiver<SessionCommand>,
}

impl SessionActor {
    async fn run(mut self) {
        let session_id = self.session.session_id();
        tracing::info!(%session_id, players = self.session.player_count(), "session actor started");

        self.session.dispatch(self.session.match_found());

        while let Some(cmd) = self.receiver.recv().await {
            let now = Instant::now();
            match cmd {
                SessionCommand::RollDice {
                    player_id,
                    forced,
                    reply,
                } => {
                    let result = self.session.roll_dice(&player_id, forced, now);
                    let _ = reply.send(self.deliver(result));
                }
                SessionCommand::MoveToken {
                    player_id,
                    token,
                    reply,
                } => {
                    let result = self.session.move_token(&player_id, token, now);
                    let _ = reply.send(self.deliver(result));
                }
                SessionCommand::GetState { player_id, reply } => {
                    let _ = reply.send(self.session.game_state(&player_id));
                }
                SessionCommand::Disconnect {
                    player_id,
                    sender,
                    reply,
                } => {
                    let result = self.session.disconnect_player(&player_id, &sender);
                    let _ = reply.send(self.deliver(result));
                }
                SessionCommand::Reconnect {
                    player_id,
                    sender,
                    reply,
                } => {
                    let result = self.session.reconnect_player(&player_id, sender);
                    let _ = reply.send(self.deliver(result));
                }
                SessionCommand::Leave { player_id, reply } => {
                    let result = self.session.remove_player(&player_id, now);
                    let _ = reply.send(self.deliver(result));
                }
                SessionCommand::Info { reply } => {
                    let _ = reply.send(self.session.info());
                }
                SessionCommand::Shutdown => {
                    tracing::info!(%session_id, "session shutting down");
                    break;
                }
            }
        }

        tracing::info!(%session_id, "session actor stopped");
    }

    /// Dispatches the messages of a successful operation.
    fn deliver(&self, result: Result<crate::Outbox, SessionError>) -> Result<(), SessionError> {
        result.map(|out| self.session.dispatch(out))
    }
}

/// Spawns a session actor and returns a handle to it.
///
/// The actor opens the game by broadcasting `match_found` to every seat.
pub(crate) fn spawn_session(session: GameSession, channel_size: usize) -> SessionHandle {
    let (tx, rx) = mpsc::channel(channel_size);
    let session_id = session.session_id();

    let actor = SessionActor {
        session,
        receiver: rx,
    };
    tokio::spawn(actor.run());

    SessionHandle {
        session_id,
        sender: tx,
    }
}
