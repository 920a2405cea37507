//! Per-connection handler: identity, outbound writer, and message routing.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Generate a `PlayerId` and send `connected`
//!   2. Spawn a writer task draining the connection's outbound channel
//!   3. Loop: decode `ClientMessage`s and route them to the queue or the
//!      player's session; rejected requests come back as `error`
//!   4. On close: leave the queue and mark the seat disconnected

use std::sync::Arc;

use ludo_matchmaking::{JoinOutcome, QueueEntry, QueueError, QueueKey};
use ludo_protocol::{ClientMessage, Codec, PlayerId, ProtocolError, ServerMessage};
use ludo_session::{PlayerSender, SeatSpec, SessionError, SessionHandle};
use ludo_transport::{Connection, Frame, WebSocketConnection};
use tokio::sync::mpsc;

use crate::LudoError;
use crate::server::ServerState;

const WELCOME: &str = "connected to Ludo server";
const DEFAULT_PLAYER_NAME: &str = "Player";

/// Drop guard that releases a player's queue slot and seat when the
/// handler exits.
///
/// `player_id` changes when the connection reclaims a seat with
/// `reconnect`, so the guard always releases whoever the connection is
/// now. `sender` identifies this connection to the session, which ignores
/// the release if another connection has since taken the seat. Since
/// `Drop` is synchronous, we spawn a fire-and-forget task for the async
/// locks.
struct ConnectionGuard<C: Codec> {
    player_id: PlayerId,
    sender: PlayerSender,
    state: Arc<ServerState<C>>,
}

impl<C: Codec> Drop for ConnectionGuard<C> {
    fn drop(&mut self) {
        let player_id = self.player_id.clone();
        let sender = self.sender.clone();
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            release_connection(&state, player_id, sender).await;
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), LudoError> {
    let conn = Arc::new(conn);
    let conn_id = conn.id();

    let (tx, rx) = mpsc::unbounded_channel();
    let writer = tokio::spawn(write_loop(Arc::clone(&conn), Arc::clone(&state), rx));

    let mut guard = ConnectionGuard {
        player_id: PlayerId::generate(),
        sender: tx.clone(),
        state: Arc::clone(&state),
    };
    tracing::info!(%conn_id, peer = %conn.peer_addr(), player_id = %guard.player_id, "player connected");
    let _ = tx.send(ServerMessage::Connected {
        player_id: guard.player_id.clone(),
        message: WELCOME.to_string(),
    });

    let result = loop {
        let text = match conn.recv().await {
            Ok(Some(Frame::Text(text))) => text,
            Ok(Some(Frame::Binary(_))) => {
                let e = ProtocolError::InvalidMessage("binary frames are not supported".into());
                let _ = tx.send(ServerMessage::error(e.code(), e.to_string()));
                continue;
            }
            Ok(None) => {
                tracing::info!(%conn_id, player_id = %guard.player_id, "connection closed cleanly");
                break Ok(());
            }
            Err(e) => break Err(LudoError::from(e)),
        };

        let msg: ClientMessage = match state.codec.decode(text.as_bytes()) {
            Ok(msg) => msg,
            Err(e) => {
                tracing::debug!(player_id = %guard.player_id, error = %e, "failed to decode message");
                let _ = tx.send(ServerMessage::error(e.code(), e.to_string()));
                continue;
            }
        };

        let kind = msg.kind();
        if let Err(e) = route(&state, &mut guard.player_id, &tx, msg).await {
            tracing::debug!(player_id = %guard.player_id, kind, error = %e, "request rejected");
            let _ = tx.send(ServerMessage::error(e.code(), e.to_string()));
        }
    };

    // Queue entries and seats hold clones of `tx`, so the writer would
    // otherwise outlive the socket.
    writer.abort();
    let _ = conn.close().await;
    drop(guard);
    result
}

/// Encodes outbound messages and writes them to the socket in order.
async fn write_loop<C: Codec>(
    conn: Arc<WebSocketConnection>,
    state: Arc<ServerState<C>>,
    mut rx: mpsc::UnboundedReceiver<ServerMessage>,
) {
    while let Some(msg) = rx.recv().await {
        let bytes = match state.codec.encode(&msg) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(conn_id = %conn.id(), error = %e, "failed to encode message");
                continue;
            }
        };
        if let Err(e) = conn.send(Frame::from(bytes)).await {
            tracing::debug!(conn_id = %conn.id(), error = %e, "send failed; writer stopping");
            break;
        }
    }
}

/// Dispatches one client request.
async fn route<C: Codec>(
    state: &ServerState<C>,
    player_id: &mut PlayerId,
    tx: &PlayerSender,
    msg: ClientMessage,
) -> Result<(), LudoError> {
    match msg {
        ClientMessage::JoinQueue {
            player_name,
            room_type,
            player_count,
        } => {
            let key = QueueKey {
                room_type,
                player_count,
            };
            join_queue(state, player_id, player_name, key, tx).await
        }

        ClientMessage::LeaveQueue {} => {
            let left = state.queue.lock().await.leave(player_id);
            if left.is_some() {
                let _ = tx.send(ServerMessage::QueueLeft {});
            }
            Ok(())
        }

        ClientMessage::RollDice { forced_value } => {
            let handle = session_for(state, player_id).await?;
            handle.roll_dice(player_id.clone(), forced_value).await?;
            Ok(())
        }

        ClientMessage::MoveToken { token_index } => {
            let handle = session_for(state, player_id).await?;
            handle.move_token(player_id.clone(), token_index).await?;
            Ok(())
        }

        ClientMessage::GetState {} => {
            let handle = session_for(state, player_id).await?;
            let view = handle.get_state(player_id.clone()).await?;
            let _ = tx.send(ServerMessage::GameState(view));
            Ok(())
        }

        ClientMessage::LeaveGame {} => {
            let handle = session_for(state, player_id).await?;
            handle.leave(player_id.clone()).await?;
            state.registry.lock().await.release_player(player_id);
            Ok(())
        }

        ClientMessage::Reconnect { player_id: target } => {
            reconnect(state, player_id, target, tx).await
        }
    }
}

/// Queues the player, or starts a session if they complete a bucket.
///
/// The queue lock is held across the whole call, session creation
/// included, so a player is never both queued and seated.
async fn join_queue<C: Codec>(
    state: &ServerState<C>,
    player_id: &PlayerId,
    player_name: String,
    key: QueueKey,
    tx: &PlayerSender,
) -> Result<(), LudoError> {
    let mut queue = state.queue.lock().await;
    ensure_not_seated(state, player_id).await?;

    let name = match player_name.trim() {
        "" => DEFAULT_PLAYER_NAME.to_string(),
        trimmed => trimmed.to_string(),
    };
    let needed_players = key.player_count;
    let entry = QueueEntry {
        player_id: player_id.clone(),
        name,
        sender: tx.clone(),
        key,
    };

    match queue.join(entry)? {
        JoinOutcome::Queued {
            players_in_queue,
            needed_players,
        } => {
            let _ = tx.send(ServerMessage::QueueJoined {
                players_in_queue,
                needed_players,
            });
        }
        JoinOutcome::Matched(players) => {
            // The joiner completed the bucket; acknowledge before the
            // session's `match_found` lands on the same channel.
            let _ = tx.send(ServerMessage::QueueJoined {
                players_in_queue: players.len(),
                needed_players,
            });

            let senders: Vec<PlayerSender> = players.iter().map(|p| p.sender.clone()).collect();
            let seats: Vec<SeatSpec> = players.into_iter().map(SeatSpec::from).collect();
            let created = state.registry.lock().await.create_session(seats);
            if let Err(e) = created {
                tracing::warn!(error = %e, "could not start session for formed match");
                let msg = ServerMessage::error(e.code(), e.to_string());
                for sender in senders {
                    let _ = sender.send(msg.clone());
                }
            }
        }
    }
    Ok(())
}

/// Rejects a join from a player still playing. A mapping left over from a
/// finished game is released instead.
async fn ensure_not_seated<C: Codec>(
    state: &ServerState<C>,
    player_id: &PlayerId,
) -> Result<(), QueueError> {
    let handle = state.registry.lock().await.handle_for(player_id);
    let Some(handle) = handle else {
        return Ok(());
    };

    match handle.info().await {
        Ok(info) if !info.is_game_over => Err(QueueError::AlreadyInSession(player_id.clone())),
        _ => {
            state.registry.lock().await.release_player(player_id);
            Ok(())
        }
    }
}

/// Moves this connection onto a disconnected seat.
///
/// A seat whose connection is still open is refused with 409. On success the connection speaks as `target` from then on.
async fn reconnect<C: Codec>(
    state: &ServerState<C>,
    current: &mut PlayerId,
    target: PlayerId,
    tx: &PlayerSender,
) -> Result<(), LudoError> {
    if state.queue.lock().await.contains(current) {
        return Err(QueueError::AlreadyQueued(current.clone()).into());
    }

    let (handle, seated_elsewhere) = {
        let registry = state.registry.lock().await;
        let seated_elsewhere = *current != target && registry.session_of(current).is_some();
        (registry.handle_for(&target), seated_elsewhere)
    };
    if seated_elsewhere {
        return Err(SessionError::AlreadyInSession(current.clone()).into());
    }
    let handle = handle.ok_or_else(|| SessionError::NotInGame(target.clone()))?;

    handle.reconnect(target.clone(), tx.clone()).await?;
    tracing::info!(from = %current, to = %target, session_id = %handle.session_id(), "connection reclaimed seat");
    *current = target;
    Ok(())
}

/// The session `player_id` is seated in.
async fn session_for<C: Codec>(
    state: &ServerState<C>,
    player_id: &PlayerId,
) -> Result<SessionHandle, SessionError> {
    state
        .registry
        .lock()
        .await
        .handle_for(player_id)
        .ok_or_else(|| SessionError::NotInGame(player_id.clone()))
}

/// Leaves the queue and marks the seat disconnected so the other players
/// hear about it, unless another connection now holds the seat.
async fn release_connection<C: Codec>(
    state: &ServerState<C>,
    player_id: PlayerId,
    sender: PlayerSender,
) {
    let left = state.queue.lock().await.leave(&player_id);
    if left.is_some() {
        tracing::debug!(%player_id, "removed from queue on disconnect");
    }

    let handle = state.registry.lock().await.handle_for(&player_id);
    if let Some(handle) = handle {
        if let Err(e) = handle.disconnect(player_id.clone(), sender).await {
            tracing::debug!(%player_id, error = %e, "disconnect not recorded");
        }
    }
}
