//! Integration tests for the Ludo server, handler, and full connection flow.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use ludo::prelude::*;
use serde_json::json;
use tokio_tungstenite::tungstenite::Message;

// =========================================================================
// Helpers
// =========================================================================

type ClientWs =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// Starts a server with forced dice on a random port and returns the
/// address.
async fn start_server() -> String {
    let server = LudoServer::builder()
        .bind("127.0.0.1:0")
        .session_config(SessionConfig {
            allow_forced_dice: true,
            ..SessionConfig::default()
        })
        .build()
        .await
        .expect("server should build");

    let addr = server
        .local_addr()
        .expect("should have local addr")
        .to_string();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    addr
}

/// A connected client that has already consumed its `connected` message.
struct Client {
    ws: ClientWs,
    player_id: PlayerId,
}

impl Client {
    async fn connect(addr: &str) -> Self {
        let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
            .await
            .expect("should connect");
        let mut client = Self {
            ws,
            player_id: PlayerId::from(""),
        };
        match client.recv().await {
            ServerMessage::Connected { player_id, .. } => client.player_id = player_id,
            other => panic!("expected connected, got {other:?}"),
        }
        client
    }

    async fn send(&mut self, value: serde_json::Value) {
        self.ws
            .send(Message::text(value.to_string()))
            .await
            .expect("send");
    }

    async fn recv(&mut self) -> ServerMessage {
        loop {
            let frame = tokio::time::timeout(Duration::from_secs(5), self.ws.next())
                .await
                .expect("timed out waiting for a message")
                .expect("stream ended")
                .expect("websocket error");
            match frame {
                Message::Text(text) => {
                    return serde_json::from_str(text.as_str()).expect("decode server message");
                }
                Message::Ping(_) | Message::Pong(_) => continue,
                other => panic!("unexpected frame {other:?}"),
            }
        }
    }

    async fn join_queue(&mut self, name: &str, room: &str, count: u8) {
        self.send(json!({
            "type": "join_queue",
            "payload": { "playerName": name, "roomType": room, "playerCount": count }
        }))
        .await;
    }
}

/// Connects two clients and matches them into a 2-player casual game.
/// Returns them in seat order with `match_found` consumed.
async fn matched_pair(addr: &str) -> (Client, Client) {
    let mut alice = Client::connect(addr).await;
    let mut bob = Client::connect(addr).await;

    alice.join_queue("alice", "casual", 2).await;
    assert_eq!(
        alice.recv().await,
        ServerMessage::QueueJoined {
            players_in_queue: 1,
            needed_players: 2
        }
    );

    bob.join_queue("bob", "casual", 2).await;
    assert_eq!(
        bob.recv().await,
        ServerMessage::QueueJoined {
            players_in_queue: 2,
            needed_players: 2
        }
    );

    for client in [&mut alice, &mut bob] {
        match client.recv().await {
            ServerMessage::MatchFound {
                player_count,
                players,
                game_state,
                ..
            } => {
                assert_eq!(player_count, 2);
                assert_eq!(players[0].name, "alice");
                assert_eq!(players[1].name, "bob");
                assert_eq!(game_state.current_player, 0);
            }
            other => panic!("expected match_found, got {other:?}"),
        }
    }
    (alice, bob)
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_connect_sends_player_id() {
    let addr = start_server().await;
    let a = Client::connect(&addr).await;
    let b = Client::connect(&addr).await;

    assert_eq!(a.player_id.as_str().len(), 32);
    assert_ne!(a.player_id, b.player_id);
}

#[tokio::test]
async fn test_malformed_message_returns_400_and_keeps_connection() {
    let addr = start_server().await;
    let mut client = Client::connect(&addr).await;

    client.ws.send(Message::text("not json")).await.expect("send");
    assert!(matches!(client.recv().await, ServerMessage::Error { code: 400, .. }));

    client
        .send(json!({ "type": "teleport", "payload": {} }))
        .await;
    assert!(matches!(client.recv().await, ServerMessage::Error { code: 400, .. }));

    client.join_queue("carol", "casual", 3).await;
    assert!(matches!(client.recv().await, ServerMessage::QueueJoined { .. }));
}

#[tokio::test]
async fn test_binary_frame_returns_400() {
    let addr = start_server().await;
    let mut client = Client::connect(&addr).await;

    client
        .ws
        .send(Message::binary(b"{\"type\":\"get_state\",\"payload\":{}}".to_vec()))
        .await
        .expect("send");
    match client.recv().await {
        ServerMessage::Error { code, error } => {
            assert_eq!(code, 400);
            assert!(error.contains("binary"));
        }
        other => panic!("expected error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_join_queue_invalid_player_count_rejected() {
    let addr = start_server().await;
    let mut client = Client::connect(&addr).await;

    client.join_queue("dave", "casual", 5).await;
    assert!(matches!(client.recv().await, ServerMessage::Error { code: 400, .. }));
}

#[tokio::test]
async fn test_join_queue_twice_conflicts() {
    let addr = start_server().await;
    let mut client = Client::connect(&addr).await;

    client.join_queue("erin", "ranked", 4).await;
    assert!(matches!(client.recv().await, ServerMessage::QueueJoined { .. }));
    client.join_queue("erin", "ranked", 4).await;
    assert!(matches!(client.recv().await, ServerMessage::Error { code: 409, .. }));
}

#[tokio::test]
async fn test_leave_queue_acknowledged_and_others_updated() {
    let addr = start_server().await;
    let mut first = Client::connect(&addr).await;
    let mut second = Client::connect(&addr).await;

    first.join_queue("first", "casual", 4).await;
    first.recv().await;
    second.join_queue("second", "casual", 4).await;
    second.recv().await;
    assert_eq!(
        first.recv().await,
        ServerMessage::QueueUpdate {
            current_players: 2,
            needed_players: 4
        }
    );

    second.send(json!({ "type": "leave_queue", "payload": {} })).await;
    assert_eq!(second.recv().await, ServerMessage::QueueLeft {});
    assert_eq!(
        first.recv().await,
        ServerMessage::QueueUpdate {
            current_players: 1,
            needed_players: 4
        }
    );
}

#[tokio::test]
async fn test_game_requests_without_session_return_404() {
    let addr = start_server().await;
    let mut client = Client::connect(&addr).await;

    client.send(json!({ "type": "roll_dice", "payload": {} })).await;
    assert!(matches!(client.recv().await, ServerMessage::Error { code: 404, .. }));

    client.send(json!({ "type": "get_state", "payload": {} })).await;
    assert!(matches!(client.recv().await, ServerMessage::Error { code: 404, .. }));
}

#[tokio::test]
async fn test_match_then_roll_and_move_broadcast() {
    let addr = start_server().await;
    let (mut alice, mut bob) = matched_pair(&addr).await;

    alice
        .send(json!({ "type": "roll_dice", "payload": { "forcedValue": 6 } }))
        .await;
    for client in [&mut alice, &mut bob] {
        match client.recv().await {
            ServerMessage::DiceRolled {
                player_index,
                dice_value,
                valid_moves,
                no_valid_moves,
                ..
            } => {
                assert_eq!(player_index, 0);
                assert_eq!(dice_value, 6);
                assert_eq!(valid_moves, vec![0, 1, 2, 3]);
                assert!(!no_valid_moves);
            }
            other => panic!("expected dice_rolled, got {other:?}"),
        }
    }

    alice
        .send(json!({ "type": "move_token", "payload": { "tokenIndex": 0 } }))
        .await;
    for client in [&mut alice, &mut bob] {
        match client.recv().await {
            ServerMessage::TokenMoved {
                token_index,
                move_result,
                new_position,
                next_player,
                ..
            } => {
                assert_eq!(token_index, 0);
                assert_eq!(move_result, MoveResult::SuccessSix);
                assert_eq!(new_position, 0);
                assert_eq!(next_player, 0);
            }
            other => panic!("expected token_moved, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_out_of_turn_roll_returns_403() {
    let addr = start_server().await;
    let (_alice, mut bob) = matched_pair(&addr).await;

    bob.send(json!({ "type": "roll_dice", "payload": {} })).await;
    assert!(matches!(bob.recv().await, ServerMessage::Error { code: 403, .. }));
}

#[tokio::test]
async fn test_join_queue_while_playing_conflicts() {
    let addr = start_server().await;
    let (mut alice, _bob) = matched_pair(&addr).await;

    alice.join_queue("alice", "casual", 2).await;
    assert!(matches!(alice.recv().await, ServerMessage::Error { code: 409, .. }));
}

#[tokio::test]
async fn test_get_state_returns_snapshot() {
    let addr = start_server().await;
    let (_alice, mut bob) = matched_pair(&addr).await;

    bob.send(json!({ "type": "get_state", "payload": {} })).await;
    match bob.recv().await {
        ServerMessage::GameState(view) => {
            assert_eq!(view.player_count, 2);
            assert_eq!(view.token_positions, vec![-1; 8]);
            assert!(!view.is_game_over);
        }
        other => panic!("expected game_state, got {other:?}"),
    }
}

#[tokio::test]
async fn test_leave_game_with_two_players_ends_by_forfeit() {
    let addr = start_server().await;
    let (mut alice, mut bob) = matched_pair(&addr).await;
    let bob_id = bob.player_id.clone();

    bob.send(json!({ "type": "leave_game", "payload": {} })).await;
    assert_eq!(
        alice.recv().await,
        ServerMessage::PlayerLeft { player_id: bob_id }
    );
    match alice.recv().await {
        ServerMessage::GameOver { winner_id, .. } => assert_eq!(winner_id, alice.player_id),
        other => panic!("expected game_over, got {other:?}"),
    }

    // Bob is free to queue again.
    bob.join_queue("bob", "casual", 3).await;
    assert!(matches!(bob.recv().await, ServerMessage::QueueJoined { .. }));
}

#[tokio::test]
async fn test_disconnect_then_reconnect_on_new_connection() {
    let addr = start_server().await;
    let (mut alice, bob) = matched_pair(&addr).await;
    let bob_id = bob.player_id.clone();

    drop(bob);
    assert_eq!(
        alice.recv().await,
        ServerMessage::PlayerDisconnected {
            player_id: bob_id.clone()
        }
    );

    let mut bob_again = Client::connect(&addr).await;
    bob_again
        .send(json!({ "type": "reconnect", "payload": { "playerId": bob_id } }))
        .await;
    assert!(matches!(bob_again.recv().await, ServerMessage::GameState(_)));
    assert_eq!(
        alice.recv().await,
        ServerMessage::PlayerReconnected {
            player_id: bob_id.clone()
        }
    );

    // The new connection now speaks for bob's seat.
    alice
        .send(json!({ "type": "roll_dice", "payload": { "forcedValue": 2 } }))
        .await;
    alice.recv().await;
    match bob_again.recv().await {
        ServerMessage::DiceRolled { turn_switched, next_player, .. } => {
            assert!(turn_switched);
            assert_eq!(next_player, 1);
        }
        other => panic!("expected dice_rolled, got {other:?}"),
    }
    bob_again
        .send(json!({ "type": "roll_dice", "payload": { "forcedValue": 3 } }))
        .await;
    assert!(matches!(
        bob_again.recv().await,
        ServerMessage::DiceRolled { player_index: 1, .. }
    ));
}

#[tokio::test]
async fn test_reconnect_unknown_player_returns_404() {
    let addr = start_server().await;
    let mut client = Client::connect(&addr).await;

    client
        .send(json!({ "type": "reconnect", "payload": { "playerId": "nobody" } }))
        .await;
    assert!(matches!(client.recv().await, ServerMessage::Error { code: 404, .. }));
}

#[tokio::test]
async fn test_reconnect_to_live_seat_conflicts_and_keeps_owner() {
    let addr = start_server().await;
    let (mut alice, bob) = matched_pair(&addr).await;
    let bob_id = bob.player_id.clone();

    // Bob's first connection is still open, so the seat cannot be taken.
    let mut bob_again = Client::connect(&addr).await;
    bob_again
        .send(json!({ "type": "reconnect", "payload": { "playerId": bob_id } }))
        .await;
    assert!(matches!(bob_again.recv().await, ServerMessage::Error { code: 409, .. }));

    drop(bob);
    assert_eq!(
        alice.recv().await,
        ServerMessage::PlayerDisconnected {
            player_id: bob_id.clone()
        }
    );

    bob_again
        .send(json!({ "type": "reconnect", "payload": { "playerId": bob_id } }))
        .await;
    assert!(matches!(bob_again.recv().await, ServerMessage::GameState(_)));
    assert_eq!(
        alice.recv().await,
        ServerMessage::PlayerReconnected {
            player_id: bob_id.clone()
        }
    );

    alice
        .send(json!({ "type": "roll_dice", "payload": { "forcedValue": 2 } }))
        .await;
    alice.recv().await;
    assert!(matches!(
        bob_again.recv().await,
        ServerMessage::DiceRolled { player_index: 0, .. }
    ));
}

#[tokio::test]
async fn test_four_player_match_found_once_then_queue_restarts() {
    let addr = start_server().await;
    let mut clients = Vec::new();
    for i in 0..4 {
        let mut client = Client::connect(&addr).await;
        client.join_queue(&format!("player-{i}"), "casual", 4).await;
        assert_eq!(
            client.recv().await,
            ServerMessage::QueueJoined {
                players_in_queue: i + 1,
                needed_players: 4
            }
        );
        clients.push(client);
    }

    for client in &mut clients {
        let found = loop {
            match client.recv().await {
                ServerMessage::QueueUpdate { .. } => continue,
                other => break other,
            }
        };
        match found {
            ServerMessage::MatchFound {
                player_count,
                players,
                ..
            } => {
                assert_eq!(player_count, 4);
                assert_eq!(players.len(), 4);
            }
            other => panic!("expected match_found, got {other:?}"),
        }
    }

    // No second match_found is queued behind the first.
    for client in &mut clients {
        client.send(json!({ "type": "get_state", "payload": {} })).await;
        assert!(matches!(client.recv().await, ServerMessage::GameState(_)));
    }

    let mut fifth = Client::connect(&addr).await;
    fifth.join_queue("player-4", "casual", 4).await;
    assert_eq!(
        fifth.recv().await,
        ServerMessage::QueueJoined {
            players_in_queue: 1,
            needed_players: 4
        }
    );
}
