//! The matchmaking queue.

use std::collections::{HashMap, VecDeque};
use std::fmt;

use ludo_protocol::{PlayerId, ServerMessage};
use ludo_session::{PlayerSender, SeatSpec};

use crate::{QueueConfig, QueueError};

const MIN_PLAYERS: u8 = 2;
const MAX_PLAYERS: u8 = 4;

/// Bucket key: players only match others who want the same room type and
/// the same table size.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueueKey {
    pub room_type: String,
    pub player_count: u8,
}

impl fmt::Display for QueueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.room_type, self.player_count)
    }
}

/// A waiting player.
#[derive(Debug, Clone)]
pub struct QueueEntry {
    pub player_id: PlayerId,
    pub name: String,
    pub sender: PlayerSender,
    pub key: QueueKey,
}

impl From<QueueEntry> for SeatSpec {
    fn from(entry: QueueEntry) -> Self {
        SeatSpec {
            player_id: entry.player_id,
            name: entry.name,
            sender: entry.sender,
        }
    }
}

/// Result of [`MatchmakingQueue::join`].
#[derive(Debug)]
pub enum JoinOutcome {
    /// Still waiting. The caller owes the joiner a `queue_joined`.
    Queued {
        players_in_queue: usize,
        needed_players: u8,
    },
    /// The bucket filled: these players, oldest first, leave the queue
    /// together.
    Matched(Vec<QueueEntry>),
}

/// FIFO buckets plus a `player → bucket` index.
#[derive(Debug, Default)]
pub struct MatchmakingQueue {
    config: QueueConfig,
    buckets: HashMap<QueueKey, VecDeque<QueueEntry>>,
    /// A player waits in at most one bucket.
    waiting: HashMap<PlayerId, QueueKey>,
}

impl MatchmakingQueue {
    pub fn new(config: QueueConfig) -> Self {
        Self {
            config,
            buckets: HashMap::new(),
            waiting: HashMap::new(),
        }
    }

    /// Adds a player to their bucket, or forms a match if they complete it.
    ///
    /// Everyone else still waiting in the bucket gets a `queue_update`.
    pub fn join(&mut self, entry: QueueEntry) -> Result<JoinOutcome, QueueError> {
        self.validate(&entry)?;

        let key = entry.key.clone();
        let needed = key.player_count;
        let player_id = entry.player_id.clone();
        let bucket = self.buckets.entry(key.clone()).or_default();
        bucket.push_back(entry);
        self.waiting.insert(player_id.clone(), key.clone());

        if bucket.len() >= usize::from(needed) {
            let matched: Vec<QueueEntry> = bucket.drain(..usize::from(needed)).collect();
            if bucket.is_empty() {
                self.buckets.remove(&key);
            }
            for e in &matched {
                self.waiting.remove(&e.player_id);
            }
            tracing::info!(%key, players = matched.len(), "match formed");
            return Ok(JoinOutcome::Matched(matched));
        }

        let players_in_queue = bucket.len();
        tracing::info!(%player_id, %key, players_in_queue, "player queued");
        self.notify_bucket(&key, Some(&player_id));
        Ok(JoinOutcome::Queued {
            players_in_queue,
            needed_players: needed,
        })
    }

    /// Removes a waiting player. Does nothing if they aren't queued.
    ///
    /// The players left in the bucket get a `queue_update`.
    pub fn leave(&mut self, player_id: &PlayerId) -> Option<QueueEntry> {
        let key = self.waiting.remove(player_id)?;
        let bucket = self.buckets.get_mut(&key)?;
        let pos = bucket.iter().position(|e| &e.player_id == player_id)?;
        let entry = bucket.remove(pos)?;
        if bucket.is_empty() {
            self.buckets.remove(&key);
        }

        tracing::info!(%player_id, %key, "player left queue");
        self.notify_bucket(&key, None);
        Some(entry)
    }

    pub fn contains(&self, player_id: &PlayerId) -> bool {
        self.waiting.contains_key(player_id)
    }

    /// Players waiting in one bucket.
    pub fn bucket_len(&self, key: &QueueKey) -> usize {
        self.buckets.get(key).map_or(0, VecDeque::len)
    }

    /// Players waiting across all buckets.
    pub fn len(&self) -> usize {
        self.waiting.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waiting.is_empty()
    }

    fn validate(&self, entry: &QueueEntry) -> Result<(), QueueError> {
        let QueueKey {
            room_type,
            player_count,
        } = &entry.key;

        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(player_count) {
            return Err(QueueError::InvalidPlayerCount(*player_count));
        }
        if room_type.is_empty()
            || room_type.chars().count() > self.config.max_room_type_len
            || room_type.chars().any(char::is_control)
        {
            return Err(QueueError::InvalidRoomType(room_type.clone()));
        }
        if self.contains(&entry.player_id) {
            return Err(QueueError::AlreadyQueued(entry.player_id.clone()));
        }
        if self.len() >= self.config.max_waiting {
            return Err(QueueError::QueueFull);
        }
        Ok(())
    }

    /// Sends the current bucket size to everyone in it except `skip`.
    fn notify_bucket(&self, key: &QueueKey, skip: Option<&PlayerId>) {
        let Some(bucket) = self.buckets.get(key) else {
            return;
        };
        let update = ServerMessage::QueueUpdate {
            current_players: bucket.len(),
            needed_players: key.player_count,
        };
        for entry in bucket.iter().filter(|e| Some(&e.player_id) != skip) {
            let _ = entry.sender.send(update.clone());
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    fn entry(id: &str, room: &str, count: u8) -> (QueueEntry, UnboundedReceiver<ServerMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let e = QueueEntry {
            player_id: PlayerId::from(id),
            name: id.to_uppercase(),
            sender: tx,
            key: QueueKey {
                room_type: room.into(),
                player_count: count,
            },
        };
        (e, rx)
    }

    fn casual(count: u8) -> QueueKey {
        QueueKey {
            room_type: "casual".into(),
            player_count: count,
        }
    }

    // =====================================================================
    // join
    // =====================================================================

    #[test]
    fn test_join_first_player_queued() {
        let mut queue = MatchmakingQueue::default();
        let (e, _rx) = entry("a", "casual", 4);
        let outcome = queue.join(e).unwrap();
        assert!(matches!(
            outcome,
            JoinOutcome::Queued {
                players_in_queue: 1,
                needed_players: 4
            }
        ));
        assert!(queue.contains(&PlayerId::from("a")));
    }

    #[test]
    fn test_join_fills_bucket_exactly_once() {
        let mut queue = MatchmakingQueue::default();
        let mut inboxes = Vec::new();
        for id in ["a", "b", "c"] {
            let (e, rx) = entry(id, "casual", 4);
            inboxes.push(rx);
            assert!(matches!(queue.join(e).unwrap(), JoinOutcome::Queued { .. }));
        }
        let (e, _rx) = entry("d", "casual", 4);
        let JoinOutcome::Matched(players) = queue.join(e).unwrap() else {
            panic!("fourth join should form a match");
        };

        let ids: Vec<&str> = players.iter().map(|e| e.player_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c", "d"]);
        assert_eq!(queue.bucket_len(&casual(4)), 0);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_join_notifies_waiting_players() {
        let mut queue = MatchmakingQueue::default();
        let (a, mut rx_a) = entry("a", "casual", 3);
        let (b, mut rx_b) = entry("b", "casual", 3);
        queue.join(a).unwrap();
        queue.join(b).unwrap();

        // "a" hears about "b"; "b" hears nothing (the caller sends queue_joined).
        assert_eq!(
            rx_a.try_recv().unwrap(),
            ServerMessage::QueueUpdate {
                current_players: 2,
                needed_players: 3
            }
        );
        assert!(rx_b.try_recv().is_err());
    }

    #[test]
    fn test_join_buckets_do_not_mix() {
        let mut queue = MatchmakingQueue::default();
        let (a, _ra) = entry("a", "casual", 2);
        let (b, _rb) = entry("b", "ranked", 2);
        let (c, _rc) = entry("c", "casual", 3);
        for e in [a, b, c] {
            assert!(matches!(queue.join(e).unwrap(), JoinOutcome::Queued { .. }));
        }
        assert_eq!(queue.len(), 3);
    }

    #[test]
    fn test_join_invalid_player_count() {
        let mut queue = MatchmakingQueue::default();
        let (e, _rx) = entry("a", "casual", 5);
        assert_eq!(queue.join(e).unwrap_err(), QueueError::InvalidPlayerCount(5));
        let (e, _rx) = entry("a", "casual", 1);
        assert_eq!(queue.join(e).unwrap_err().code(), 400);
    }

    #[test]
    fn test_join_invalid_room_type() {
        let mut queue = MatchmakingQueue::default();
        let (e, _rx) = entry("a", "", 2);
        assert!(matches!(queue.join(e), Err(QueueError::InvalidRoomType(_))));
        let long = "x".repeat(33);
        let (e, _rx) = entry("a", &long, 2);
        assert!(matches!(queue.join(e), Err(QueueError::InvalidRoomType(_))));
    }

    #[test]
    fn test_join_twice_rejected() {
        let mut queue = MatchmakingQueue::default();
        let (e, _rx) = entry("a", "casual", 4);
        queue.join(e.clone()).unwrap();
        assert_eq!(
            queue.join(e).unwrap_err(),
            QueueError::AlreadyQueued(PlayerId::from("a"))
        );
        assert_eq!(queue.bucket_len(&casual(4)), 1);
    }

    #[test]
    fn test_join_queue_full() {
        let mut queue = MatchmakingQueue::new(QueueConfig {
            max_waiting: 1,
            ..QueueConfig::default()
        });
        let (a, _ra) = entry("a", "casual", 4);
        let (b, _rb) = entry("b", "casual", 4);
        queue.join(a).unwrap();
        let err = queue.join(b).unwrap_err();
        assert_eq!(err, QueueError::QueueFull);
        assert_eq!(err.code(), 503);
    }

    // =====================================================================
    // leave
    // =====================================================================

    #[test]
    fn test_leave_not_queued_is_noop() {
        let mut queue = MatchmakingQueue::default();
        let (a, _ra) = entry("a", "casual", 4);
        queue.join(a).unwrap();

        assert!(queue.leave(&PlayerId::from("ghost")).is_none());
        assert_eq!(queue.bucket_len(&casual(4)), 1);
    }

    #[test]
    fn test_leave_notifies_remaining() {
        let mut queue = MatchmakingQueue::default();
        let (a, mut rx_a) = entry("a", "casual", 4);
        let (b, _rb) = entry("b", "casual", 4);
        queue.join(a).unwrap();
        queue.join(b).unwrap();
        let _ = rx_a.try_recv();

        let removed = queue.leave(&PlayerId::from("b")).unwrap();
        assert_eq!(removed.player_id, PlayerId::from("b"));
        assert_eq!(
            rx_a.try_recv().unwrap(),
            ServerMessage::QueueUpdate {
                current_players: 1,
                needed_players: 4
            }
        );
        assert!(!queue.contains(&PlayerId::from("b")));
    }

    #[test]
    fn test_leave_then_rejoin_keeps_fifo_order() {
        let mut queue = MatchmakingQueue::default();
        let mut keep = Vec::new();
        for id in ["a", "b"] {
            let (e, rx) = entry(id, "casual", 3);
            keep.push(rx);
            queue.join(e).unwrap();
        }
        queue.leave(&PlayerId::from("a"));
        let (a, _ra) = entry("a", "casual", 3);
        queue.join(a).unwrap();
        let (c, _rc) = entry("c", "casual", 3);
        let JoinOutcome::Matched(players) = queue.join(c).unwrap() else {
            panic!("third join should form a match");
        };
        let ids: Vec<&str> = players.iter().map(|e| e.player_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }
}
