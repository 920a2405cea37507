//! Queue limits.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Total players waiting across all buckets.
    pub max_waiting: usize,

    /// Longest accepted room type, in characters.
    pub max_room_type_len: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_waiting: 1024,
            max_room_type_len: 32,
        }
    }
}
