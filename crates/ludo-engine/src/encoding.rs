//! Fixed binary layout for persisting a board.
//!
//! ```text
//! byte 0      player_count
//! byte 1      current_player
//! byte 2      consecutive_sixes
//! byte 3      reserved (0)
//! bytes 4..20 token positions, signed, -1..=57
//! ```
//!
//! The turn counter is not part of the layout; a decoded board starts at 0.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::board::TOKEN_SLOTS;
use crate::{BoardError, BoardState};

/// Size of the encoded layout in bytes.
pub const ENCODED_LEN: usize = 4 + TOKEN_SLOTS;

impl BoardState {
    /// Encodes the board into its 20-byte layout.
    pub fn to_bytes(&self) -> [u8; ENCODED_LEN] {
        let mut out = [0u8; ENCODED_LEN];
        out[0] = self.player_count();
        out[1] = self.current_player();
        out[2] = self.consecutive_sixes();
        out[3] = 0;
        for (slot, &position) in out[4..].iter_mut().zip(self.tokens()) {
            *slot = position as u8;
        }
        out
    }

    /// Decodes a 20-byte layout, rejecting anything that violates a board
    /// invariant. The reserved byte is ignored.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, BoardError> {
        if bytes.len() != ENCODED_LEN {
            return Err(BoardError::InvalidLength {
                expected: ENCODED_LEN,
                actual: bytes.len(),
            });
        }
        let mut tokens = [0i8; TOKEN_SLOTS];
        for (token, &byte) in tokens.iter_mut().zip(&bytes[4..]) {
            *token = byte as i8;
        }
        Self::from_parts(bytes[0], bytes[1], bytes[2], tokens)
    }

    /// The byte layout wrapped in standard base64, for text transports.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.to_bytes())
    }

    pub fn from_base64(encoded: &str) -> Result<Self, BoardError> {
        let bytes = STANDARD.decode(encoded)?;
        Self::from_bytes(&bytes)
    }
}
