//! Mapping between a seat's relative frame and the shared loop.
//!
//! Positions are stored relative to each colour's start tile, which keeps
//! every distance calculation colour-agnostic. Only blockade and eviction
//! checks need to know where two tokens of different colours actually meet,
//! and they go through these two functions.

use crate::board::{Color, LAST_MAIN_LOOP_STEP, MAIN_LOOP_LEN};

/// The four start tiles. Eviction never happens here.
pub const SAFE_TILES: [u8; 4] = [0, 13, 26, 39];

/// Absolute loop tile for a relative position, or `None` when the token is
/// not on the shared loop (BASE, home stretch, FINISHED).
pub fn to_absolute(relative: i8, color: Color) -> Option<u8> {
    if !(0..=LAST_MAIN_LOOP_STEP).contains(&relative) {
        return None;
    }
    Some(loop_tile(relative as u8, color))
}

/// Relative step count from `color`'s start tile to `absolute`.
///
/// The result is in `0..52`; 51 is the tile just behind the start, which a
/// token of that colour never occupies (it turns into its home stretch after
/// step 50).
pub fn to_relative(absolute: u8, color: Color) -> u8 {
    let absolute = absolute % MAIN_LOOP_LEN;
    (absolute + MAIN_LOOP_LEN - color.start_offset()) % MAIN_LOOP_LEN
}

pub fn is_safe_tile(absolute: u8) -> bool {
    SAFE_TILES.contains(&absolute)
}

pub(crate) fn loop_tile(step: u8, color: Color) -> u8 {
    (step + color.start_offset()) % MAIN_LOOP_LEN
}
