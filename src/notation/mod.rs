//! Position notation: validation and transcoding to engine board text.

use std::fmt;

use serde::{Deserialize, Serialize};

mod error;
#[cfg(test)]
mod properties;
mod transcode;
mod validate;

pub use error::{ErrorKind, NotationError, FORMAT_EXAMPLE};
pub use transcode::{transcode, BoardText, BOARD_LEN, ROW_WIDTH};
pub use validate::{check_placement, is_piece, validate, Notation, BOARD_SIZE, MARKER, ROW_DELIMITER};

/// Side to move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White,
    Black,
}

impl Color {
    #[inline]
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// The active-color letter used in notation.
    #[inline]
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            Color::White => 'w',
            Color::Black => 'b',
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}
