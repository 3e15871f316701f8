//! Time-bounded search driver and the contract it expects from an engine.
//!
//! An engine turns board text into a position and exposes a lazy sequence of
//! ever deeper [`SearchProgress`] results. The [`SearchDriver`] pulls that
//! sequence one item at a time and stops once its deadline has elapsed.

mod coords;
mod driver;
mod error;

pub use coords::{coordinate, parse_square, render_square};
pub use driver::{BestMove, Clock, SearchDriver, WallClock};
pub use error::{EngineError, SearchError};

use crate::notation::{BoardText, Color};

/// The side this service plays. Engine indices for this side are mirrored,
/// see [`coordinate`].
pub const ENGINE_SIDE: Color = Color::Black;

/// A move as a pair of engine square indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Move {
    from: usize,
    to: usize,
}

impl Move {
    #[inline]
    #[must_use]
    pub const fn new(from: usize, to: usize) -> Self {
        Move { from, to }
    }

    #[inline]
    #[must_use]
    pub const fn from(self) -> usize {
        self.from
    }

    #[inline]
    #[must_use]
    pub const fn to(self) -> usize {
        self.to
    }
}

/// One completed iteration of an engine search.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SearchProgress {
    /// Depth reached by this iteration
    pub depth: u32,
    /// Best move found at this depth
    pub best_move: Move,
    /// Engine score from the mover's point of view
    pub score: i32,
}

/// Castling availability, in notation terms.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CastlingRights {
    pub white_king: bool,
    pub white_queen: bool,
    pub black_king: bool,
    pub black_queen: bool,
}

impl CastlingRights {
    pub const ALL: Self = CastlingRights {
        white_king: true,
        white_queen: true,
        black_king: true,
        black_queen: true,
    };

    pub const NONE: Self = CastlingRights {
        white_king: false,
        white_queen: false,
        black_king: false,
        black_queen: false,
    };
}

/// Everything besides the board that an engine position is built from.
///
/// Square fields use absolute board-text indices; `0` means "none".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PositionSetup {
    pub side_to_move: Color,
    pub castling: CastlingRights,
    pub en_passant: usize,
    pub king_passant: usize,
}

impl PositionSetup {
    /// Full castling rights and no en passant state.
    ///
    /// Notation fields are not threaded through to the engine: the driver
    /// always starts from this setup.
    #[must_use]
    pub const fn initial(side_to_move: Color) -> Self {
        PositionSetup {
            side_to_move,
            castling: CastlingRights::ALL,
            en_passant: 0,
            king_passant: 0,
        }
    }
}

/// External move-search engine consumed by the driver.
pub trait SearchEngine {
    type Position;

    /// Lazy, increasing-depth result sequence. Items are computed on demand,
    /// never ahead of the consumer.
    type Search<'a>: Iterator<Item = SearchProgress>
    where
        Self: 'a;

    /// Build a position from transcoded board text.
    fn position(
        &self,
        board: &BoardText,
        setup: &PositionSetup,
    ) -> Result<Self::Position, EngineError>;

    /// Start a fresh search from depth 1.
    fn search(&mut self, position: Self::Position) -> Self::Search<'_>;
}
