//! Deadline-bounded consumption of an engine's result sequence.
//!
//! The deadline is checked only between completed items. The driver never
//! interrupts the engine; it stops pulling and drops the rest of the
//! sequence, so the real overrun is bounded by the cost of one more depth.

use std::fmt;
use std::time::{Duration, Instant};

use log::debug;

use super::coords::coordinate;
use super::{
    BoardText, Move, PositionSetup, SearchEngine, SearchError, SearchProgress, ENGINE_SIDE,
};

/// Monotonic time source for the driver.
pub trait Clock {
    /// Time since an arbitrary fixed origin.
    fn now(&self) -> Duration;
}

/// [`Clock`] backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct WallClock {
    origin: Instant,
}

impl WallClock {
    #[must_use]
    pub fn new() -> Self {
        WallClock {
            origin: Instant::now(),
        }
    }
}

impl Default for WallClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for WallClock {
    #[inline]
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    #[inline]
    fn now(&self) -> Duration {
        (**self).now()
    }
}

/// The move picked by the driver, with its algebraic rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BestMove {
    /// Engine move
    pub mv: Move,
    /// Depth of the iteration the move came from
    pub depth: u32,
    /// Engine score of that iteration
    pub score: i32,
    /// Time spent in the search loop
    pub elapsed: Duration,
    from: String,
    to: String,
}

impl BestMove {
    fn from_progress(progress: SearchProgress, elapsed: Duration) -> Result<Self, SearchError> {
        let mv = progress.best_move;
        let from = coordinate(mv.from()).ok_or(SearchError::OffBoard { index: mv.from() })?;
        let to = coordinate(mv.to()).ok_or(SearchError::OffBoard { index: mv.to() })?;
        Ok(BestMove {
            mv,
            depth: progress.depth,
            score: progress.score,
            elapsed,
            from,
            to,
        })
    }

    /// Origin square, e.g. `"e7"`.
    #[must_use]
    pub fn from_square(&self) -> &str {
        &self.from
    }

    /// Destination square, e.g. `"e5"`.
    #[must_use]
    pub fn to_square(&self) -> &str {
        &self.to
    }
}

impl fmt::Display for BestMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)
    }
}

/// Runs an engine's search until a soft deadline passes.
#[derive(Debug, Clone)]
pub struct SearchDriver<C = WallClock> {
    deadline: Duration,
    clock: C,
}

impl SearchDriver<WallClock> {
    #[must_use]
    pub fn new(deadline: Duration) -> Self {
        Self::with_clock(deadline, WallClock::new())
    }
}

impl<C: Clock> SearchDriver<C> {
    #[must_use]
    pub fn with_clock(deadline: Duration, clock: C) -> Self {
        SearchDriver { deadline, clock }
    }

    #[must_use]
    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Build the engine position for [`ENGINE_SIDE`] and search it.
    pub fn find_move<E: SearchEngine>(
        &self,
        engine: &mut E,
        board: &BoardText,
    ) -> Result<BestMove, SearchError> {
        let position = engine.position(board, &PositionSetup::initial(ENGINE_SIDE))?;
        self.drive(engine.search(position))
    }

    /// Consume results until the deadline has elapsed or the sequence ends,
    /// and return the most recently consumed one.
    pub fn drive<I>(&self, results: I) -> Result<BestMove, SearchError>
    where
        I: IntoIterator<Item = SearchProgress>,
    {
        let start = self.clock.now();
        let mut last = None;

        for progress in results {
            let elapsed = self.clock.now().saturating_sub(start);
            debug!(
                "depth {} score {} move {}->{} at {}ms",
                progress.depth,
                progress.score,
                progress.best_move.from(),
                progress.best_move.to(),
                elapsed.as_millis()
            );
            last = Some((progress, elapsed));
            if elapsed > self.deadline {
                break;
            }
        }

        let (progress, elapsed) = last.ok_or(SearchError::NoLegalMove)?;
        BestMove::from_progress(progress, elapsed)
    }
}
