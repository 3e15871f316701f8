//! Error types for the engine contract and the search driver.

use std::fmt;

/// Error type for board text the engine cannot build a position from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Board text is not exactly 120 bytes
    WrongLength { len: usize },
    /// A byte that does not belong at its index (piece off the board,
    /// padding on the board, unknown letter)
    MisplacedByte { index: usize, byte: u8 },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::WrongLength { len } => {
                write!(f, "Board text must be 120 bytes, found {len}")
            }
            EngineError::MisplacedByte { index, byte } => {
                write!(f, "Unexpected byte {:?} at board index {index}", char::from(*byte))
            }
        }
    }
}

impl std::error::Error for EngineError {}

/// Error type for search driver failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    /// The engine's sequence ended without yielding a single result
    NoLegalMove,
    /// The engine returned an index outside the 64 playable squares
    OffBoard { index: usize },
    /// The engine rejected the board
    Engine(EngineError),
}

impl fmt::Display for SearchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchError::NoLegalMove => write!(f, "The engine found no legal move"),
            SearchError::OffBoard { index } => {
                write!(f, "Engine square index {index} is off the board")
            }
            SearchError::Engine(e) => write!(f, "Engine error: {e}"),
        }
    }
}

impl std::error::Error for SearchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SearchError::Engine(e) => Some(e),
            _ => None,
        }
    }
}

impl From<EngineError> for SearchError {
    fn from(e: EngineError) -> Self {
        SearchError::Engine(e)
    }
}
