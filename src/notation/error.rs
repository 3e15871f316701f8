//! Diagnostics produced by the notation validator.

use std::fmt;

/// Example notation quoted by the generic format diagnostic.
pub const FORMAT_EXAMPLE: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Coarse classification of a [`NotationError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The input does not have the six-field shape at all
    Format,
    /// The fields have the right shape but the piece placement breaks a row rule
    Structural,
}

/// Error type for notation validation failures.
///
/// Structural variants carry the piece-placement field split into rows so the
/// rendered message can quote it back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotationError {
    /// Input does not match the six-field grammar
    Format,
    /// Piece placement does not split into exactly 8 rows
    RowCount { rows: Vec<String> },
    /// Two digits appear next to each other within a row
    SubsequentDigits { rows: Vec<String> },
    /// A `~` marker that does not directly follow a piece
    MarkerNotAfterPiece { rows: Vec<String> },
    /// A character that is neither a piece, a digit nor a marker
    InvalidCharacter { rows: Vec<String>, char: char },
    /// A row that does not add up to 8 squares
    ColumnCount { rows: Vec<String> },
}

impl NotationError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            NotationError::Format => ErrorKind::Format,
            _ => ErrorKind::Structural,
        }
    }

    /// The parsed row list, for structural errors.
    #[must_use]
    pub fn rows(&self) -> Option<&[String]> {
        match self {
            NotationError::Format => None,
            NotationError::RowCount { rows }
            | NotationError::SubsequentDigits { rows }
            | NotationError::MarkerNotAfterPiece { rows }
            | NotationError::InvalidCharacter { rows, .. }
            | NotationError::ColumnCount { rows } => Some(rows),
        }
    }
}

/// Renders rows as a bracketed, single-quoted list: `['8', 'pppppppp']`.
struct RowList<'a>(&'a [String]);

impl fmt::Display for RowList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, row) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "'{row}'")?;
        }
        f.write_str("]")
    }
}

impl fmt::Display for NotationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotationError::Format => {
                write!(f, "FEN doesn`t match follow this example: {FORMAT_EXAMPLE}")
            }
            NotationError::RowCount { rows } => {
                write!(f, "Expected 8 rows in position part of FEN: {}", RowList(rows))
            }
            NotationError::SubsequentDigits { rows } => write!(
                f,
                "Two subsequent digits in position part of FEN: {}",
                RowList(rows)
            ),
            NotationError::MarkerNotAfterPiece { rows } => write!(
                f,
                "~ not after piece in position part of FEN: {}",
                RowList(rows)
            ),
            NotationError::InvalidCharacter { rows, .. } => write!(
                f,
                "Invalid character in position part of FEN: {}",
                RowList(rows)
            ),
            NotationError::ColumnCount { rows } => write!(
                f,
                "Expected 8 columns per row in position part of FEN: {}",
                RowList(rows)
            ),
        }
    }
}

impl std::error::Error for NotationError {}
