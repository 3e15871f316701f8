//! Validation of six-field position notation.
//!
//! The piece-placement field is always scanned row by row first so that a
//! structural problem is reported with a precise message. Only once the rows
//! are sound are the remaining five fields checked; a failure there produces
//! the generic [`NotationError::Format`] diagnostic.

use std::fmt;
use std::str::FromStr;

use super::error::NotationError;
use super::Color;

/// Separates rows in the piece-placement field.
pub const ROW_DELIMITER: char = '/';

/// Marks the preceding piece (e.g. a promoted piece in drop variants).
/// It does not occupy a square.
pub const MARKER: char = '~';

/// Number of rows and columns on the board.
pub const BOARD_SIZE: usize = 8;

/// Returns true for the twelve piece letters, either case.
#[inline]
#[must_use]
pub fn is_piece(c: char) -> bool {
    matches!(c.to_ascii_lowercase(), 'p' | 'n' | 'b' | 'r' | 'q' | 'k')
}

/// A notation string that passed validation, split into its fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notation {
    placement: String,
    active: Color,
    castling: String,
    en_passant: Option<String>,
    halfmove_clock: u32,
    fullmove_number: u32,
}

impl Notation {
    /// The row-delimited piece-placement field.
    #[must_use]
    pub fn placement(&self) -> &str {
        &self.placement
    }

    /// The side to move.
    #[must_use]
    pub fn active_color(&self) -> Color {
        self.active
    }

    #[must_use]
    pub fn castling(&self) -> &str {
        &self.castling
    }

    /// En passant target square, if any (e.g. `"e3"`).
    #[must_use]
    pub fn en_passant(&self) -> Option<&str> {
        self.en_passant.as_deref()
    }

    #[must_use]
    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    #[must_use]
    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }
}

impl fmt::Display for Notation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {} {}",
            self.placement,
            self.active,
            self.castling,
            self.en_passant.as_deref().unwrap_or("-"),
            self.halfmove_clock,
            self.fullmove_number
        )
    }
}

impl FromStr for Notation {
    type Err = NotationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        validate(s)
    }
}

/// Validate a notation string.
///
/// Never panics on malformed input: every failure is reported as a
/// [`NotationError`] naming the violated rule.
///
/// # Example
/// ```
/// use chess_move_api::notation::{validate, Color};
///
/// let notation = validate("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR b KQkq - 0 1").unwrap();
/// assert_eq!(notation.active_color(), Color::Black);
/// ```
pub fn validate(notation: &str) -> Result<Notation, NotationError> {
    // Fields are separated by exactly one whitespace character
    let fields: Vec<&str> = notation.split(char::is_whitespace).collect();
    let placement = fields[0];
    if placement.is_empty() {
        return Err(NotationError::Format);
    }

    check_placement(placement)?;

    if fields.len() != 6 {
        return Err(NotationError::Format);
    }

    let active = match fields[1] {
        "w" => Color::White,
        "b" => Color::Black,
        _ => return Err(NotationError::Format),
    };

    let castling = fields[2];
    if !(1..=4).contains(&castling.len()) || !castling.chars().all(|c| "KQkq".contains(c)) {
        return Err(NotationError::Format);
    }

    let en_passant = match fields[3] {
        "-" => None,
        square if is_square(square) => Some(square.to_string()),
        _ => return Err(NotationError::Format),
    };

    let halfmove_clock = parse_counter(fields[4])?;
    let fullmove_number = parse_counter(fields[5])?;

    Ok(Notation {
        placement: placement.to_string(),
        active,
        castling: castling.to_string(),
        en_passant,
        halfmove_clock,
        fullmove_number,
    })
}

/// Check the piece-placement field on its own.
pub fn check_placement(placement: &str) -> Result<(), NotationError> {
    let rows: Vec<&str> = placement.split(ROW_DELIMITER).collect();
    let owned = || rows.iter().map(|row| (*row).to_string()).collect::<Vec<_>>();

    if rows.len() != BOARD_SIZE {
        return Err(NotationError::RowCount { rows: owned() });
    }

    for row in &rows {
        scan_row(row).map_err(|fault| fault.into_error(owned()))?;
    }
    Ok(())
}

/// Rule broken by a single row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowFault {
    SubsequentDigits,
    MarkerNotAfterPiece,
    InvalidCharacter(char),
    ColumnCount,
}

impl RowFault {
    fn into_error(self, rows: Vec<String>) -> NotationError {
        match self {
            RowFault::SubsequentDigits => NotationError::SubsequentDigits { rows },
            RowFault::MarkerNotAfterPiece => NotationError::MarkerNotAfterPiece { rows },
            RowFault::InvalidCharacter(char) => NotationError::InvalidCharacter { rows, char },
            RowFault::ColumnCount => NotationError::ColumnCount { rows },
        }
    }
}

fn scan_row(row: &str) -> Result<(), RowFault> {
    let mut squares = 0u32;
    let mut previous_was_digit = false;
    let mut previous_was_piece = false;

    for c in row.chars() {
        match c {
            '1'..='8' => {
                if previous_was_digit {
                    return Err(RowFault::SubsequentDigits);
                }
                squares += c as u32 - '0' as u32;
                previous_was_digit = true;
                previous_was_piece = false;
            }
            MARKER => {
                if !previous_was_piece {
                    return Err(RowFault::MarkerNotAfterPiece);
                }
                previous_was_digit = false;
                previous_was_piece = false;
            }
            c if is_piece(c) => {
                squares += 1;
                previous_was_digit = false;
                previous_was_piece = true;
            }
            other => return Err(RowFault::InvalidCharacter(other)),
        }
    }

    if squares as usize != BOARD_SIZE {
        return Err(RowFault::ColumnCount);
    }
    Ok(())
}

fn is_square(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 2 && (b'a'..=b'h').contains(&bytes[0]) && (b'1'..=b'8').contains(&bytes[1])
}

fn parse_counter(field: &str) -> Result<u32, NotationError> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(NotationError::Format);
    }
    // The grammar accepts arbitrarily long digit runs.
    Ok(field.parse().unwrap_or(u32::MAX))
}
