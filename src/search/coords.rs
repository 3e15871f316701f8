//! Engine square index to algebraic coordinate conversion.

use crate::notation::ROW_WIDTH;

/// Largest engine index; the engine's flat index for the side it plays runs
/// opposite to the board text, so index `i` names text square `119 - i`.
const LAST_INDEX: usize = 119;

/// Render an absolute board-text index (21 = a8, 98 = h1) as e.g. `"e2"`.
///
/// Returns `None` for border and sentinel indices.
#[must_use]
pub fn render_square(index: usize) -> Option<String> {
    let row = index / ROW_WIDTH;
    let column = index % ROW_WIDTH;
    if !(2..=9).contains(&row) || !(1..=8).contains(&column) {
        return None;
    }
    let file = char::from(b'a' + (column - 1) as u8);
    let rank = char::from(b'0' + (10 - row) as u8);
    Some(format!("{file}{rank}"))
}

/// Inverse of [`render_square`].
#[must_use]
pub fn parse_square(name: &str) -> Option<usize> {
    let bytes = name.as_bytes();
    if bytes.len() != 2 || !(b'a'..=b'h').contains(&bytes[0]) || !(b'1'..=b'8').contains(&bytes[1])
    {
        return None;
    }
    let column = usize::from(bytes[0] - b'a') + 1;
    let row = 10 - usize::from(bytes[1] - b'0');
    Some(row * ROW_WIDTH + column)
}

/// Algebraic coordinate of an engine move index.
#[must_use]
pub fn coordinate(index: usize) -> Option<String> {
    render_square(LAST_INDEX.checked_sub(index)?)
}
