//! Piece placement to padded board text.
//!
//! The engine addresses a 10x12 grid: two border rows, eight interior rows
//! of a sentinel column plus eight squares plus a newline, and two more
//! border rows. Index 21 is the top-left square (a8).

use std::fmt;

/// Total length of a transcoded board.
pub const BOARD_LEN: usize = 120;

/// Width of one text row including its newline.
pub const ROW_WIDTH: usize = 10;

const BORDER_ROW: &str = "         \n";
const SENTINEL: char = ' ';
const EMPTY_SQUARE: char = '.';

/// Padded rectangular board text produced by [`transcode`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BoardText(String);

impl BoardText {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }

    /// The eight-character square runs of each interior row, top to bottom.
    pub fn interior_rows(&self) -> impl Iterator<Item = &str> {
        self.0
            .lines()
            .skip(2)
            .take(8)
            .map(|line| line.get(1..).unwrap_or(""))
    }
}

impl fmt::Display for BoardText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for BoardText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Emits squares and breaks rows every eight of them.
struct RowWriter {
    out: String,
    column: usize,
}

impl RowWriter {
    fn push_square(&mut self, square: char) {
        if self.column == 0 {
            self.out.push(SENTINEL);
        }
        self.out.push(square);
        self.column += 1;
        if self.column == 8 {
            self.out.push('\n');
            self.column = 0;
        }
    }
}

/// Convert a piece-placement field into engine board text.
///
/// The input is expected to have passed [`validate`](super::validate).
/// Row delimiters and markers are not tokens here: row breaks come from the
/// running square count alone, so the output always matches the
/// validator's notion of eight squares per row.
#[must_use]
pub fn transcode(placement: &str) -> BoardText {
    let mut writer = RowWriter {
        out: String::with_capacity(BOARD_LEN),
        column: 0,
    };
    writer.out.push_str(BORDER_ROW);
    writer.out.push_str(BORDER_ROW);

    for c in placement.chars() {
        if c.is_ascii_alphabetic() {
            writer.push_square(c);
        } else if let Some(run) = c.to_digit(10) {
            for _ in 0..run {
                writer.push_square(EMPTY_SQUARE);
            }
        }
    }

    let mut out = writer.out;
    out.push_str(BORDER_ROW);
    out.push_str(BORDER_ROW);
    BoardText(out)
}
