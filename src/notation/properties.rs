//! Property-based tests for the validator and transcoder.

use proptest::prelude::*;

use super::{transcode, validate, NotationError};

const PIECES: [char; 12] = ['p', 'n', 'b', 'r', 'q', 'k', 'P', 'N', 'B', 'R', 'Q', 'K'];

/// Strategy producing 64 squares, each empty or holding a piece
fn squares_strategy() -> impl Strategy<Value = Vec<Option<char>>> {
    prop::collection::vec(prop::option::of(prop::sample::select(PIECES.to_vec())), 64)
}

/// Compress one row of squares into notation (digits for empty runs)
fn encode_row(row: &[Option<char>]) -> String {
    let mut out = String::new();
    let mut empty = 0;
    for square in row {
        match square {
            Some(piece) => {
                if empty > 0 {
                    out.push_str(&empty.to_string());
                    empty = 0;
                }
                out.push(*piece);
            }
            None => empty += 1,
        }
    }
    if empty > 0 {
        out.push_str(&empty.to_string());
    }
    out
}

fn encode(squares: &[Option<char>]) -> String {
    squares
        .chunks(8)
        .map(encode_row)
        .collect::<Vec<_>>()
        .join("/")
}

proptest! {
    /// Property: every well-formed placement validates
    #[test]
    fn prop_well_formed_placement_is_valid(squares in squares_strategy()) {
        let fen = format!("{} b KQkq - 0 1", encode(&squares));
        prop_assert!(validate(&fen).is_ok(), "{}", fen);
    }

    /// Property: transcoding keeps every square in place, eight per row
    #[test]
    fn prop_transcode_rows_match_squares(squares in squares_strategy()) {
        let board = transcode(&encode(&squares));
        prop_assert_eq!(board.as_bytes().len(), super::BOARD_LEN);

        let rows: Vec<&str> = board.interior_rows().collect();
        prop_assert_eq!(rows.len(), 8);
        for (row, expected) in rows.iter().zip(squares.chunks(8)) {
            let expected: String = expected.iter().map(|sq| sq.unwrap_or('.')).collect();
            prop_assert_eq!(*row, expected.as_str());
        }
    }

    /// Property: transcoding is deterministic
    #[test]
    fn prop_transcode_deterministic(squares in squares_strategy()) {
        let placement = encode(&squares);
        prop_assert_eq!(transcode(&placement), transcode(&placement));
    }

    /// Property: dropping or adding rows is reported as a row-count error
    #[test]
    fn prop_wrong_row_count(squares in squares_strategy(), rows in 1usize..16) {
        prop_assume!(rows != 8);
        let row = encode_row(&squares[..8]);
        let placement = vec![row; rows].join("/");
        let err = validate(&format!("{placement} b KQkq - 0 1")).unwrap_err();
        let is_row_count = matches!(err, NotationError::RowCount { .. });
        prop_assert!(is_row_count);
    }

    /// Property: splitting an empty run into two digits is caught
    #[test]
    fn prop_adjacent_digits(split in 1u32..8) {
        let row = format!("{}{}", split, 8 - split);
        let placement = [row.as_str(); 8].join("/");
        let err = validate(&format!("{placement} b KQkq - 0 1")).unwrap_err();
        let is_digits = matches!(err, NotationError::SubsequentDigits { .. });
        prop_assert!(is_digits);
    }
}
