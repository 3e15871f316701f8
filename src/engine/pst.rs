//! Piece-square tables on the 10x12 grid.
//!
//! Values are material plus the positional bonus for a piece of the side to
//! move standing on a square, seen from that side. Off-board entries are 0.

use std::sync::LazyLock;

use crate::notation::{BOARD_LEN, ROW_WIDTH};

/// Material values: pawn, knight, bishop, rook, queen, king.
pub(crate) const MATERIAL: [i32; 6] = [82, 337, 365, 477, 1025, 20000];

/// Middlegame bonuses, a1 first, from the moving side's perspective.
const PST_MG: [[i32; 64]; 6] = [
    [
        0, 0, 0, 0, 0, 0, 0, 0, -35, -1, -20, -23, -15, 24, 38, -22, -26, -4, -4, -10, 3,
        3, 33, -12, -27, -2, -5, 12, 17, 6, 10, -25, -14, 13, 6, 21, 23, 12, 17, -23, -6,
        7, 26, 31, 65, 56, 25, -20, 98, 134, 61, 95, 68, 126, 34, -11, 0, 0, 0, 0, 0, 0, 0,
        0,
    ],
    [
        -105, -21, -58, -33, -17, -28, -19, -23, -29, -53, -12, -3, -1, 18, -14, -19, -23,
        -9, 12, 10, 19, 17, 25, -16, -13, 4, 16, 13, 28, 19, 21, -8, -9, 17, 19, 53, 37,
        69, 18, 22, -47, 60, 37, 65, 84, 129, 73, 44, -73, -41, 72, 36, 23, 62, 7, -17,
        -167, -89, -34, -49, 61, -97, -15, -107,
    ],
    [
        -33, -3, -14, -21, -13, -12, -39, -21, 4, 15, 16, 0, 7, 21, 33, 1, 0, 15, 15, 15,
        14, 27, 18, 10, -6, 13, 13, 26, 34, 12, 10, 4, -4, 5, 19, 50, 37, 37, 7, -2, -16,
        37, 43, 40, 35, 50, 37, -2, -26, 16, -18, -13, 30, 59, 18, -47, -29, 4, -82, -37,
        -25, -42, 7, -8,
    ],
    [
        -19, -13, 1, 17, 16, 7, -37, -26, -44, -16, -20, -9, -1, 11, -6, -71, -45, -25,
        -16, -17, 3, 0, -5, -33, -36, -26, -12, -1, 9, -7, 6, -23, -24, -11, 7, 26, 24, 35,
        -8, -20, -5, 19, 26, 36, 17, 45, 61, 16, 27, 32, 58, 62, 80, 67, 26, 44, 32, 42,
        32, 51, 63, 9, 31, 43,
    ],
    [
        -1, -18, -9, 10, -15, -25, -31, -50, -35, -8, 11, 2, 8, 15, -3, 1, -14, 2, -11, -2,
        -5, 2, 14, 5, -9, -26, -9, -10, -2, -4, 3, -3, -27, -27, -16, -16, -1, 17, -2, 1,
        -13, -17, 7, 8, 29, 56, 47, 57, -24, -39, -5, 1, -16, 57, 28, 54, -28, 0, 29, 12,
        59, 44, 43, 45,
    ],
    [
        -15, 36, 12, -54, 8, -28, 34, 14, 1, 7, -8, -64, -43, -16, 9, 8, -14, -14, -22,
        -46, -44, -30, -15, -27, -49, -1, -27, -39, -46, -44, -33, -51, -17, -20, -12, -27,
        -30, -25, -14, -36, -9, 24, 2, -16, -20, 6, 22, -22, 29, -1, -20, -7, -8, -4, -38,
        -29, -65, 23, 16, -15, -56, -34, 2, 13,
    ],
];

pub(crate) static PST: LazyLock<[[i32; BOARD_LEN]; 6]> = LazyLock::new(|| {
    let mut tables = [[0; BOARD_LEN]; 6];
    for (piece, table) in tables.iter_mut().enumerate() {
        for row in 0..8 {
            for column in 0..8 {
                let index = (row + 2) * ROW_WIDTH + column + 1;
                let rank = 7 - row;
                table[index] = MATERIAL[piece] + PST_MG[piece][rank * 8 + column];
            }
        }
    }
    tables
});

/// Table slot for an uppercase piece letter.
#[inline]
pub(crate) fn piece_index(piece: u8) -> Option<usize> {
    match piece {
        b'P' => Some(0),
        b'N' => Some(1),
        b'B' => Some(2),
        b'R' => Some(3),
        b'Q' => Some(4),
        b'K' => Some(5),
        _ => None,
    }
}

/// Value of an uppercase `piece` on `square`; 0 for anything else.
#[inline]
pub(crate) fn value(piece: u8, square: usize) -> i32 {
    piece_index(piece).map_or(0, |p| PST[p].get(square).copied().unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_padding_is_zero() {
        for piece in 0..6 {
            for index in [0, 10, 20, 29, 30, 100, 119] {
                assert_eq!(PST[piece][index], 0);
            }
        }
    }

    #[test]
    fn test_a1_maps_to_first_table_entry() {
        assert_eq!(value(b'R', 91), MATERIAL[3] + PST_MG[3][0]);
        assert_eq!(value(b'R', 28), MATERIAL[3] + PST_MG[3][63]);
    }

    #[test]
    fn test_advanced_pawn_is_worth_more() {
        // e7 versus e2
        assert!(value(b'P', 35) > value(b'P', 85));
    }

    #[test]
    fn test_non_piece_is_zero() {
        assert_eq!(value(b'.', 55), 0);
        assert_eq!(value(b'p', 55), 0);
    }
}
