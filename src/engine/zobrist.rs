//! Zobrist keys for mailbox positions.
//!
//! Positions are always stored from the mover's point of view, so there is
//! no side-to-move key: the same board seen by either side is the same node.

use std::sync::LazyLock;

use rand::prelude::*;

use crate::notation::BOARD_LEN;

pub(crate) struct ZobristKeys {
    // piece_keys[piece_slot][square], slots 0-5 uppercase PNBRQK, 6-11 lowercase
    pub(crate) piece_keys: [[u64; BOARD_LEN]; 12],
    // castling_keys[0..2] own rights (A1 rook, H1 rook), [2..4] opponent's
    pub(crate) castling_keys: [u64; 4],
    pub(crate) en_passant_keys: [u64; BOARD_LEN],
    pub(crate) king_passant_keys: [u64; BOARD_LEN],
}

impl ZobristKeys {
    fn new() -> Self {
        let mut rng = StdRng::seed_from_u64(1234567890_u64);
        let mut piece_keys = [[0; BOARD_LEN]; 12];
        let mut castling_keys = [0; 4];
        let mut en_passant_keys = [0; BOARD_LEN];
        let mut king_passant_keys = [0; BOARD_LEN];

        for piece in &mut piece_keys {
            for key in piece.iter_mut() {
                *key = rng.gen();
            }
        }
        for key in &mut castling_keys {
            *key = rng.gen();
        }
        for key in &mut en_passant_keys {
            *key = rng.gen();
        }
        for key in &mut king_passant_keys {
            *key = rng.gen();
        }

        ZobristKeys {
            piece_keys,
            castling_keys,
            en_passant_keys,
            king_passant_keys,
        }
    }
}

pub(crate) static ZOBRIST: LazyLock<ZobristKeys> = LazyLock::new(ZobristKeys::new);

/// Key slot for a piece letter of either case.
#[inline]
pub(crate) fn piece_slot(piece: u8) -> Option<usize> {
    let base = super::pst::piece_index(piece.to_ascii_uppercase())?;
    Some(if piece.is_ascii_lowercase() { base + 6 } else { base })
}
