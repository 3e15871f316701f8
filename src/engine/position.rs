//! 10x12 mailbox position, always seen from the side to move.
//!
//! Uppercase letters are the mover's pieces and the mover's pawns advance
//! towards index 0. After every move the board is rotated 180 degrees with
//! cases swapped, so the opponent becomes the mover.

use crate::notation::{BoardText, Color, BOARD_LEN, ROW_WIDTH};
use crate::search::{EngineError, Move, PositionSetup};

use super::pst;
use super::zobrist::{piece_slot, ZOBRIST};

pub const A1: usize = 91;
pub const H1: usize = 98;
pub const A8: usize = 21;
pub const H8: usize = 28;

const LAST_INDEX: usize = BOARD_LEN - 1;

const N: isize = -10;
const E: isize = 1;
const S: isize = 10;
const W: isize = -1;

const PAWN_DIRS: [isize; 4] = [N, N + N, N + W, N + E];
const KNIGHT_DIRS: [isize; 8] = [
    N + N + E,
    E + N + E,
    E + S + E,
    S + S + E,
    S + S + W,
    W + S + W,
    W + N + W,
    N + N + W,
];
const BISHOP_DIRS: [isize; 4] = [N + E, S + E, S + W, N + W];
const ROOK_DIRS: [isize; 4] = [N, E, S, W];
const ROYAL_DIRS: [isize; 8] = [N, E, S, W, N + E, S + E, S + W, N + W];

/// Board text of the standard starting position.
const START_BOARD: &[u8; BOARD_LEN] = b"         \n         \n rnbqkbnr\n pppppppp\n ........\n ........\n ........\n ........\n PPPPPPPP\n RNBQKBNR\n         \n         \n";

fn directions(piece: u8) -> &'static [isize] {
    match piece {
        b'P' => &PAWN_DIRS,
        b'N' => &KNIGHT_DIRS,
        b'B' => &BISHOP_DIRS,
        b'R' => &ROOK_DIRS,
        b'Q' | b'K' => &ROYAL_DIRS,
        _ => &[],
    }
}

/// True for the 64 board squares, false for border and sentinel indices.
#[inline]
#[must_use]
pub fn is_playable(index: usize) -> bool {
    let row = index / ROW_WIDTH;
    let column = index % ROW_WIDTH;
    (2..=9).contains(&row) && (1..=8).contains(&column)
}

#[inline]
fn swap_case(byte: u8) -> u8 {
    if byte.is_ascii_uppercase() {
        byte.to_ascii_lowercase()
    } else {
        byte.to_ascii_uppercase()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Position {
    board: [u8; BOARD_LEN],
    /// Incremental evaluation from the mover's point of view
    score: i32,
    /// Mover's rights: rook starting on A1, rook starting on H1
    castling: [bool; 2],
    /// Opponent's rights, indexed in the opponent's own frame
    opponent_castling: [bool; 2],
    /// En passant target square, 0 when none
    ep: usize,
    /// Square the opponent's king crossed while castling, 0 when none
    kp: usize,
}

impl Position {
    /// Build a position from transcoded board text.
    ///
    /// The text is always in white's orientation; a black-to-move position is
    /// rotated so that black becomes the uppercase mover.
    pub fn from_board(board: &BoardText, setup: &PositionSetup) -> Result<Self, EngineError> {
        let bytes = board.as_bytes();
        if bytes.len() != BOARD_LEN {
            return Err(EngineError::WrongLength { len: bytes.len() });
        }

        let mut squares = [b' '; BOARD_LEN];
        for (index, &byte) in bytes.iter().enumerate() {
            let fits = if is_playable(index) {
                byte == b'.' || piece_slot(byte).is_some()
            } else {
                byte.is_ascii_whitespace()
            };
            if !fits {
                return Err(EngineError::MisplacedByte { index, byte });
            }
            squares[index] = byte;
        }

        Ok(Self::assemble(squares, setup))
    }

    /// The standard starting position, white to move.
    #[must_use]
    pub fn start() -> Self {
        Self::assemble(*START_BOARD, &PositionSetup::initial(Color::White))
    }

    fn assemble(board: [u8; BOARD_LEN], setup: &PositionSetup) -> Self {
        let passant = |square: usize| if is_playable(square) { square } else { 0 };
        let rights = setup.castling;
        let mut position = Position {
            board,
            score: 0,
            castling: [rights.white_queen, rights.white_king],
            opponent_castling: [rights.black_king, rights.black_queen],
            ep: passant(setup.en_passant),
            kp: passant(setup.king_passant),
        };
        position.score = position.evaluate();
        match setup.side_to_move {
            Color::White => position,
            Color::Black => position.rotate(),
        }
    }

    fn evaluate(&self) -> i32 {
        self.board
            .iter()
            .enumerate()
            .map(|(index, &byte)| {
                if byte.is_ascii_uppercase() {
                    pst::value(byte, index)
                } else if byte.is_ascii_lowercase() {
                    -pst::value(byte.to_ascii_uppercase(), LAST_INDEX - index)
                } else {
                    0
                }
            })
            .sum()
    }

    #[inline]
    #[must_use]
    pub fn board(&self) -> &[u8; BOARD_LEN] {
        &self.board
    }

    #[inline]
    #[must_use]
    pub fn score(&self) -> i32 {
        self.score
    }

    /// Mover's castling rights (A1 rook, H1 rook).
    #[inline]
    #[must_use]
    pub fn castling(&self) -> [bool; 2] {
        self.castling
    }

    /// Opponent's castling rights in their own frame.
    #[inline]
    #[must_use]
    pub fn opponent_castling(&self) -> [bool; 2] {
        self.opponent_castling
    }

    #[inline]
    #[must_use]
    pub fn en_passant(&self) -> usize {
        self.ep
    }

    #[inline]
    #[must_use]
    pub fn king_passant(&self) -> usize {
        self.kp
    }

    /// Hand the move to the opponent: flip the board and swap the sides.
    #[must_use]
    pub fn rotate(&self) -> Self {
        self.rotated(false)
    }

    /// Rotate without keeping en passant or king passant state.
    #[must_use]
    pub fn null_move(&self) -> Self {
        self.rotated(true)
    }

    fn rotated(&self, clear_passant: bool) -> Self {
        let mut board = [b' '; BOARD_LEN];
        for (index, &byte) in self.board.iter().enumerate() {
            board[LAST_INDEX - index] = swap_case(byte);
        }
        let flip = |square: usize| {
            if square == 0 || clear_passant {
                0
            } else {
                LAST_INDEX - square
            }
        };
        Position {
            board,
            score: -self.score,
            castling: self.opponent_castling,
            opponent_castling: self.castling,
            ep: flip(self.ep),
            kp: flip(self.kp),
        }
    }

    /// True when a diagonal pawn step to `square` captures something that is
    /// not on it: the en passant victim or a king that just castled.
    #[inline]
    fn is_passant_target(&self, square: usize) -> bool {
        (self.ep != 0 && square == self.ep) || (self.kp != 0 && square.abs_diff(self.kp) < 2)
    }

    /// Pseudo-legal moves for the mover. Castling is encoded as a two-square
    /// king move; promotion is implied by a pawn reaching the far rank.
    #[must_use]
    pub fn gen_moves(&self) -> Vec<Move> {
        let mut moves = Vec::with_capacity(48);
        for (from, &piece) in self.board.iter().enumerate() {
            if !piece.is_ascii_uppercase() {
                continue;
            }
            for &dir in directions(piece) {
                let mut to = from;
                loop {
                    to = match to.checked_add_signed(dir) {
                        Some(next) if next < BOARD_LEN => next,
                        _ => break,
                    };
                    let target = self.board[to];
                    if target.is_ascii_whitespace() || target.is_ascii_uppercase() {
                        break;
                    }
                    if piece == b'P' {
                        if (dir == N || dir == N + N) && target != b'.' {
                            break;
                        }
                        if dir == N + N && (from < A1 - 10 || self.board[from - 10] != b'.') {
                            break;
                        }
                        if (dir == N + W || dir == N + E)
                            && target == b'.'
                            && !self.is_passant_target(to)
                        {
                            break;
                        }
                    }
                    moves.push(Move::new(from, to));
                    if matches!(piece, b'P' | b'N' | b'K') || target.is_ascii_lowercase() {
                        break;
                    }
                    // A rook sliding up to its own king offers the castling move.
                    if from == A1 && self.board[to + 1] == b'K' && self.castling[0] {
                        moves.push(Move::new(to + 1, to - 1));
                    }
                    if from == H1 && self.board[to - 1] == b'K' && self.castling[1] {
                        moves.push(Move::new(to - 1, to + 1));
                    }
                }
            }
        }
        moves
    }

    /// Play a move (queening on promotion) and return the rotated result.
    #[must_use]
    pub fn make_move(&self, mv: Move) -> Self {
        self.play(mv, b'Q')
    }

    /// Play a move, promoting to the uppercase `promotion` piece if a pawn
    /// reaches the far rank.
    #[must_use]
    pub fn play(&self, mv: Move, promotion: u8) -> Self {
        let (from, to) = (mv.from(), mv.to());
        let piece = self.board[from];
        let mut next = Position {
            board: self.board,
            score: self.score + self.value_with(mv, promotion),
            castling: self.castling,
            opponent_castling: self.opponent_castling,
            ep: 0,
            kp: 0,
        };
        next.board[to] = piece;
        next.board[from] = b'.';

        if from == A1 {
            next.castling[0] = false;
        }
        if from == H1 {
            next.castling[1] = false;
        }
        // Squares of the opponent's rooks, seen through the rotation
        if to == A8 {
            next.opponent_castling[1] = false;
        }
        if to == H8 {
            next.opponent_castling[0] = false;
        }

        if piece == b'K' {
            next.castling = [false, false];
            if from.abs_diff(to) == 2 {
                next.kp = (from + to) / 2;
                next.board[if to < from { A1 } else { H1 }] = b'.';
                next.board[next.kp] = b'R';
            }
        }

        if piece == b'P' {
            if (A8..=H8).contains(&to) {
                next.board[to] = promotion;
            }
            if from == to + 20 {
                next.ep = from - 10;
            }
            if self.ep != 0 && to == self.ep {
                next.board[to + 10] = b'.';
            }
        }

        next.rotate()
    }

    /// Score change of a move for the mover, assuming queen promotion.
    #[must_use]
    pub fn value(&self, mv: Move) -> i32 {
        self.value_with(mv, b'Q')
    }

    fn value_with(&self, mv: Move, promotion: u8) -> i32 {
        let (from, to) = (mv.from(), mv.to());
        let piece = self.board[from];
        let target = self.board[to];

        let mut score = pst::value(piece, to) - pst::value(piece, from);
        if target.is_ascii_lowercase() {
            score += pst::value(target.to_ascii_uppercase(), LAST_INDEX - to);
        }
        if self.kp != 0 && to.abs_diff(self.kp) < 2 {
            score += pst::value(b'K', LAST_INDEX - to);
        }
        if piece == b'K' && from.abs_diff(to) == 2 {
            score += pst::value(b'R', (from + to) / 2);
            score -= pst::value(b'R', if to < from { A1 } else { H1 });
        }
        if piece == b'P' {
            if (A8..=H8).contains(&to) {
                score += pst::value(promotion, to) - pst::value(b'P', to);
            }
            if self.ep != 0 && to == self.ep {
                score += pst::value(b'P', LAST_INDEX - (to + 10));
            }
        }
        score
    }

    /// True when the mover could take the opponent's king, including a king
    /// that castled out of or through an attacked square.
    #[must_use]
    pub fn can_capture_king(&self) -> bool {
        self.gen_moves().into_iter().any(|mv| {
            self.board[mv.to()] == b'k' || (self.kp != 0 && mv.to().abs_diff(self.kp) < 2)
        })
    }

    /// Moves that do not leave the mover's king capturable.
    #[must_use]
    pub fn legal_moves(&self) -> Vec<Move> {
        self.gen_moves()
            .into_iter()
            .filter(|&mv| !self.make_move(mv).can_capture_king())
            .collect()
    }

    /// True when the mover has a piece other than pawns and king.
    #[must_use]
    pub fn has_officers(&self) -> bool {
        self.board
            .iter()
            .any(|&byte| matches!(byte, b'N' | b'B' | b'R' | b'Q'))
    }

    /// Zobrist key of the position.
    #[must_use]
    pub fn key(&self) -> u64 {
        let keys = &*ZOBRIST;
        let mut hash = 0;
        for (index, &byte) in self.board.iter().enumerate() {
            if let Some(slot) = piece_slot(byte) {
                hash ^= keys.piece_keys[slot][index];
            }
        }
        let rights = self.castling.iter().chain(self.opponent_castling.iter());
        for (i, &right) in rights.enumerate() {
            if right {
                hash ^= keys.castling_keys[i];
            }
        }
        if self.ep != 0 {
            hash ^= keys.en_passant_keys[self.ep];
        }
        if self.kp != 0 {
            hash ^= keys.king_passant_keys[self.kp];
        }
        hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notation::transcode;
    use crate::search::CastlingRights;

    fn position(placement: &str, side: Color) -> Position {
        let setup = PositionSetup {
            side_to_move: side,
            castling: CastlingRights::NONE,
            en_passant: 0,
            king_passant: 0,
        };
        Position::from_board(&transcode(placement), &setup).unwrap()
    }

    #[test]
    fn test_start_matches_transcoded_start() {
        let board = transcode("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR");
        let parsed = Position::from_board(&board, &PositionSetup::initial(Color::White)).unwrap();
        assert_eq!(parsed, Position::start());
    }

    #[test]
    fn test_start_position_moves() {
        let start = Position::start();
        assert_eq!(start.gen_moves().len(), 20);
        assert_eq!(start.legal_moves().len(), 20);
    }

    #[test]
    fn test_rotate_twice_is_identity() {
        let start = Position::start();
        assert_eq!(start.rotate().rotate(), start);
        assert_eq!(start.rotate().score(), -start.score());
    }

    #[test]
    fn test_black_to_move_is_rotated() {
        let board = transcode("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR");
        let black = Position::from_board(&board, &PositionSetup::initial(Color::Black)).unwrap();
        // e7 pawn seen from black's side
        assert_eq!(black.board()[84], b'P');
        assert!(black.gen_moves().contains(&Move::new(84, 64)));
        assert!(black.gen_moves().contains(&Move::new(84, 74)));
    }

    #[test]
    fn test_from_board_wrong_length() {
        // Border rows only
        let board = transcode("");
        let result = Position::from_board(&board, &PositionSetup::initial(Color::White));
        assert_eq!(result, Err(EngineError::WrongLength { len: 40 }));
    }

    #[test]
    fn test_from_board_misplaced_byte() {
        let board = transcode("8/8/8/8/8/8/8/7x");
        let result = Position::from_board(&board, &PositionSetup::initial(Color::White));
        assert!(matches!(result, Err(EngineError::MisplacedByte { .. })));
    }

    #[test]
    fn test_castling_moves() {
        let setup = PositionSetup::initial(Color::White);
        let pos = Position::from_board(&transcode("r3k2r/8/8/8/8/8/8/R3K2R"), &setup).unwrap();
        let moves = pos.legal_moves();
        assert!(moves.contains(&Move::new(95, 97)));
        assert!(moves.contains(&Move::new(95, 93)));

        let after = pos.make_move(Move::new(95, 97)).rotate();
        assert_eq!(after.board()[97], b'K');
        assert_eq!(after.board()[96], b'R');
        assert_eq!(after.board()[98], b'.');
        assert_eq!(after.castling(), [false, false]);
    }

    #[test]
    fn test_castling_through_attack_is_illegal() {
        let setup = PositionSetup::initial(Color::White);
        // Black rook on f8 covers f1
        let pos = Position::from_board(&transcode("4kr2/8/8/8/8/8/8/4K2R"), &setup).unwrap();
        assert!(pos.gen_moves().contains(&Move::new(95, 97)));
        assert!(!pos.legal_moves().contains(&Move::new(95, 97)));
    }

    #[test]
    fn test_en_passant_capture() {
        let setup = PositionSetup {
            side_to_move: Color::White,
            castling: CastlingRights::NONE,
            en_passant: 44,
            king_passant: 0,
        };
        let pos = Position::from_board(&transcode("4k3/8/8/3pP3/8/8/8/4K3"), &setup).unwrap();
        assert!(pos.gen_moves().contains(&Move::new(55, 44)));

        let after = pos.make_move(Move::new(55, 44)).rotate();
        assert_eq!(after.board()[44], b'P');
        assert_eq!(after.board()[54], b'.');
    }

    #[test]
    fn test_double_push_sets_en_passant() {
        let after = Position::start().make_move(Move::new(85, 65));
        // e3 seen from black's side
        assert_eq!(after.en_passant(), 119 - 75);
    }

    #[test]
    fn test_promotion() {
        let pos = position("8/P3k3/8/8/8/8/8/4K3", Color::White);
        let queen = pos.make_move(Move::new(31, 21)).rotate();
        assert_eq!(queen.board()[21], b'Q');
        let knight = pos.play(Move::new(31, 21), b'N').rotate();
        assert_eq!(knight.board()[21], b'N');
        assert!(queen.score() > knight.score());
    }

    #[test]
    fn test_pinned_piece_has_no_legal_moves() {
        let pos = position("4k3/4r3/8/8/8/8/4B3/4K3", Color::White);
        assert!(pos.gen_moves().iter().any(|mv| mv.from() == 85));
        assert!(!pos.legal_moves().iter().any(|mv| mv.from() == 85));
    }

    #[test]
    fn test_capture_updates_score() {
        let pos = position("4k3/8/8/3q4/4P3/8/8/4K3", Color::White);
        let capture = Move::new(65, 54);
        assert!(pos.value(capture) > 1000);
        assert_eq!(pos.make_move(capture).score(), -(pos.score() + pos.value(capture)));
    }

    #[test]
    fn test_key_distinguishes_positions() {
        let start = Position::start();
        let moved = start.make_move(Move::new(85, 65));
        assert_ne!(start.key(), moved.key());
        assert_eq!(start.key(), Position::start().key());
    }

    #[test]
    fn test_has_officers() {
        assert!(Position::start().has_officers());
        assert!(!position("4k3/pppp4/8/8/8/8/PPPP4/4K3", Color::White).has_officers());
    }
}
