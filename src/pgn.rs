//! Game replay from PGN movetext.
//!
//! Movetext is replayed from the standard starting position on the bundled
//! engine's move generator. Tag pairs, comments, variations, move numbers,
//! NAGs and result markers are skipped; what remains must be SAN moves.

use std::fmt;

use crate::engine::{Position, A8, H8};
use crate::notation::Color;
use crate::search::{parse_square, render_square, Move};

const LAST_INDEX: usize = 119;

/// Error type for movetext replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PgnError {
    /// A `{` comment or `[` tag pair that is never closed
    Unterminated { opening: char },
    /// A `)` without its `(`, or a variation left open at the end
    UnbalancedVariation,
    /// A token that is not a SAN move
    InvalidToken { token: String },
    /// A SAN move that no legal move matches
    IllegalMove { ply: usize, san: String },
    /// A SAN move that more than one legal move matches
    AmbiguousMove { ply: usize, san: String },
}

impl fmt::Display for PgnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PgnError::Unterminated { opening } => {
                write!(f, "Unterminated '{opening}' in movetext")
            }
            PgnError::UnbalancedVariation => write!(f, "Unbalanced variation in movetext"),
            PgnError::InvalidToken { token } => write!(f, "Invalid move token: {token}"),
            PgnError::IllegalMove { ply, san } => write!(f, "Illegal move at ply {ply}: {san}"),
            PgnError::AmbiguousMove { ply, san } => {
                write!(f, "Ambiguous move at ply {ply}: {san}")
            }
        }
    }
}

impl std::error::Error for PgnError {}

/// Split movetext into SAN tokens, dropping everything that is not a move.
pub fn tokenize(movetext: &str) -> Result<Vec<String>, PgnError> {
    let mut tokens = Vec::new();
    let mut chars = movetext.chars().peekable();
    let mut variation_depth = 0usize;

    while let Some(c) = chars.next() {
        match c {
            '[' | '{' => {
                let closing = if c == '[' { ']' } else { '}' };
                if !chars.by_ref().any(|next| next == closing) {
                    return Err(PgnError::Unterminated { opening: c });
                }
            }
            ';' => {
                for next in chars.by_ref() {
                    if next == '\n' {
                        break;
                    }
                }
            }
            '(' => variation_depth += 1,
            ')' => {
                variation_depth = variation_depth
                    .checked_sub(1)
                    .ok_or(PgnError::UnbalancedVariation)?;
            }
            c if c.is_whitespace() => {}
            c => {
                let mut word = String::from(c);
                while let Some(&next) = chars.peek() {
                    if next.is_whitespace() || "[{;()".contains(next) {
                        break;
                    }
                    word.push(next);
                    chars.next();
                }
                if variation_depth == 0 {
                    if let Some(san) = move_token(&word) {
                        tokens.push(san.to_string());
                    }
                }
            }
        }
    }

    if variation_depth != 0 {
        return Err(PgnError::UnbalancedVariation);
    }
    Ok(tokens)
}

/// The SAN part of a word, or `None` for move numbers, NAGs and results.
fn move_token(word: &str) -> Option<&str> {
    if matches!(word, "1-0" | "0-1" | "1/2-1/2" | "*") || word.starts_with('$') {
        return None;
    }
    // "12." and "12..." prefixes, possibly glued to the move
    let san = if word.starts_with(|c: char| c.is_ascii_digit()) && word.contains('.') {
        word.trim_start_matches(|c: char| c.is_ascii_digit())
            .trim_start_matches('.')
    } else {
        word
    };
    let san = san.trim_end_matches(['!', '?', '+', '#']);
    (!san.is_empty()).then_some(san)
}

/// A parsed SAN move, in absolute board-text squares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum San {
    Castle {
        kingside: bool,
    },
    Normal {
        piece: u8,
        from_file: Option<usize>,
        from_rank: Option<usize>,
        to: usize,
        promotion: Option<u8>,
    },
}

impl San {
    fn parse(token: &str) -> Option<San> {
        match token {
            "O-O" | "0-0" => return Some(San::Castle { kingside: true }),
            "O-O-O" | "0-0-0" => return Some(San::Castle { kingside: false }),
            _ => {}
        }

        let (piece, rest) = match *token.as_bytes().first()? {
            p @ (b'N' | b'B' | b'R' | b'Q' | b'K') => (p, &token[1..]),
            _ => (b'P', token),
        };

        let (body, promotion) = match rest.split_once('=') {
            Some((body, promo)) => (body, Some(promotion_piece(promo)?)),
            None => match rest.as_bytes().last() {
                Some(&last) if piece == b'P' && last.is_ascii_uppercase() => {
                    (&rest[..rest.len() - 1], Some(promotion_piece(&rest[rest.len() - 1..])?))
                }
                _ => (rest, None),
            },
        };
        if promotion.is_some() && piece != b'P' {
            return None;
        }

        let body: String = body.chars().filter(|&c| c != 'x').collect();
        if body.len() < 2 || !body.is_ascii() {
            return None;
        }
        let (prefix, square) = body.split_at(body.len() - 2);
        let to = parse_square(square)?;

        let mut from_file = None;
        let mut from_rank = None;
        for byte in prefix.bytes() {
            match byte {
                b'a'..=b'h' if from_file.is_none() && from_rank.is_none() => {
                    from_file = Some(usize::from(byte - b'a'));
                }
                b'1'..=b'8' if from_rank.is_none() => {
                    from_rank = Some(usize::from(byte - b'1'));
                }
                _ => return None,
            }
        }

        Some(San::Normal {
            piece,
            from_file,
            from_rank,
            to,
            promotion,
        })
    }
}

fn promotion_piece(text: &str) -> Option<u8> {
    match text.as_bytes() {
        [p @ (b'N' | b'B' | b'R' | b'Q')] => Some(*p),
        _ => None,
    }
}

/// File index 0..8 of an absolute square.
#[inline]
fn file_of(square: usize) -> usize {
    square % 10 - 1
}

/// Rank index 0..8 (rank 1 = 0) of an absolute square.
#[inline]
fn rank_of(square: usize) -> usize {
    9 - square / 10
}

/// A game in progress, replayed move by move.
#[derive(Debug, Clone)]
pub struct Game {
    position: Position,
    side: Color,
    halfmove_clock: u32,
    fullmove_number: u32,
    ply: usize,
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl Game {
    /// A game at the standard starting position.
    #[must_use]
    pub fn new() -> Self {
        Game {
            position: Position::start(),
            side: Color::White,
            halfmove_clock: 0,
            fullmove_number: 1,
            ply: 0,
        }
    }

    /// Engine position, seen from the side to move.
    #[must_use]
    pub fn position(&self) -> &Position {
        &self.position
    }

    #[must_use]
    pub fn side_to_move(&self) -> Color {
        self.side
    }

    /// Half-moves played so far.
    #[must_use]
    pub fn ply(&self) -> usize {
        self.ply
    }

    /// Absolute board-text square of a mover-frame index.
    fn absolute(&self, index: usize) -> usize {
        match self.side {
            Color::White => index,
            Color::Black => LAST_INDEX - index,
        }
    }

    /// Play one SAN move.
    pub fn play_san(&mut self, san: &str) -> Result<(), PgnError> {
        let parsed = San::parse(san).ok_or_else(|| PgnError::InvalidToken {
            token: san.to_string(),
        })?;
        let ply = self.ply + 1;
        let (mv, promotion) = self.resolve(parsed).map_err(|count| {
            let san = san.to_string();
            if count == 0 {
                PgnError::IllegalMove { ply, san }
            } else {
                PgnError::AmbiguousMove { ply, san }
            }
        })?;

        let board = self.position.board();
        let resets_clock = board[mv.from()] == b'P' || board[mv.to()].is_ascii_lowercase();

        self.position = self.position.play(mv, promotion);
        self.halfmove_clock = if resets_clock {
            0
        } else {
            self.halfmove_clock.saturating_add(1)
        };
        if self.side == Color::Black {
            self.fullmove_number = self.fullmove_number.saturating_add(1);
        }
        self.side = self.side.opposite();
        self.ply = ply;
        Ok(())
    }

    /// Find the single legal move matching `san`; on failure, the number of
    /// matches found.
    fn resolve(&self, san: San) -> Result<(Move, u8), usize> {
        let board = self.position.board();
        let mut matching: Vec<(Move, u8)> = Vec::new();

        for mv in self.position.legal_moves() {
            let piece = board[mv.from()];
            let from = self.absolute(mv.from());
            let to = self.absolute(mv.to());
            let castles = piece == b'K' && from.abs_diff(to) == 2;

            let found = match san {
                San::Castle { kingside } => castles && (to > from) == kingside,
                San::Normal {
                    piece: wanted,
                    from_file,
                    from_rank,
                    to: target,
                    promotion,
                } => {
                    let promotes = piece == b'P' && (A8..=H8).contains(&mv.to());
                    // A pawn without a file prefix is a push, never a capture
                    let from_file = match wanted {
                        b'P' => from_file.or(Some(file_of(target))),
                        _ => from_file,
                    };
                    piece == wanted
                        && !castles
                        && to == target
                        && from_file.map_or(true, |file| file == file_of(from))
                        && from_rank.map_or(true, |rank| rank == rank_of(from))
                        && (promotes || promotion.is_none())
                }
            };
            if found {
                let promotion = match san {
                    San::Normal {
                        promotion: Some(p), ..
                    } => p,
                    _ => b'Q',
                };
                matching.push((mv, promotion));
            }
        }

        match matching.as_slice() {
            [single] => Ok(*single),
            _ => Err(matching.len()),
        }
    }

    /// The position seen from white, for export.
    fn white_frame(&self) -> Position {
        match self.side {
            Color::White => self.position.clone(),
            Color::Black => self.position.rotate(),
        }
    }

    /// Piece-placement field of the current position.
    #[must_use]
    pub fn placement(&self) -> String {
        let position = self.white_frame();
        let board = position.board();
        let mut placement = String::with_capacity(72);
        for row in 2..=9 {
            if row > 2 {
                placement.push('/');
            }
            let mut empty = 0u8;
            for column in 1..=8 {
                let byte = board[row * 10 + column];
                if byte == b'.' {
                    empty += 1;
                    continue;
                }
                if empty > 0 {
                    placement.push(char::from(b'0' + empty));
                    empty = 0;
                }
                placement.push(char::from(byte));
            }
            if empty > 0 {
                placement.push(char::from(b'0' + empty));
            }
        }
        placement
    }

    /// Castling field, `-` when no side may castle.
    #[must_use]
    pub fn castling(&self) -> String {
        let position = self.white_frame();
        let [white_queen, white_king] = position.castling();
        let [black_king, black_queen] = position.opponent_castling();
        let field: String = [
            (white_king, 'K'),
            (white_queen, 'Q'),
            (black_king, 'k'),
            (black_queen, 'q'),
        ]
        .iter()
        .filter(|(right, _)| *right)
        .map(|&(_, c)| c)
        .collect();
        if field.is_empty() {
            "-".to_string()
        } else {
            field
        }
    }

    /// En passant target square after a double pawn push.
    #[must_use]
    pub fn en_passant(&self) -> Option<String> {
        match self.position.en_passant() {
            0 => None,
            square => render_square(self.absolute(square)),
        }
    }

    /// Full six-field notation of the current position.
    #[must_use]
    pub fn to_notation(&self) -> String {
        format!(
            "{} {} {} {} {} {}",
            self.placement(),
            self.side,
            self.castling(),
            self.en_passant().as_deref().unwrap_or("-"),
            self.halfmove_clock,
            self.fullmove_number
        )
    }
}

/// Replay movetext from the starting position.
///
/// # Example
/// ```
/// use chess_move_api::pgn::replay;
///
/// let game = replay("1. e4 e5 2. Nf3").unwrap();
/// assert_eq!(
///     game.to_notation(),
///     "rnbqkbnr/pppp1ppp/8/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq - 1 2"
/// );
/// ```
pub fn replay(movetext: &str) -> Result<Game, PgnError> {
    let mut game = Game::new();
    for token in tokenize(movetext)? {
        game.play_san(&token)?;
    }
    Ok(game)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notation::validate;

    #[test]
    fn test_empty_movetext_is_start_position() {
        let game = replay("").unwrap();
        assert_eq!(
            game.to_notation(),
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
        );
    }

    #[test]
    fn test_double_push_sets_en_passant() {
        let game = replay("1. e4").unwrap();
        assert_eq!(
            game.to_notation(),
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1"
        );
        assert_eq!(game.side_to_move(), Color::Black);
    }

    #[test]
    fn test_black_double_push_en_passant() {
        let game = replay("1. e4 d5").unwrap();
        assert_eq!(game.en_passant().as_deref(), Some("d6"));
    }

    #[test]
    fn test_skips_tags_comments_and_variations() {
        let movetext = r#"[Event "Casual"]
[White "A"]

1. e4 {best by test} e5 (1... c5 2. Nf3 (2. c3)) 2. Nf3! $1 ; king's knight
Nc6?! 1-0"#;
        let game = replay(movetext).unwrap();
        assert_eq!(game.ply(), 4);
        assert_eq!(game.side_to_move(), Color::White);
        assert_eq!(
            game.placement(),
            "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R"
        );
    }

    #[test]
    fn test_glued_move_numbers() {
        let game = replay("1.e4 e5 2.Nf3 2...Nc6").unwrap();
        assert_eq!(game.ply(), 4);
    }

    #[test]
    fn test_capture_resets_halfmove_clock() {
        let game = replay("1. e4 d5 2. Nc3 Nf6 3. exd5").unwrap();
        assert!(game.to_notation().ends_with(" 0 3"));
        let game = replay("1. Nf3 Nf6 2. Ng1").unwrap();
        assert!(game.to_notation().ends_with(" 3 2"));
    }

    #[test]
    fn test_castling_both_sides() {
        let game = replay("1. e4 e5 2. Nf3 Nf6 3. Bc4 Bc5 4. O-O 0-0").unwrap();
        assert_eq!(
            game.placement(),
            "rnbq1rk1/pppp1ppp/5n2/2b1p3/2B1P3/5N2/PPPP1PPP/RNBQ1RK1"
        );
        assert_eq!(game.castling(), "-");
    }

    #[test]
    fn test_queenside_castling() {
        let game = replay("1. d4 d5 2. Nc3 Nc6 3. Bf4 Bf5 4. Qd2 Qd7 5. O-O-O O-O-O").unwrap();
        assert_eq!(
            game.placement(),
            "2kr1bnr/pppqpppp/2n5/3p1b2/3P1B2/2N5/PPPQPPPP/2KR1BNR"
        );
    }

    #[test]
    fn test_rook_move_drops_one_right() {
        let game = replay("1. h4 a5 2. Rh3 Ra6").unwrap();
        assert_eq!(game.castling(), "Qk");
    }

    #[test]
    fn test_disambiguation_by_file() {
        // Both knights can reach d2
        let game = replay("1. d4 d5 2. Nf3 Nf6 3. e3 e6 4. Nbd2").unwrap();
        assert_eq!(game.position().rotate().board()[84], b'N');
        let err = replay("1. d4 d5 2. Nf3 Nf6 3. e3 e6 4. Nd2").unwrap_err();
        assert_eq!(
            err,
            PgnError::AmbiguousMove {
                ply: 7,
                san: "Nd2".to_string()
            }
        );
    }

    #[test]
    fn test_promotion_and_underpromotion() {
        let line = "1. h4 g5 2. hxg5 h6 3. gxh6 Bg7 4. hxg7 Nf6";
        let queen = replay(&format!("{line} 5. gxh8=Q")).unwrap();
        assert!(queen.placement().ends_with("RNBQKBNR"));
        assert!(queen.placement().starts_with("rnbqk2Q"));

        let knight = replay(&format!("{line} 5. gxh8=N")).unwrap();
        assert!(knight.placement().starts_with("rnbqk2N"));
    }

    #[test]
    fn test_illegal_move_reports_ply() {
        let err = replay("1. e4 e5 2. Ke3").unwrap_err();
        assert_eq!(
            err,
            PgnError::IllegalMove {
                ply: 3,
                san: "Ke3".to_string()
            }
        );
    }

    #[test]
    fn test_move_into_check_is_illegal() {
        // e3 is covered by the c5 bishop
        let err = replay("1. e4 e5 2. Ke2 Bc5 3. Ke3").unwrap_err();
        assert!(matches!(err, PgnError::IllegalMove { ply: 5, .. }));
    }

    #[test]
    fn test_invalid_token() {
        let err = replay("1. e4 hello").unwrap_err();
        assert_eq!(
            err,
            PgnError::InvalidToken {
                token: "hello".to_string()
            }
        );
    }

    #[test]
    fn test_unbalanced_input() {
        assert_eq!(
            replay("1. e4 {open").unwrap_err(),
            PgnError::Unterminated { opening: '{' }
        );
        assert_eq!(
            replay("[Event \"x\"").unwrap_err(),
            PgnError::Unterminated { opening: '[' }
        );
        assert_eq!(replay("1. e4 (e5").unwrap_err(), PgnError::UnbalancedVariation);
        assert_eq!(replay("1. e4 e5)").unwrap_err(), PgnError::UnbalancedVariation);
    }

    #[test]
    fn test_exported_notation_validates() {
        let game = replay("1. e4 c5 2. Nf3 d6 3. d4 cxd4 4. Nxd4 Nf6 5. Nc3").unwrap();
        let notation = validate(&game.to_notation()).unwrap();
        assert_eq!(notation.active_color(), Color::Black);
        assert_eq!(notation.fullmove_number(), 5);
    }

    #[test]
    fn test_en_passant_capture() {
        let game = replay("1. e4 a6 2. e5 d5 3. exd6").unwrap();
        assert_eq!(
            game.placement(),
            "rnbqkbnr/1pp1pppp/p2P4/8/8/8/PPPP1PPP/RNBQKBNR"
        );
    }

    #[test]
    fn test_display() {
        let err = PgnError::IllegalMove {
            ply: 3,
            san: "Ke3".to_string(),
        };
        assert_eq!(err.to_string(), "Illegal move at ply 3: Ke3");
    }
}
