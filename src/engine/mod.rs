//! Bundled search engine on a 10x12 mailbox board.
//!
//! Consumes the padded board text produced by the transcoder directly: the
//! text's byte offsets are the engine's square indices.

mod position;
mod pst;
mod searcher;
mod zobrist;

pub use position::{is_playable, Position, A1, A8, H1, H8};
pub use searcher::{SearchIter, Searcher, DEFAULT_MAX_DEPTH, MATE_LOWER, MATE_UPPER};

use crate::notation::BoardText;
use crate::search::{EngineError, PositionSetup, SearchEngine};

/// [`SearchEngine`] backed by the mailbox [`Searcher`].
#[derive(Default)]
pub struct MailboxEngine {
    searcher: Searcher,
}

impl MailboxEngine {
    #[must_use]
    pub fn new(max_depth: u32) -> Self {
        MailboxEngine {
            searcher: Searcher::new(max_depth),
        }
    }

    #[must_use]
    pub fn nodes(&self) -> u64 {
        self.searcher.nodes()
    }
}

impl SearchEngine for MailboxEngine {
    type Position = Position;
    type Search<'a> = SearchIter<'a>;

    fn position(
        &self,
        board: &BoardText,
        setup: &PositionSetup,
    ) -> Result<Position, EngineError> {
        Position::from_board(board, setup)
    }

    fn search(&mut self, position: Position) -> SearchIter<'_> {
        self.searcher.search(position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notation::{transcode, Color};

    #[test]
    fn test_engine_builds_black_position() {
        let engine = MailboxEngine::new(2);
        let board = transcode("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR");
        let pos = engine
            .position(&board, &PositionSetup::initial(Color::Black))
            .unwrap();
        assert_eq!(pos.board()[84], b'P');
        assert_eq!(pos.legal_moves().len(), 20);
    }

    #[test]
    fn test_engine_search_is_bounded_by_max_depth() {
        let mut engine = MailboxEngine::new(3);
        let count = engine.search(Position::start()).count();
        assert_eq!(count, 3);
        assert!(engine.nodes() > 0);
    }
}
