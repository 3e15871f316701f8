//! Request handling, independent of the transport.
//!
//! A FEN request is validated, checked for the side to move, transcoded and
//! handed to the search driver. A PGN request is replayed first and then
//! follows the same path from the placement onwards.

use std::fmt;
use std::time::Duration;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::config::ServiceConfig;
use crate::engine::MailboxEngine;
use crate::notation::{self, check_placement, transcode, Color, NotationError};
use crate::pgn::{self, PgnError};
use crate::search::{BestMove, SearchDriver, SearchError, ENGINE_SIDE};

pub const FEN_FIELD: &str = "fen";
pub const PGN_FIELD: &str = "pgn";

const FEN_REMEDY: &str =
    "Please specify the state of the chessboard using Forsyth–Edwards Notation (FEN).";
const PGN_REMEDY: &str =
    "Please specify the moves of the game using Portable Game Notation (PGN) movetext.";

/// Coarse classification of a [`RequestError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// Input absent or not shaped like notation at all
    Format,
    /// Well-shaped notation breaking a placement rule
    Structural,
    /// Valid input the service will not act on
    Semantic,
    /// The engine failed to produce a move
    Upstream,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    MissingField { field: &'static str },
    Notation(NotationError),
    /// White is to move; the service only plays black
    WrongSideToMove,
    Pgn(PgnError),
    Search(SearchError),
}

impl RequestError {
    #[must_use]
    pub fn kind(&self) -> RequestKind {
        match self {
            RequestError::MissingField { .. } => RequestKind::Format,
            RequestError::Notation(e) => match e.kind() {
                notation::ErrorKind::Format => RequestKind::Format,
                notation::ErrorKind::Structural => RequestKind::Structural,
            },
            RequestError::Pgn(PgnError::IllegalMove { .. } | PgnError::AmbiguousMove { .. })
            | RequestError::WrongSideToMove => RequestKind::Semantic,
            RequestError::Pgn(_) => RequestKind::Format,
            RequestError::Search(_) => RequestKind::Upstream,
        }
    }
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::MissingField { field } => write!(f, "No '{field}' field provided."),
            RequestError::Notation(e) => write!(f, "{e}"),
            RequestError::WrongSideToMove => write!(
                f,
                "The white player is supposed to make a move. The computer is playing with the black pieces!"
            ),
            RequestError::Pgn(e) => write!(f, "{e}"),
            RequestError::Search(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for RequestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RequestError::Notation(e) => Some(e),
            RequestError::Pgn(e) => Some(e),
            RequestError::Search(e) => Some(e),
            _ => None,
        }
    }
}

impl From<NotationError> for RequestError {
    fn from(e: NotationError) -> Self {
        RequestError::Notation(e)
    }
}

impl From<PgnError> for RequestError {
    fn from(e: PgnError) -> Self {
        RequestError::Pgn(e)
    }
}

impl From<SearchError> for RequestError {
    fn from(e: SearchError) -> Self {
        RequestError::Search(e)
    }
}

/// JSON body returned for every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ApiResponse {
    Move {
        #[serde(rename = "move")]
        mv: String,
    },
    Error {
        error: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        remedy: Option<String>,
    },
}

impl ApiResponse {
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, ApiResponse::Error { .. })
    }

    /// Serialized body.
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| String::from("{}"))
    }
}

impl From<&BestMove> for ApiResponse {
    fn from(best: &BestMove) -> Self {
        ApiResponse::Move {
            mv: best.to_string(),
        }
    }
}

impl From<&RequestError> for ApiResponse {
    fn from(e: &RequestError) -> Self {
        let (error, reason, remedy) = match e {
            RequestError::MissingField { field } => {
                let remedy = if *field == PGN_FIELD {
                    PGN_REMEDY
                } else {
                    FEN_REMEDY
                };
                (e.to_string(), None, Some(remedy.to_string()))
            }
            RequestError::Notation(inner) => (
                "Incorrect Forsyth–Edwards Notation (FEN) for the board state".to_string(),
                Some(inner.to_string()),
                None,
            ),
            RequestError::WrongSideToMove => (e.to_string(), None, None),
            RequestError::Pgn(inner) => (
                "Incorrect Portable Game Notation (PGN) for the game".to_string(),
                Some(inner.to_string()),
                None,
            ),
            RequestError::Search(SearchError::NoLegalMove) => (
                "No legal move available".to_string(),
                Some(SearchError::NoLegalMove.to_string()),
                None,
            ),
            RequestError::Search(inner) => (
                "The engine failed to produce a move".to_string(),
                Some(inner.to_string()),
                None,
            ),
        };
        ApiResponse::Error {
            error,
            reason,
            remedy,
        }
    }
}

/// Answers move requests. Every call runs on a fresh engine, so a service
/// can be shared between threads.
#[derive(Debug, Clone)]
pub struct MoveService {
    think_time: Duration,
    max_depth: u32,
}

impl MoveService {
    #[must_use]
    pub fn new(config: &ServiceConfig) -> Self {
        Self::with_limits(config.think_time, config.max_depth)
    }

    #[must_use]
    pub fn with_limits(think_time: Duration, max_depth: u32) -> Self {
        MoveService {
            think_time,
            max_depth,
        }
    }

    #[must_use]
    pub fn think_time(&self) -> Duration {
        self.think_time
    }

    /// Best reply for black to a position in notation.
    pub fn best_move_for_fen(&self, fen: &str) -> Result<BestMove, RequestError> {
        let notation = notation::validate(fen)?;
        self.reply(notation.placement(), notation.active_color())
    }

    /// Best reply for black after replaying `movetext`, with the notation of
    /// the replayed position.
    pub fn best_move_for_pgn(&self, movetext: &str) -> Result<(String, BestMove), RequestError> {
        let game = pgn::replay(movetext)?;
        let placement = game.placement();
        check_placement(&placement)?;
        let best = self.reply(&placement, game.side_to_move())?;
        Ok((game.to_notation(), best))
    }

    fn reply(&self, placement: &str, side: Color) -> Result<BestMove, RequestError> {
        if side != ENGINE_SIDE {
            return Err(RequestError::WrongSideToMove);
        }
        let board = transcode(placement);
        let mut engine = MailboxEngine::new(self.max_depth);
        let driver = SearchDriver::new(self.think_time);
        let best = driver.find_move(&mut engine, &board)?;
        info!(
            "move {} depth {} score {} in {}ms ({} nodes)",
            best,
            best.depth,
            best.score,
            best.elapsed.as_millis(),
            engine.nodes()
        );
        Ok(best)
    }

    /// Handle the `fen` query parameter, present or not.
    #[must_use]
    pub fn handle_fen_query(&self, fen: Option<&str>) -> ApiResponse {
        let result = fen
            .ok_or(RequestError::MissingField { field: FEN_FIELD })
            .and_then(|fen| self.best_move_for_fen(fen));
        respond(result.as_ref())
    }

    /// Handle the `pgn` query parameter, present or not.
    #[must_use]
    pub fn handle_pgn_query(&self, movetext: Option<&str>) -> ApiResponse {
        let result = movetext
            .ok_or(RequestError::MissingField { field: PGN_FIELD })
            .and_then(|movetext| self.best_move_for_pgn(movetext))
            .map(|(notation, best)| {
                info!("replayed game to {notation}");
                best
            });
        respond(result.as_ref())
    }
}

fn respond(result: Result<&BestMove, &RequestError>) -> ApiResponse {
    match result {
        Ok(best) => ApiResponse::from(best),
        Err(e) => {
            warn!("rejected request ({:?}): {e}", e.kind());
            ApiResponse::from(e)
        }
    }
}
