//! Best-move service for chess positions given in Forsyth–Edwards Notation.
//!
//! A position is validated ([`notation::validate`]), transcoded into the
//! 120-byte mailbox text the bundled engine reads ([`notation::transcode`]),
//! and searched for a fixed time by [`search::SearchDriver`]. The reply is
//! the engine's move for black in coordinate notation, e.g. `e7e5`.

pub mod config;
pub mod engine;
pub mod logging;
pub mod notation;
pub mod pgn;
pub mod search;
pub mod server;
pub mod service;

pub use config::{Cli, ServiceConfig};
pub use engine::MailboxEngine;
pub use notation::{transcode, validate, BoardText, Color, Notation, NotationError};
pub use search::{BestMove, SearchDriver, SearchEngine, SearchError, SearchProgress};
pub use server::Server;
pub use service::{ApiResponse, MoveService, RequestError};
