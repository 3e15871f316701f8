//! End-to-end request scenarios through `MoveService`.

use std::time::Duration;

use chess_move_api::notation::{transcode, validate, BOARD_LEN};
use chess_move_api::search::SearchError;
use chess_move_api::service::{ApiResponse, MoveService, RequestError, RequestKind};

const START_WHITE: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
const START_BLACK: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR b KQkq - 0 1";

fn service(think_ms: u64) -> MoveService {
    MoveService::with_limits(Duration::from_millis(think_ms), 64)
}

fn is_coordinate_move(mv: &str) -> bool {
    let bytes = mv.as_bytes();
    bytes.len() == 4
        && (b'a'..=b'h').contains(&bytes[0])
        && (b'1'..=b'8').contains(&bytes[1])
        && (b'a'..=b'h').contains(&bytes[2])
        && (b'1'..=b'8').contains(&bytes[3])
}

/// White to move is refused before anything is searched
#[test]
fn white_to_move_is_a_semantic_error() {
    let err = service(100).best_move_for_fen(START_WHITE).unwrap_err();
    assert_eq!(err, RequestError::WrongSideToMove);
    assert_eq!(err.kind(), RequestKind::Semantic);
}

/// Black to move from the starting position yields a black move
#[test]
fn black_start_position_yields_coordinate_move() {
    assert_eq!(transcode(validate(START_BLACK).unwrap().placement()).as_bytes().len(), BOARD_LEN);

    let best = service(200).best_move_for_fen(START_BLACK).unwrap();
    let mv = best.to_string();
    assert!(is_coordinate_move(&mv), "not a coordinate move: {mv}");
    assert!(
        best.from_square().ends_with('7') || best.from_square().ends_with('8'),
        "not a black piece: {mv}"
    );
}

/// The reply arrives within the deadline plus one iteration
#[test]
fn reply_respects_deadline() {
    let best = service(100).best_move_for_fen(START_BLACK).unwrap();
    assert!(best.depth >= 1);
    assert!(best.elapsed < Duration::from_secs(10), "took {:?}", best.elapsed);
}

/// Back-rank mate for black: Qd1#
#[test]
fn finds_back_rank_mate_for_black() {
    let best = service(5000)
        .best_move_for_fen("k2q4/8/8/8/8/8/PPP5/1K6 b KQkq - 0 1")
        .unwrap();
    assert_eq!(best.to_string(), "d8d1");
}

/// Black wins a hanging queen
#[test]
fn takes_hanging_queen() {
    let best = service(1000)
        .best_move_for_fen("4k3/8/8/3p4/4Q3/8/8/4K3 b KQkq - 0 1")
        .unwrap();
    assert_eq!(best.to_string(), "d5e4");
}

/// Stalemate is reported distinctly, never as an empty move
#[test]
fn stalemate_is_no_legal_move() {
    let service = service(100);
    let err = service
        .best_move_for_fen("7k/5Q2/6K1/8/8/8/8/8 b KQkq - 0 1")
        .unwrap_err();
    assert_eq!(err, RequestError::Search(SearchError::NoLegalMove));

    let response = service.handle_fen_query(Some("7k/5Q2/6K1/8/8/8/8/8 b KQkq - 0 1"));
    assert!(response.is_error());
    assert!(response.to_json().contains("No legal move available"));
}

/// Each structural rule is reported with its own message
#[test]
fn structural_errors_are_specific() {
    let cases = [
        ("8/8/8/8/8/8/8 b KQkq - 0 1", "Expected 8 rows"),
        ("8/8/8/8/8/8/8/44 b KQkq - 0 1", "Two subsequent digits"),
        ("8/8/8/8/8/8/8/~7 b KQkq - 0 1", "~ not after piece"),
        ("8/8/8/8/8/8/8/7x b KQkq - 0 1", "Invalid character"),
        ("8/8/8/8/8/8/8/7 b KQkq - 0 1", "Expected 8 columns"),
    ];
    for (fen, expected) in cases {
        match service(10).handle_fen_query(Some(fen)) {
            ApiResponse::Error {
                reason: Some(reason),
                ..
            } => assert!(reason.starts_with(expected), "{fen}: {reason}"),
            other => panic!("{fen}: unexpected {other:?}"),
        }
    }
}

/// Input without the six-field shape gets the generic message
#[test]
fn format_error_is_generic() {
    let err = service(10).best_move_for_fen("8/8/8/8/8/8/8/8 b").unwrap_err();
    assert_eq!(err.kind(), RequestKind::Format);
    assert!(err.to_string().contains("follow this example"));
}

/// A replayed game reaches the same pipeline
#[test]
fn pgn_game_gets_black_reply() {
    let (notation, best) = service(200)
        .best_move_for_pgn("[Event \"?\"]\n\n1. d4 Nf6 2. c4 e6 3. Nc3")
        .unwrap();
    assert_eq!(
        notation,
        "rnbqkb1r/pppp1ppp/4pn2/8/2PP4/2N5/PP2PPPP/R1BQKBNR b KQkq - 1 3"
    );
    assert!(is_coordinate_move(&best.to_string()));
}
