//! Facade tests against a scripted engine

mod common;

use chess_worker::core::{GameStatus, Move, MoveFlag, Promotion, Square};
use chess_worker::engine::{EngineFacade, FacadeConfig};
use chess_worker::error::EngineError;
use common::{MockEngine, STARTPOS, e2e4, g1f3, tick_snapshot};
use std::time::Duration;

fn facade() -> EngineFacade<MockEngine> {
    EngineFacade::new(MockEngine::new())
}

// ============================================================================
// Positions
// ============================================================================

#[test]
fn test_set_board_accepts_valid_fen() {
    let facade = facade();
    let fen = "8/8/8/8/8/8/8/K6k w - - 0 1";
    facade.set_board(fen).unwrap();
    assert_eq!(facade.board_fen(), fen);
    assert_eq!(facade.board().king_square(chess_worker::core::Color::White), Some(Square::A1));
}

#[test]
fn test_set_board_rejection_carries_engine_message() {
    let facade = facade();
    let err = facade.set_board("not a fen").unwrap_err();
    assert_eq!(err, EngineError::InvalidPosition("Invalid FEN string".to_string()));
    assert_eq!(facade.board_fen(), STARTPOS);
}

#[test]
fn test_square_to_index() {
    type Facade = EngineFacade<MockEngine>;
    assert_eq!(Facade::square_to_index("a1").unwrap(), Square(0));
    assert_eq!(Facade::square_to_index("h8").unwrap(), Square(63));
    assert_eq!(Facade::square_to_index("e4").unwrap(), Square(28));
    assert!(matches!(Facade::square_to_index("i1"), Err(EngineError::InvalidSquare(_))));
    assert!(matches!(Facade::square_to_index("a9"), Err(EngineError::InvalidSquare(_))));
    assert!(Facade::square_to_index("a10").is_err());
    assert!(Facade::square_to_index("").is_err());
}

// ============================================================================
// Legal moves
// ============================================================================

#[test]
fn test_legal_moves_decoded() {
    let moves = facade().legal_moves().unwrap();
    assert_eq!(moves, vec![e2e4(), g1f3()]);
}

#[test]
fn test_null_move_never_listed() {
    let payload = format!("[0,{}]", e2e4().encode());
    let facade = EngineFacade::new(MockEngine::new().with_legal_moves(&payload));
    let moves = facade.legal_moves().unwrap();
    assert_eq!(moves, vec![e2e4()]);
    assert!(moves.iter().all(|mv| !mv.is_null()));
}

#[test]
fn test_malformed_legal_moves_is_decode_error() {
    let facade = EngineFacade::new(MockEngine::new().with_legal_moves("[12,"));
    assert!(matches!(facade.legal_moves(), Err(EngineError::Decode(_))));
}

#[test]
fn test_move_from_squares_respects_promotion() {
    let push = Move::new(Square::E7, Square::E8, MoveFlag::QueenPromotion);
    let under = Move::new(Square::E7, Square::E8, MoveFlag::KnightPromotion);
    let payload = format!("[{},{}]", push.encode(), under.encode());
    let facade = EngineFacade::new(MockEngine::new().with_legal_moves(&payload));

    assert_eq!(
        facade.move_from_squares(Square::E7, Square::E8, Some(Promotion::Queen)).unwrap(),
        Some(push)
    );
    assert_eq!(
        facade.move_from_squares(Square::E7, Square::E8, Some(Promotion::Knight)).unwrap(),
        Some(under)
    );
    assert_eq!(facade.move_from_squares(Square::E7, Square::E8, None).unwrap(), None);
    assert_eq!(
        facade.move_from_squares(Square::E7, Square::E8, Some(Promotion::Rook)).unwrap(),
        None
    );
}

#[test]
fn test_move_from_squares_plain_move() {
    let facade = facade();
    assert_eq!(
        facade.move_from_squares(Square::E2, Square::E4, None).unwrap(),
        Some(e2e4())
    );
    assert_eq!(
        facade.move_from_squares(Square::E2, Square::E4, Some(Promotion::Queen)).unwrap(),
        None
    );
    assert_eq!(facade.move_from_squares(Square::E2, Square(20), None).unwrap(), None);
}

#[test]
fn test_move_from_str() {
    let facade = facade();
    assert_eq!(facade.move_from_str("g1f3").unwrap(), Some(g1f3()));
    assert_eq!(facade.move_from_str("e2e5").unwrap(), None);
    assert_eq!(facade.move_from_str("0000").unwrap(), None);
}

// ============================================================================
// Status
// ============================================================================

#[test]
fn test_stalemate_status() {
    let facade = EngineFacade::new(MockEngine::new().with_status(3));
    let status = facade.status().unwrap();
    assert_eq!(status, GameStatus::Stalemate);
    assert!(status.is_draw());
    assert!(status.is_draw_by_stalemate());
    assert!(!status.is_checkmate());
    assert!(facade.is_game_over().unwrap());
    assert!(facade.is_draw().unwrap());
}

#[test]
fn test_checkmate_statuses() {
    let white = EngineFacade::new(MockEngine::new().with_status(1)).status().unwrap();
    let black = EngineFacade::new(MockEngine::new().with_status(2)).status().unwrap();
    assert!(white.is_checkmate() && black.is_checkmate());
    assert!(!white.is_draw());
    assert_ne!(white.winner(), black.winner());
}

#[test]
fn test_ongoing_status() {
    let facade = facade();
    assert!(facade.status().unwrap().is_ongoing());
    assert!(!facade.is_game_over().unwrap());
    assert!(!facade.is_draw().unwrap());
}

#[test]
fn test_unknown_status_code_is_internal_error() {
    let facade = EngineFacade::new(MockEngine::new().with_status(42));
    assert!(matches!(facade.status(), Err(EngineError::EngineInternal(_))));
}

// ============================================================================
// Moves
// ============================================================================

#[test]
fn test_make_and_undo_move() {
    let facade = facade();
    facade.make_move(e2e4()).unwrap();
    facade.undo_move().unwrap();
    assert_eq!(
        facade.undo_move(),
        Err(EngineError::NoMoveToUndo("No move to undo".to_string()))
    );
}

#[test]
fn test_rejected_move_is_illegal_move() {
    let facade = facade();
    facade.engine().accept_moves.set(false);
    assert_eq!(
        facade.make_move(g1f3()),
        Err(EngineError::IllegalMove("Illegal move: g1f3".to_string()))
    );
}

#[test]
fn test_null_move_never_reaches_engine() {
    let facade = facade();
    assert!(matches!(facade.make_move(Move::NULL), Err(EngineError::IllegalMove(_))));
    assert_eq!(facade.engine().make_move_calls.get(), 0);
}

#[test]
fn test_best_move_decoded() {
    let facade = facade();
    assert_eq!(facade.best_move(60_000), Some(e2e4()));
    assert_eq!(facade.best_move_in_static_time(100), Some(e2e4()));
    facade.engine().best_move.set(0);
    assert_eq!(facade.best_move(60_000), None);
}

#[test]
fn test_figurine_passthrough() {
    assert_eq!(facade().figurine(g1f3()), "♘f3");
}

// ============================================================================
// Analysis
// ============================================================================

#[test]
fn test_analysis_streams_ticks_then_terminal_snapshot() {
    let facade = facade();
    let mut updates = Vec::new();
    facade.start_analysis(|snapshot| updates.push(snapshot)).unwrap();

    assert_eq!(updates.len(), 4);
    assert_eq!(updates[..3], [tick_snapshot(1), tick_snapshot(2), tick_snapshot(3)]);
    assert_eq!(updates[3], tick_snapshot(3));
    assert_eq!(updates[3].best_move(), Some(e2e4()));
    assert!(!facade.is_analyzing());
}

#[test]
fn test_analysis_uses_configured_period() {
    let facade = EngineFacade::with_config(
        MockEngine::new(),
        FacadeConfig {
            analysis_period_ms: 100,
        },
    );
    facade.start_analysis(|_| {}).unwrap();
    assert_eq!(facade.engine().last_period.get(), Some(100));

    let default = self::facade();
    default.start_analysis(|_| {}).unwrap();
    assert_eq!(default.engine().last_period.get(), Some(250));
}

#[test]
fn test_overlapping_start_is_single_flight() {
    let facade = facade();
    let mut nested_results = Vec::new();
    facade
        .start_analysis(|_| {
            assert!(facade.is_analyzing());
            nested_results.push(facade.start_analysis(|_| panic!("second analysis ran")));
        })
        .unwrap();

    assert_eq!(facade.engine().starts.get(), 1);
    assert_eq!(nested_results.len(), 4);
    assert!(nested_results.iter().all(Result::is_ok));
}

#[test]
fn test_stop_from_callback_ends_analysis() {
    let facade = EngineFacade::new(MockEngine::new().with_ticks(10_000, Duration::ZERO));
    let mut updates = 0;
    facade
        .start_analysis(|_| {
            updates += 1;
            if updates == 2 {
                facade.stop_analysis().unwrap();
            }
        })
        .unwrap();

    assert_eq!(facade.engine().ticks_delivered.get(), 2);
    assert_eq!(facade.engine().stops.get(), 1);
    // two ticks plus the terminal snapshot
    assert_eq!(updates, 3);
    assert!(!facade.is_analyzing());
}

#[test]
fn test_stop_when_idle_is_noop() {
    let facade = facade();
    facade.stop_analysis().unwrap();
    assert_eq!(facade.engine().stops.get(), 0);
}

#[test]
fn test_failed_start_returns_to_idle() {
    let facade = facade();
    facade.engine().analysis_fails.set(true);
    let mut updates = 0;
    let err = facade.start_analysis(|_| updates += 1).unwrap_err();
    assert_eq!(err, EngineError::EngineInternal("analysis could not start".to_string()));
    assert_eq!(updates, 0);
    assert!(!facade.is_analyzing());

    facade.engine().analysis_fails.set(false);
    facade.start_analysis(|_| updates += 1).unwrap();
    assert_eq!(updates, 4);
}

#[test]
fn test_corrupt_tick_is_skipped() {
    let facade = facade();
    facade.engine().corrupt_tick.set(Some(2));
    let mut updates = Vec::new();
    facade.start_analysis(|snapshot| updates.push(snapshot.depth)).unwrap();
    assert_eq!(updates, vec![1, 3, 3]);
}

#[test]
fn test_corrupt_terminal_snapshot_is_skipped() {
    let facade = facade();
    // the last tick's payload is also what the engine holds when it returns
    facade.engine().corrupt_tick.set(Some(3));
    let mut updates = Vec::new();
    facade.start_analysis(|snapshot| updates.push(snapshot.depth)).unwrap();
    assert_eq!(updates, vec![1, 2]);
    assert!(!facade.is_analyzing());
    assert!(facade.analysis_snapshot().is_err());
}

#[test]
fn test_analysis_snapshot_on_demand() {
    let facade = facade();
    facade.start_analysis(|_| {}).unwrap();
    let snapshot = facade.analysis_snapshot().unwrap();
    assert_eq!(snapshot.depth, 3);
    assert_eq!(snapshot.score(), Some(30));
}
