//! Reference engine backed by the `shakmaty` rules crate.
//!
//! Implements the primitive call surface with the same return conventions as
//! the compiled engine: `false` or the null move on failure, with the reason
//! kept for [`Primitives::get_error`].

mod encode;
mod search;

use crate::core::{AnalysisSnapshot, Move};
use crate::engine::primitives::{CallbackHandle, HostFunctions, Primitives};
use log::{debug, info};
use search::{Progress, SearchLimits, Searcher};
use shakmaty::fen::Fen;
use shakmaty::zobrist::{Zobrist64, ZobristHash};
use shakmaty::{CastlingMode, Chess, Color, EnPassantMode, Position};
use std::cell::{Cell, RefCell};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

pub use search::MAX_DEPTH;

/// Upper bound on reported principal variations
pub const MAX_MULTI_PV: u32 = 5;

/// Moves assumed left in the game when splitting a clock budget
const MOVES_TO_GO: u32 = 30;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct EngineOptions {
    /// Principal variations per analysis snapshot, 1..=5
    pub multi_pv: u32,
    /// Deepest iteration; analysis ends on its own once reached
    pub max_depth: u32,
}

impl EngineOptions {
    pub fn new(multi_pv: u32, max_depth: u32) -> Self {
        EngineOptions {
            multi_pv: multi_pv.clamp(1, MAX_MULTI_PV),
            max_depth: max_depth.clamp(1, MAX_DEPTH),
        }
    }
}

impl Default for EngineOptions {
    fn default() -> Self {
        EngineOptions::new(1, MAX_DEPTH)
    }
}

fn to_fen(pos: &Chess) -> String {
    Fen(pos.clone().into_setup(EnPassantMode::Legal)).to_string()
}

fn get_hash(pos: &Chess) -> u64 {
    let z: Zobrist64 = pos.zobrist_hash(EnPassantMode::Legal);
    z.0
}

/// Current position plus everything played to reach it
struct Game {
    position: Chess,
    /// Earlier positions, most recent last
    history: Vec<Chess>,
}

impl Game {
    fn new(position: Chess) -> Self {
        Game {
            position,
            history: Vec::new(),
        }
    }

    fn repetitions(&self) -> usize {
        let current = get_hash(&self.position);
        1 + self
            .history
            .iter()
            .filter(|pos| get_hash(pos) == current)
            .count()
    }
}

pub struct ReferenceEngine {
    options: EngineOptions,
    game: RefCell<Game>,
    analysis: RefCell<AnalysisSnapshot>,
    callback: Cell<Option<(CallbackHandle, u32)>>,
    stop: AtomicBool,
    error: RefCell<String>,
}

impl ReferenceEngine {
    pub fn new(options: EngineOptions) -> Self {
        ReferenceEngine {
            options,
            game: RefCell::new(Game::new(Chess::default())),
            analysis: RefCell::new(AnalysisSnapshot::default()),
            callback: Cell::new(None),
            stop: AtomicBool::new(false),
            error: RefCell::new(String::new()),
        }
    }

    pub fn options(&self) -> EngineOptions {
        self.options
    }

    fn fail(&self, message: String) -> bool {
        debug!("engine error: {message}");
        *self.error.borrow_mut() = message;
        false
    }

    fn position(&self) -> Chess {
        self.game.borrow().position.clone()
    }

    fn search(&self, time_limit: Duration) -> u16 {
        let position = self.position();
        if position.legal_moves().is_empty() {
            self.fail("no legal moves in this position".to_string());
            return Move::NULL.encode();
        }
        self.stop.store(false, Ordering::Relaxed);
        let limits = SearchLimits {
            time_limit: Some(time_limit),
            max_depth: self.options.max_depth,
            multi_pv: 1,
        };
        let mut searcher = Searcher::new(&self.stop);
        let best = searcher.search(&position, &limits);
        debug!(
            "search finished: depth {} nodes {} in {} ms",
            searcher.snapshot().depth,
            searcher.snapshot().nodes,
            searcher.snapshot().elapsed_ms
        );
        best.map(|mv| encode::encode(&mv).encode())
            .unwrap_or(Move::NULL.encode())
    }
}

impl Default for ReferenceEngine {
    fn default() -> Self {
        ReferenceEngine::new(EngineOptions::default())
    }
}

impl Primitives for ReferenceEngine {
    fn set_board(&self, fen: &str) -> bool {
        let position = match fen.parse::<Fen>() {
            Ok(parsed) => parsed.into_position::<Chess>(CastlingMode::Standard),
            Err(e) => return self.fail(format!("invalid FEN {fen:?}: {e}")),
        };
        match position {
            Ok(position) => {
                *self.game.borrow_mut() = Game::new(position);
                true
            }
            Err(e) => self.fail(format!("illegal position {fen:?}: {e}")),
        }
    }

    fn get_board(&self) -> String {
        to_fen(&self.game.borrow().position)
    }

    fn get_legal_moves(&self) -> String {
        serde_json::to_string(&encode::legal_moves(&self.game.borrow().position))
            .unwrap_or_else(|_| "[]".to_string())
    }

    fn get_game_status(&self) -> i32 {
        let game = self.game.borrow();
        let pos = &game.position;
        if pos.is_checkmate() {
            match pos.turn() {
                Color::Black => 1,
                Color::White => 2,
            }
        } else if pos.is_stalemate() {
            3
        } else if pos.halfmoves() >= 100 {
            4
        } else if game.repetitions() >= 3 {
            5
        } else if pos.is_insufficient_material() {
            6
        } else {
            0
        }
    }

    fn init_play_engine(&self) {
        self.stop.store(false, Ordering::Relaxed);
        *self.analysis.borrow_mut() = AnalysisSnapshot::default();
        self.error.borrow_mut().clear();
        info!(
            "reference engine ready (multi_pv {}, max_depth {})",
            self.options.multi_pv, self.options.max_depth
        );
    }

    fn get_best_move(&self, time_ms: u32) -> u16 {
        let budget = (time_ms / MOVES_TO_GO).min(time_ms / 2);
        self.search(Duration::from_millis(u64::from(budget)))
    }

    fn get_best_move_in_static_time(&self, time_ms: u32) -> u16 {
        self.search(Duration::from_millis(u64::from(time_ms)))
    }

    fn make_move(&self, bits: u16) -> bool {
        let current = self.position();
        let Some(mv) = encode::find_legal(&current, bits) else {
            return self.fail(format!(
                "{} is not legal in {}",
                Move::decode(bits),
                to_fen(&current)
            ));
        };
        let mut next = current;
        next.play_unchecked(&mv);

        let mut guard = self.game.borrow_mut();
        let game = &mut *guard;
        game.history.push(std::mem::replace(&mut game.position, next));
        true
    }

    fn undo_move(&self) -> bool {
        let previous = self.game.borrow_mut().history.pop();
        match previous {
            Some(previous) => {
                self.game.borrow_mut().position = previous;
                true
            }
            None => self.fail("no move to undo".to_string()),
        }
    }

    fn init_analysis(&self, callback: CallbackHandle, period_ms: u32) {
        self.callback.set(Some((callback, period_ms)));
    }

    fn start_analysis(&self, host: &dyn HostFunctions) -> bool {
        let Some((handle, period_ms)) = self.callback.take() else {
            return self.fail("analysis started without a registered callback".to_string());
        };
        self.stop.store(false, Ordering::Relaxed);
        *self.analysis.borrow_mut() = AnalysisSnapshot::default();

        let position = self.position();
        let limits = SearchLimits {
            time_limit: None,
            max_depth: self.options.max_depth,
            multi_pv: self.options.multi_pv,
        };
        let mut report = |snapshot: &AnalysisSnapshot| {
            *self.analysis.borrow_mut() = snapshot.clone();
            host.call(handle);
        };
        let mut searcher = Searcher::new(&self.stop).with_progress(Progress {
            period: Duration::from_millis(u64::from(period_ms)),
            report: &mut report,
        });
        searcher.search(&position, &limits);
        *self.analysis.borrow_mut() = searcher.snapshot().clone();
        true
    }

    fn stop_analysis(&self) -> bool {
        self.stop.store(true, Ordering::Relaxed);
        true
    }

    fn get_analysis_data(&self) -> String {
        self.analysis.borrow().to_json()
    }

    fn get_error(&self) -> String {
        self.error.borrow().clone()
    }

    fn move_to_figurine_notation(&self, bits: u16) -> String {
        let position = self.position();
        match encode::find_legal(&position, bits) {
            Some(mv) => encode::figurine(&position, &mv),
            None => Move::decode(bits).to_algebraic(),
        }
    }
}
