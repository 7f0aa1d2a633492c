//! Scripted engine backend shared by the integration tests

#![allow(dead_code)]

use chess_worker::core::{AnalysisSnapshot, Move, MoveFlag, Square, Variation};
use chess_worker::engine::{CallbackHandle, HostFunctions, Primitives};
use std::cell::{Cell, RefCell};
use std::thread;
use std::time::Duration;

pub const STARTPOS: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

pub fn e2e4() -> Move {
    Move::new(Square::E2, Square::E4, MoveFlag::DoublePawnPush)
}

pub fn g1f3() -> Move {
    Move::new(Square::G1, Square(21), MoveFlag::Quiet)
}

/// Analysis payload the mock reports on its `tick`-th callback
pub fn tick_snapshot(tick: u32) -> AnalysisSnapshot {
    AnalysisSnapshot {
        depth: tick,
        nodes: u64::from(tick) * 1000,
        elapsed_ms: u64::from(tick) * 10,
        variations: vec![Variation::new(vec![e2e4()], tick as i32 * 10)],
    }
}

/// Engine double: every primitive answers from scripted state and counts
/// how often it was called.
pub struct MockEngine {
    pub board: RefCell<String>,
    pub legal_moves: RefCell<String>,
    pub status: Cell<i32>,
    pub best_move: Cell<u16>,
    pub accept_moves: Cell<bool>,
    pub undo_depth: Cell<u32>,
    pub analysis_ticks: Cell<u32>,
    pub tick_delay: Cell<Duration>,
    pub analysis_fails: Cell<bool>,
    pub corrupt_tick: Cell<Option<u32>>,
    pub panic_in_status: Cell<bool>,
    pub payload: RefCell<String>,
    pub error: RefCell<String>,

    pub starts: Cell<u32>,
    pub stops: Cell<u32>,
    pub ticks_delivered: Cell<u32>,
    pub make_move_calls: Cell<u32>,
    pub init_play_calls: Cell<u32>,
    pub last_period: Cell<Option<u32>>,

    callback: Cell<Option<CallbackHandle>>,
    stop_requested: Cell<bool>,
}

impl MockEngine {
    pub fn new() -> Self {
        MockEngine {
            board: RefCell::new(STARTPOS.to_string()),
            legal_moves: RefCell::new(format!("[{},{}]", e2e4().encode(), g1f3().encode())),
            status: Cell::new(0),
            best_move: Cell::new(e2e4().encode()),
            accept_moves: Cell::new(true),
            undo_depth: Cell::new(0),
            analysis_ticks: Cell::new(3),
            tick_delay: Cell::new(Duration::ZERO),
            analysis_fails: Cell::new(false),
            corrupt_tick: Cell::new(None),
            panic_in_status: Cell::new(false),
            payload: RefCell::new(AnalysisSnapshot::default().to_json()),
            error: RefCell::new(String::new()),
            starts: Cell::new(0),
            stops: Cell::new(0),
            ticks_delivered: Cell::new(0),
            make_move_calls: Cell::new(0),
            init_play_calls: Cell::new(0),
            last_period: Cell::new(None),
            callback: Cell::new(None),
            stop_requested: Cell::new(false),
        }
    }

    pub fn with_ticks(self, ticks: u32, delay: Duration) -> Self {
        self.analysis_ticks.set(ticks);
        self.tick_delay.set(delay);
        self
    }

    pub fn with_status(self, code: i32) -> Self {
        self.status.set(code);
        self
    }

    pub fn with_legal_moves(self, payload: &str) -> Self {
        *self.legal_moves.borrow_mut() = payload.to_string();
        self
    }

    fn fail(&self, message: &str) -> bool {
        *self.error.borrow_mut() = message.to_string();
        false
    }
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Primitives for MockEngine {
    fn set_board(&self, fen: &str) -> bool {
        let fields: Vec<&str> = fen.split(' ').collect();
        let ranks = fields.first().map_or(0, |placement| placement.split('/').count());
        if fields.len() != 6 || ranks != 8 {
            return self.fail("Invalid FEN string");
        }
        *self.board.borrow_mut() = fen.to_string();
        self.undo_depth.set(0);
        true
    }

    fn get_board(&self) -> String {
        self.board.borrow().clone()
    }

    fn get_legal_moves(&self) -> String {
        self.legal_moves.borrow().clone()
    }

    fn get_game_status(&self) -> i32 {
        if self.panic_in_status.get() {
            panic!("status table corrupted");
        }
        self.status.get()
    }

    fn init_play_engine(&self) {
        self.init_play_calls.set(self.init_play_calls.get() + 1);
    }

    fn get_best_move(&self, _time_ms: u32) -> u16 {
        self.best_move.get()
    }

    fn get_best_move_in_static_time(&self, _time_ms: u32) -> u16 {
        self.best_move.get()
    }

    fn make_move(&self, bits: u16) -> bool {
        self.make_move_calls.set(self.make_move_calls.get() + 1);
        if !self.accept_moves.get() {
            return self.fail(&format!("Illegal move: {}", Move::decode(bits)));
        }
        self.undo_depth.set(self.undo_depth.get() + 1);
        true
    }

    fn undo_move(&self) -> bool {
        match self.undo_depth.get() {
            0 => self.fail("No move to undo"),
            n => {
                self.undo_depth.set(n - 1);
                true
            }
        }
    }

    fn init_analysis(&self, callback: CallbackHandle, period_ms: u32) {
        self.callback.set(Some(callback));
        self.last_period.set(Some(period_ms));
    }

    fn start_analysis(&self, host: &dyn HostFunctions) -> bool {
        self.starts.set(self.starts.get() + 1);
        self.stop_requested.set(false);
        if self.analysis_fails.get() {
            return self.fail("analysis could not start");
        }
        let Some(handle) = self.callback.get() else {
            return self.fail("no callback");
        };

        for tick in 1..=self.analysis_ticks.get() {
            if self.stop_requested.get() {
                break;
            }
            thread::sleep(self.tick_delay.get());
            *self.payload.borrow_mut() = if self.corrupt_tick.get() == Some(tick) {
                "{\"depth\":".to_string()
            } else {
                tick_snapshot(tick).to_json()
            };
            host.call(handle);
            self.ticks_delivered.set(tick);
        }
        true
    }

    fn stop_analysis(&self) -> bool {
        self.stops.set(self.stops.get() + 1);
        self.stop_requested.set(true);
        true
    }

    fn get_analysis_data(&self) -> String {
        self.payload.borrow().clone()
    }

    fn get_error(&self) -> String {
        self.error.borrow().clone()
    }

    fn move_to_figurine_notation(&self, bits: u16) -> String {
        if bits == g1f3().encode() {
            "♘f3".to_string()
        } else {
            Move::decode(bits).to_algebraic()
        }
    }
}
