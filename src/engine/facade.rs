//! Typed facade over an engine's primitive call surface.
//!
//! The facade decodes raw engine results into [`Move`], [`Board`] and
//! [`AnalysisSnapshot`] values, turns `false`/sentinel returns into
//! [`EngineError`]s carrying the engine's error text, and owns the analysis
//! lifecycle.

use super::callback::CallbackTable;
use super::primitives::Primitives;
use crate::core::{AnalysisSnapshot, Board, GameStatus, Move, Promotion, Square};
use crate::error::{EngineError, Result};
use log::{debug, info, warn};
use std::cell::{Cell, RefCell};

/// Analysis callback cadence requested from the engine unless configured
pub const DEFAULT_ANALYSIS_PERIOD_MS: u32 = 250;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct FacadeConfig {
    /// How often the engine reports analysis progress
    pub analysis_period_ms: u32,
}

impl Default for FacadeConfig {
    fn default() -> Self {
        FacadeConfig {
            analysis_period_ms: DEFAULT_ANALYSIS_PERIOD_MS,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AnalysisState {
    Idle,
    Analyzing,
}

/// Holds the facade in [`AnalysisState::Analyzing`] and returns it to idle
/// when dropped.
struct AnalysisSession<'a> {
    state: &'a Cell<AnalysisState>,
}

impl<'a> AnalysisSession<'a> {
    fn begin(state: &'a Cell<AnalysisState>) -> Option<Self> {
        match state.get() {
            AnalysisState::Analyzing => None,
            AnalysisState::Idle => {
                state.set(AnalysisState::Analyzing);
                Some(AnalysisSession { state })
            }
        }
    }
}

impl Drop for AnalysisSession<'_> {
    fn drop(&mut self) {
        self.state.set(AnalysisState::Idle);
    }
}

pub struct EngineFacade<P: Primitives> {
    engine: P,
    config: FacadeConfig,
    state: Cell<AnalysisState>,
}

impl<P: Primitives> EngineFacade<P> {
    pub fn new(engine: P) -> Self {
        Self::with_config(engine, FacadeConfig::default())
    }

    pub fn with_config(engine: P, config: FacadeConfig) -> Self {
        EngineFacade {
            engine,
            config,
            state: Cell::new(AnalysisState::Idle),
        }
    }

    /// The wrapped engine
    pub fn engine(&self) -> &P {
        &self.engine
    }

    pub fn config(&self) -> FacadeConfig {
        self.config
    }

    fn last_error(&self) -> String {
        self.engine.get_error()
    }

    /// Submit a position. On success the engine's position is authoritative.
    pub fn set_board(&self, fen: &str) -> Result<()> {
        if self.engine.set_board(fen) {
            debug!("position set: {fen}");
            Ok(())
        } else {
            Err(EngineError::InvalidPosition(self.last_error()))
        }
    }

    /// Current position as reported by the engine
    pub fn board_fen(&self) -> String {
        self.engine.get_board()
    }

    pub fn board(&self) -> Board {
        Board::from_fen(&self.board_fen())
    }

    pub fn legal_moves(&self) -> Result<Vec<Move>> {
        let raw: Vec<u16> = serde_json::from_str(&self.engine.get_legal_moves())?;
        let moves = raw
            .into_iter()
            .map(Move::decode)
            .filter(|mv| {
                if mv.is_null() {
                    warn!("engine listed the null move as legal, dropping it");
                }
                !mv.is_null()
            })
            .collect();
        Ok(moves)
    }

    /// Parse a square name such as `"e4"`.
    pub fn square_to_index(square: &str) -> Result<Square> {
        square.parse()
    }

    /// Legal move between two squares. A promotion move only matches the
    /// requested piece; a plain move only matches when none is requested.
    pub fn move_from_squares(
        &self,
        from: Square,
        to: Square,
        promotion: Option<Promotion>,
    ) -> Result<Option<Move>> {
        Ok(self
            .legal_moves()?
            .into_iter()
            .find(|mv| mv.from() == from && mv.to() == to && mv.promotion() == promotion))
    }

    /// Legal move whose coordinate notation equals `text`.
    pub fn move_from_str(&self, text: &str) -> Result<Option<Move>> {
        Ok(self
            .legal_moves()?
            .into_iter()
            .find(|mv| mv.to_algebraic() == text))
    }

    pub fn status(&self) -> Result<GameStatus> {
        let code = self.engine.get_game_status();
        GameStatus::from_code(code)
            .ok_or_else(|| EngineError::EngineInternal(format!("unknown game status code {code}")))
    }

    pub fn is_game_over(&self) -> Result<bool> {
        self.status().map(GameStatus::is_game_over)
    }

    pub fn is_draw(&self) -> Result<bool> {
        self.status().map(GameStatus::is_draw)
    }

    pub fn init_play_engine(&self) {
        self.engine.init_play_engine();
    }

    pub fn make_move(&self, mv: Move) -> Result<()> {
        if mv.is_null() {
            return Err(EngineError::IllegalMove("the null move cannot be played".to_string()));
        }
        if self.engine.make_move(mv.encode()) {
            debug!("played {mv}");
            Ok(())
        } else {
            Err(EngineError::IllegalMove(self.last_error()))
        }
    }

    pub fn undo_move(&self) -> Result<()> {
        if self.engine.undo_move() {
            Ok(())
        } else {
            Err(EngineError::NoMoveToUndo(self.last_error()))
        }
    }

    /// Best move for a game clock of `time_ms`; `None` when the engine has no
    /// move to offer.
    pub fn best_move(&self, time_ms: u32) -> Option<Move> {
        Some(Move::decode(self.engine.get_best_move(time_ms))).filter(|mv| !mv.is_null())
    }

    /// Best move after searching for exactly `time_ms`.
    pub fn best_move_in_static_time(&self, time_ms: u32) -> Option<Move> {
        Some(Move::decode(self.engine.get_best_move_in_static_time(time_ms)))
            .filter(|mv| !mv.is_null())
    }

    pub fn is_analyzing(&self) -> bool {
        self.state.get() == AnalysisState::Analyzing
    }

    /// Decode the engine's current analysis payload.
    pub fn analysis_snapshot(&self) -> Result<AnalysisSnapshot> {
        Ok(AnalysisSnapshot::from_json(&self.engine.get_analysis_data())?)
    }

    /// Analyse the current position, blocking until the engine finishes or is
    /// stopped.
    ///
    /// `on_update` receives a snapshot on every engine callback and once more
    /// with the terminal snapshot after a normal return. Payloads that fail
    /// to decode, terminal included, are logged and skipped. While an analysis is
    /// running further calls return `Ok(())` immediately and do nothing.
    pub fn start_analysis<F>(&self, on_update: F) -> Result<()>
    where
        F: FnMut(AnalysisSnapshot),
    {
        let Some(_session) = AnalysisSession::begin(&self.state) else {
            debug!("analysis already running, start request dropped");
            return Ok(());
        };

        let on_update = RefCell::new(on_update);
        let tick = || self.forward_update(&on_update);
        let table = CallbackTable::new();
        let registration = table.register(&tick);

        self.engine
            .init_analysis(registration.handle(), self.config.analysis_period_ms);
        info!("analysis started");

        if !self.engine.start_analysis(&table) {
            return Err(EngineError::EngineInternal(self.last_error()));
        }

        self.forward_update(&on_update);
        info!("analysis finished");
        Ok(())
    }

    fn forward_update<F>(&self, on_update: &RefCell<F>)
    where
        F: FnMut(AnalysisSnapshot),
    {
        let snapshot = match self.analysis_snapshot() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("skipping analysis update: {e}");
                return;
            }
        };
        match on_update.try_borrow_mut() {
            Ok(mut callback) => (*callback)(snapshot),
            Err(_) => debug!("analysis update re-entered its own callback, skipped"),
        }
    }

    /// Ask a running analysis to stop. The state returns to idle once the
    /// blocked [`EngineFacade::start_analysis`] call returns.
    pub fn stop_analysis(&self) -> Result<()> {
        if !self.is_analyzing() {
            return Ok(());
        }
        if self.engine.stop_analysis() {
            debug!("analysis stop requested");
            Ok(())
        } else {
            Err(EngineError::EngineInternal(self.last_error()))
        }
    }

    /// Figurine notation rendered by the engine
    pub fn figurine(&self, mv: Move) -> String {
        self.engine.move_to_figurine_notation(mv.encode())
    }
}
