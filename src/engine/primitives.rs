//! Primitive call surface of an engine backend
//!
//! These are the only operations the facade may invoke. They mirror the
//! exported functions of the compiled engine module: failures are reported
//! through a `false`/sentinel return, after which [`Primitives::get_error`]
//! holds the reason.

/// Index of a host function registered for native-to-host calls
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub struct CallbackHandle(pub u32);

/// Host-side function table the engine calls back into during analysis.
pub trait HostFunctions {
    fn call(&self, handle: CallbackHandle);
}

/// Synchronous engine operations.
///
/// Methods take `&self` because the engine owns its position and search state
/// and must tolerate re-entry from the analysis callback: while
/// [`Primitives::start_analysis`] blocks, the registered host function may call
/// [`Primitives::get_analysis_data`] and [`Primitives::stop_analysis`].
pub trait Primitives {
    /// Replace the current position. Returns `false` for a rejected FEN.
    fn set_board(&self, fen: &str) -> bool;

    /// Current position as FEN
    fn get_board(&self) -> String;

    /// JSON array of encoded legal moves
    fn get_legal_moves(&self) -> String;

    /// Game status code (0 ongoing, 1/2 checkmate, 3..=6 draws)
    fn get_game_status(&self) -> i32;

    fn init_play_engine(&self);

    /// Best move for a game clock of `time_ms`. Returns within that budget.
    fn get_best_move(&self, time_ms: u32) -> u16;

    /// Best move after searching for exactly `time_ms`.
    fn get_best_move_in_static_time(&self, time_ms: u32) -> u16;

    fn make_move(&self, bits: u16) -> bool;

    fn undo_move(&self) -> bool;

    /// Register the host function called every `period_ms` of analysis.
    fn init_analysis(&self, callback: CallbackHandle, period_ms: u32);

    /// Analyse the current position until stopped or exhausted, calling the
    /// registered handle through `host`. Blocks for the whole analysis.
    fn start_analysis(&self, host: &dyn HostFunctions) -> bool;

    /// Request cancellation of a running analysis.
    fn stop_analysis(&self) -> bool;

    /// JSON analysis payload of the running or last analysis
    fn get_analysis_data(&self) -> String;

    fn get_error(&self) -> String;

    fn move_to_figurine_notation(&self, bits: u16) -> String;
}
