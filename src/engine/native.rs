//! Binding to the compiled engine library (`libchessengine`).
//!
//! The library keeps a single global engine; strings it returns point into
//! engine-owned buffers valid until the next call and are copied out at once.
//! Analysis progress arrives through a bare `void (*)(void)` callback, so the
//! host table and handle of the running analysis are parked in thread-locals
//! for the trampoline to pick up.

use super::primitives::{CallbackHandle, HostFunctions, Primitives};
use log::{error, warn};
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::ffi::{CStr, CString, c_char, c_int, c_uint};
use std::panic::{self, AssertUnwindSafe};

type AnalysisCallback = extern "C" fn();

#[link(name = "chessengine")]
unsafe extern "C" {
    #[link_name = "setBoard"]
    fn engine_set_board(fen: *const c_char) -> c_int;
    #[link_name = "getBoard"]
    fn engine_get_board() -> *const c_char;
    #[link_name = "getLegalMoves"]
    fn engine_get_legal_moves() -> *const c_char;
    #[link_name = "getGameStatus"]
    fn engine_get_game_status() -> c_int;
    #[link_name = "initPlayEngine"]
    fn engine_init_play_engine();
    #[link_name = "getBestMove"]
    fn engine_get_best_move(time_ms: c_uint) -> c_uint;
    #[link_name = "getBestMoveInStaticTime"]
    fn engine_get_best_move_in_static_time(time_ms: c_uint) -> c_uint;
    #[link_name = "makeMove"]
    fn engine_make_move(bits: c_uint) -> c_int;
    #[link_name = "undoMove"]
    fn engine_undo_move() -> c_int;
    #[link_name = "initAnalysis"]
    fn engine_init_analysis(callback: AnalysisCallback, period_ms: c_uint);
    #[link_name = "startAnalysis"]
    fn engine_start_analysis() -> c_int;
    #[link_name = "stopAnalysis"]
    fn engine_stop_analysis() -> c_int;
    #[link_name = "getAnalysisData"]
    fn engine_get_analysis_data() -> *const c_char;
    #[link_name = "getError"]
    fn engine_get_error() -> *const c_char;
    #[link_name = "moveToFigurineNotation"]
    fn engine_move_to_figurine_notation(bits: c_uint) -> *const c_char;
}

thread_local! {
    static ACTIVE_HOST: Cell<Option<(&'static dyn HostFunctions, CallbackHandle)>> =
        const { Cell::new(None) };
    static CALLBACK_PANIC: RefCell<Option<Box<dyn Any + Send>>> = const { RefCell::new(None) };
}

/// Entry point handed to the engine. Unwinding must not cross the C frames,
/// so a panic in the host function is parked, the analysis is stopped, and
/// the panic resumes once `startAnalysis` has returned.
extern "C" fn analysis_trampoline() {
    let Some((host, handle)) = ACTIVE_HOST.with(Cell::get) else {
        warn!("engine analysis callback fired with no active host");
        return;
    };
    if CALLBACK_PANIC.with(|slot| slot.borrow().is_some()) {
        return;
    }
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| host.call(handle))) {
        error!("host analysis callback panicked, stopping analysis");
        CALLBACK_PANIC.with(|slot| *slot.borrow_mut() = Some(payload));
        // SAFETY: the engine accepts stop requests from inside its callback.
        unsafe {
            engine_stop_analysis();
        }
    }
}

/// Publishes the host table for the trampoline while an analysis runs.
struct ActiveHost {
    previous: Option<(&'static dyn HostFunctions, CallbackHandle)>,
}

impl ActiveHost {
    /// # Safety
    ///
    /// The returned guard must be dropped before `host` goes out of scope.
    unsafe fn install(host: &dyn HostFunctions, handle: CallbackHandle) -> Self {
        // SAFETY: lifetime erased here, restored by the caller's contract.
        let host: &'static dyn HostFunctions = unsafe { std::mem::transmute(host) };
        let previous = ACTIVE_HOST.with(|active| active.replace(Some((host, handle))));
        ActiveHost { previous }
    }
}

impl Drop for ActiveHost {
    fn drop(&mut self) {
        ACTIVE_HOST.with(|active| active.set(self.previous));
    }
}

/// Copy an engine-owned C string. A null pointer reads as empty.
fn read_string(ptr: *const c_char) -> String {
    if ptr.is_null() {
        return String::new();
    }
    // SAFETY: non-null engine strings are NUL-terminated and live until the
    // next engine call.
    unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
}

/// Failure detected on the host side before the engine was reached. It is
/// reported once, ahead of the engine's own text, and then forgotten.
#[derive(Default)]
struct HostError(RefCell<Option<String>>);

impl HostError {
    fn set(&self, message: &str) {
        *self.0.borrow_mut() = Some(message.to_string());
    }

    fn clear(&self) {
        self.0.borrow_mut().take();
    }

    fn take_or_else(&self, engine_error: impl FnOnce() -> String) -> String {
        let parked = self.0.borrow_mut().take();
        parked.unwrap_or_else(engine_error)
    }
}

/// Handle to the process-wide native engine
pub struct NativeEngine {
    handle: Cell<Option<CallbackHandle>>,
    host_error: HostError,
}

impl NativeEngine {
    pub fn new() -> Self {
        NativeEngine {
            handle: Cell::new(None),
            host_error: HostError::default(),
        }
    }
}

impl Default for NativeEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Primitives for NativeEngine {
    fn set_board(&self, fen: &str) -> bool {
        let Ok(fen) = CString::new(fen) else {
            self.host_error.set("FEN contains a NUL byte");
            return false;
        };
        self.host_error.clear();
        // SAFETY: `fen` outlives the call.
        unsafe { engine_set_board(fen.as_ptr()) != 0 }
    }

    fn get_board(&self) -> String {
        read_string(unsafe { engine_get_board() })
    }

    fn get_legal_moves(&self) -> String {
        read_string(unsafe { engine_get_legal_moves() })
    }

    fn get_game_status(&self) -> i32 {
        unsafe { engine_get_game_status() }
    }

    fn init_play_engine(&self) {
        unsafe { engine_init_play_engine() }
    }

    fn get_best_move(&self, time_ms: u32) -> u16 {
        (unsafe { engine_get_best_move(time_ms) } & 0xFFFF) as u16
    }

    fn get_best_move_in_static_time(&self, time_ms: u32) -> u16 {
        (unsafe { engine_get_best_move_in_static_time(time_ms) } & 0xFFFF) as u16
    }

    fn make_move(&self, bits: u16) -> bool {
        self.host_error.clear();
        unsafe { engine_make_move(c_uint::from(bits)) != 0 }
    }

    fn undo_move(&self) -> bool {
        self.host_error.clear();
        unsafe { engine_undo_move() != 0 }
    }

    fn init_analysis(&self, callback: CallbackHandle, period_ms: u32) {
        self.handle.set(Some(callback));
        unsafe { engine_init_analysis(analysis_trampoline, period_ms) }
    }

    fn start_analysis(&self, host: &dyn HostFunctions) -> bool {
        let Some(handle) = self.handle.take() else {
            self.host_error.set("analysis started without a registered callback");
            return false;
        };
        self.host_error.clear();

        let finished = {
            // SAFETY: the guard is dropped at the end of this block, while
            // `host` is still borrowed.
            let _active = unsafe { ActiveHost::install(host, handle) };
            unsafe { engine_start_analysis() != 0 }
        };

        if let Some(payload) = CALLBACK_PANIC.with(|slot| slot.borrow_mut().take()) {
            panic::resume_unwind(payload);
        }
        finished
    }

    fn stop_analysis(&self) -> bool {
        self.host_error.clear();
        unsafe { engine_stop_analysis() != 0 }
    }

    fn get_analysis_data(&self) -> String {
        read_string(unsafe { engine_get_analysis_data() })
    }

    fn get_error(&self) -> String {
        self.host_error
            .take_or_else(|| read_string(unsafe { engine_get_error() }))
    }

    fn move_to_figurine_notation(&self, bits: u16) -> String {
        read_string(unsafe { engine_move_to_figurine_notation(c_uint::from(bits)) })
    }
}
