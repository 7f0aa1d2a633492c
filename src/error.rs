use thiserror::Error;

/// Errors raised by the engine facade and the worker bridge.
///
/// Variants that originate in the engine carry the text returned by the
/// engine's `get_error` primitive at the moment the failure was detected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The engine rejected a FEN string.
    #[error("invalid position: {0}")]
    InvalidPosition(String),

    /// A square name was not two characters in `a1`..`h8`.
    #[error("invalid square {0:?}")]
    InvalidSquare(String),

    /// The engine refused to play a move.
    #[error("illegal move: {0}")]
    IllegalMove(String),

    /// `undo_move` was called with an empty move history.
    #[error("no move to undo: {0}")]
    NoMoveToUndo(String),

    /// Any other failure reported by the engine.
    #[error("engine error: {0}")]
    EngineInternal(String),

    /// The engine returned a payload that does not match its schema.
    #[error("malformed engine payload: {0}")]
    Decode(String),

    /// The worker thread is gone and can no longer take requests.
    #[error("engine worker is not running")]
    WorkerUnavailable,
}

impl From<serde_json::Error> for EngineError {
    fn from(e: serde_json::Error) -> Self {
        EngineError::Decode(e.to_string())
    }
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;
