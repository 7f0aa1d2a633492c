//! Messages exchanged between the controlling thread and the engine worker.
//!
//! Both directions serialize as `{"type": ..., "data": ...}` with camelCase
//! tags; `data` is omitted for messages that carry nothing.

use crate::core::{AnalysisSnapshot, GameStatus, Move};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

/// A move as sent by the controller: the engine's 16-bit encoding or
/// coordinate notation such as `"e7e8q"`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MoveRequest {
    Bits(Move),
    Text(String),
}

impl From<Move> for MoveRequest {
    fn from(mv: Move) -> Self {
        MoveRequest::Bits(mv)
    }
}

impl From<&str> for MoveRequest {
    fn from(text: &str) -> Self {
        MoveRequest::Text(text.to_string())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum Request {
    /// Replace the position with a FEN
    Set(String),
    Move(MoveRequest),
    /// Best move for a game clock in milliseconds. Fractional values are
    /// truncated.
    #[serde(deserialize_with = "clock_ms")]
    Search(u32),
    InitPlay,
    StartAnalysis,
    StopAnalysis,
    Undo,
    Board,
    LegalMoves,
    Status,
    Figurine(Move),
}

impl Request {
    /// Wire tag, for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Request::Set(_) => "set",
            Request::Move(_) => "move",
            Request::Search(_) => "search",
            Request::InitPlay => "initPlay",
            Request::StartAnalysis => "startAnalysis",
            Request::StopAnalysis => "stopAnalysis",
            Request::Undo => "undo",
            Request::Board => "board",
            Request::LegalMoves => "legalMoves",
            Request::Status => "status",
            Request::Figurine(_) => "figurine",
        }
    }

    pub fn from_json(line: &str) -> serde_json::Result<Self> {
        serde_json::from_str(line)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum Response {
    /// Engine loaded; sent once before anything else
    Ready,
    /// Echo of the accepted FEN
    Set(String),
    /// The move that was played
    Move(Move),
    /// `None` when the position has no move to offer
    Search(Option<Move>),
    InitPlay,
    Analysis(AnalysisSnapshot),
    StopAnalysis,
    Undo,
    Board(String),
    LegalMoves(Vec<Move>),
    Status(GameStatus),
    Figurine(String),
    Error(String),
}

impl Response {
    pub fn is_error(&self) -> bool {
        matches!(self, Response::Error(_))
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"type":"error","data":"unserializable response: {e}"}}"#)
        })
    }
}

/// Accepts any non-negative JSON number, since JS controllers send floats
fn clock_ms<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let ms = f64::deserialize(deserializer)?;
    if ms.is_finite() && ms >= 0.0 {
        Ok(ms.min(f64::from(u32::MAX)) as u32)
    } else {
        Err(D::Error::custom(format!("invalid time budget {ms}")))
    }
}
