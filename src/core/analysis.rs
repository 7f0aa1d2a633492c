//! Analysis snapshots reported while the engine searches.
//!
//! The serde representation is the engine's analysis payload schema:
//! `{"depth", "nodes", "time", "variations": [{"moves": [u16], "score"}]}`.

use super::moves::Move;
use serde::{Deserialize, Serialize};

/// One principal line with its engine score
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Variation {
    pub moves: Vec<Move>,
    /// Engine-defined scale, passed through untouched
    pub score: i32,
}

impl Variation {
    pub fn new(moves: Vec<Move>, score: i32) -> Self {
        Variation { moves, score }
    }

    pub fn first_move(&self) -> Option<Move> {
        self.moves.first().copied()
    }
}

/// Progress of a running analysis at one point in time
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AnalysisSnapshot {
    /// Lower bound on the plies searched
    pub depth: u32,
    pub nodes: u64,
    #[serde(rename = "time")]
    pub elapsed_ms: u64,
    /// Ranked by the engine; the first entry carries the reported score
    #[serde(default)]
    pub variations: Vec<Variation>,
}

impl AnalysisSnapshot {
    pub fn from_json(payload: &str) -> serde_json::Result<Self> {
        serde_json::from_str(payload)
    }

    pub fn to_json(&self) -> String {
        // Plain integers and vectors cannot fail to serialize.
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn best(&self) -> Option<&Variation> {
        self.variations.first()
    }

    pub fn score(&self) -> Option<i32> {
        self.best().map(|v| v.score)
    }

    pub fn best_move(&self) -> Option<Move> {
        self.best().and_then(Variation::first_move)
    }
}
