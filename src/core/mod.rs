//! Core data types exchanged with the engine
//!
//! - Board snapshots transcribed from FEN
//! - The 16-bit move encoding
//! - Analysis snapshots and variations
//! - Game status codes

pub mod analysis;
pub mod board;
pub mod moves;
pub mod status;

pub use analysis::{AnalysisSnapshot, Variation};
pub use board::{Board, CastlingRights, Color, Piece, PieceType, Square};
pub use moves::{Move, MoveFlag, Promotion};
pub use status::GameStatus;
