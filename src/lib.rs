pub mod core;
pub mod engine;
pub mod error;
pub mod worker;

pub use crate::core::{AnalysisSnapshot, Board, GameStatus, Move, Square, Variation};
pub use engine::{EngineFacade, EngineOptions, FacadeConfig, Primitives, ReferenceEngine};
pub use error::{EngineError, Result};
pub use shakmaty;
pub use worker::{Request, Response, Worker};
