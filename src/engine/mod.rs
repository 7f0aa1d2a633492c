//! Engine access
//!
//! This module contains:
//! - The primitive call surface every engine backend implements
//! - The typed facade and its analysis lifecycle
//! - A reference backend built on `shakmaty`
//! - The binding to the compiled engine library (feature `native`)

mod callback;
pub mod facade;
#[cfg(feature = "native")]
pub mod native;
pub mod primitives;
pub mod reference;

pub use facade::{AnalysisState, DEFAULT_ANALYSIS_PERIOD_MS, EngineFacade, FacadeConfig};
#[cfg(feature = "native")]
pub use native::NativeEngine;
pub use primitives::{CallbackHandle, HostFunctions, Primitives};
pub use reference::{EngineOptions, MAX_DEPTH, MAX_MULTI_PV, ReferenceEngine};
