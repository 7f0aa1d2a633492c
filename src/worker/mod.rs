//! Worker thread hosting the engine
//!
//! The controlling thread never touches the engine. It sends [`Request`]s
//! to a [`Worker`] and reads [`Response`]s back, one per handled request, or
//! a stream of `analysis` responses while an analysis runs.

mod bridge;
pub mod protocol;

pub use bridge::Worker;
pub use protocol::{MoveRequest, Request, Response};
