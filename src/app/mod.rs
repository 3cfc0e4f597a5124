//! Process-level wiring: shared state plus the runtime that drives the four
//! independent loops until shutdown.

pub mod runtime;
pub mod state;

pub use runtime::Runtime;
pub use state::AppState;
