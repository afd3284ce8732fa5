//! Application state and the controller driving it.
//!
//! Operations follow the same pattern: [operations] perform one store request and describe the
//! outcome as a [state::StateDelta], [controller::Controller] runs them as separate tasks and
//! applies the deltas to [state::AppState] once they finish.

pub mod controller;
pub mod operations;
pub mod state;
