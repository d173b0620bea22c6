//! App layer - central state management and command processing
//!
//! The App actor receives UI events, balance responses and finished card
//! runs, updates state, and emits balance commands and render state.

pub mod state;
pub mod actor;
pub mod commands;

pub use state::AppState;
pub use actor::AppActor;
