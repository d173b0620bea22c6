//! Message types for inter-layer communication in the actor-based architecture.
//!
//! This module defines all messages that flow between the UI, App, and Balance layers.

pub mod ui_events;
pub mod balance;
pub mod render;

pub use ui_events::UiEvent;
pub use balance::{BalanceCommand, BalanceResponse};
pub use render::RenderState;
