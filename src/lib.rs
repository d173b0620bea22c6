//! # WalletDeck TUI
//!
//! A terminal showcase for a multi-network wallet SDK.
//!
//! ## Features
//! - Action cards: a declared field schema, an async operation and a
//!   rendered Idle/Running/Succeeded/Failed outcome
//! - Balance dashboard reconciling the configured asset catalog with
//!   fetched balance records
//! - Cached balances with asset, network and wallet refresh scopes
//! - Fixture or EVM JSON-RPC balance sources
//!
//! ## Architecture
//! Actor-based with channels:
//! - UI Layer (Ratatui) - synchronous
//! - App Layer (State machine)
//! - Balance Layer (Tokio runtime)

pub mod action;
pub mod app;
pub mod balance;
pub mod cards;
pub mod config;
pub mod constants;
pub mod error;
pub mod messages;
pub mod models;
pub mod ui;

// Re-export commonly used types
pub use action::{ActionRunner, FieldKind, FieldSpec, Outcome, Schema};
pub use app::{AppActor, AppState};
pub use balance::{reconcile, BalanceActor, BalanceReconciler, BalanceSource};
pub use config::AppConfig;
pub use error::{ConfigError, FormError, SchemaError};
pub use messages::{BalanceCommand, BalanceResponse, RenderState, UiEvent};
pub use models::{
    AssetDefinition, AssetKey, BalanceRecord, ReconciledAsset, RefreshRequest, RefreshScope,
};
