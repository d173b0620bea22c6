//! Balance layer - reconciliation of the asset catalog with fetched balances
//!
//! The Balance actor owns the cache and the source; the App layer holds a
//! [`BalanceReconciler`] to enqueue queries and refreshes and to reconcile
//! the snapshots that come back.

pub mod actor;
pub mod cache;
pub mod reconcile;
pub mod source;

pub use actor::BalanceActor;
pub use cache::BalanceCache;
pub use reconcile::{reconcile, BalanceReconciler};
pub use source::{source_from_config, BalanceSource, FixtureBalanceSource, RpcBalanceSource};
