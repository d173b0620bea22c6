//! Balance messages - communication between App and Balance layers
//!
//! Every query carries an id from one increasing sequence, so the App layer
//! can tell a late response from the latest one.

use crate::models::{BalanceRecord, RefreshRequest};

/// Commands sent from App layer to Balance layer
#[derive(Debug, Clone, PartialEq)]
pub enum BalanceCommand {
    /// Fetch every configured asset of an account, serving cached entries
    FetchWallet { id: u64, account_index: u32 },
    /// Invalidate the requested scope, then refetch the account under `id`
    Refresh { id: u64, request: RefreshRequest },
    /// Shutdown the balance actor
    Shutdown,
}

/// Responses sent from Balance layer to App layer
#[derive(Debug, Clone, PartialEq)]
pub enum BalanceResponse {
    /// Snapshot of every known balance of an account
    Records {
        id: u64,
        account_index: u32,
        records: Vec<BalanceRecord>,
    },
    /// A refresh request was applied to the cache; its refetch follows
    Refreshed {
        id: u64,
        request: RefreshRequest,
        invalidated: usize,
    },
    /// The query failed as a whole
    Error {
        id: u64,
        account_index: u32,
        message: String,
    },
}

impl BalanceResponse {
    /// Query the response belongs to
    pub fn id(&self) -> u64 {
        match self {
            BalanceResponse::Records { id, .. }
            | BalanceResponse::Refreshed { id, .. }
            | BalanceResponse::Error { id, .. } => *id,
        }
    }

    /// Account the response is about
    pub fn account_index(&self) -> u32 {
        match self {
            BalanceResponse::Records { account_index, .. } => *account_index,
            BalanceResponse::Refreshed { request, .. } => request.account_index,
            BalanceResponse::Error { account_index, .. } => *account_index,
        }
    }

    /// Check if this response ends a query
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BalanceResponse::Records { .. } | BalanceResponse::Error { .. }
        )
    }
}
