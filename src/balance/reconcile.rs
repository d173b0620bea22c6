//! Merge the asset catalog with a snapshot of balance records

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::config::AppConfig;
use crate::constants::DEFAULT_BALANCE;
use crate::messages::BalanceCommand;
use crate::models::{AssetDefinition, AssetKey, BalanceRecord, ReconciledAsset, RefreshRequest};

/// One entry per asset definition, in catalog order. Assets without a
/// matching record get the default balance and are flagged pending. When
/// several records share a key the first one wins.
pub fn reconcile(assets: &[AssetDefinition], records: &[BalanceRecord]) -> Vec<ReconciledAsset> {
    let mut by_key: HashMap<AssetKey, &BalanceRecord> = HashMap::with_capacity(records.len());
    for record in records {
        by_key.entry(record.key()).or_insert(record);
    }

    assets
        .iter()
        .map(|asset| match by_key.get(&asset.key()) {
            Some(record) => ReconciledAsset {
                asset: asset.clone(),
                balance: record.balance.clone(),
                pending: false,
            },
            None => ReconciledAsset {
                asset: asset.clone(),
                balance: DEFAULT_BALANCE.to_string(),
                pending: true,
            },
        })
        .collect()
}

/// Dashboard-facing handle: the configured catalog plus the command channel
/// of the balance actor. Clones share one query id sequence.
#[derive(Clone, Debug)]
pub struct BalanceReconciler {
    assets: Vec<AssetDefinition>,
    command_tx: mpsc::UnboundedSender<BalanceCommand>,
    next_query_id: Arc<AtomicU64>,
}

impl BalanceReconciler {
    pub fn new(config: &AppConfig, command_tx: mpsc::UnboundedSender<BalanceCommand>) -> Self {
        BalanceReconciler {
            assets: config.assets.clone(),
            command_tx,
            next_query_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Reconcile a snapshot against the configured catalog
    pub fn reconcile_snapshot(&self, records: &[BalanceRecord]) -> Vec<ReconciledAsset> {
        reconcile(&self.assets, records)
    }

    fn next_id(&self) -> u64 {
        self.next_query_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Enqueue a query for every configured asset of the account
    pub fn fetch_wallet(&self, account_index: u32) -> u64 {
        let id = self.next_id();
        self.send(BalanceCommand::FetchWallet { id, account_index });
        id
    }

    /// Forward a refresh; fresh records arrive later on the response
    /// channel under the returned id
    pub fn request_refresh(&self, request: RefreshRequest) -> u64 {
        let id = self.next_id();
        tracing::info!(
            id,
            account = request.account_index,
            scope = request.scope.as_str(),
            "Refresh requested"
        );
        self.send(BalanceCommand::Refresh { id, request });
        id
    }

    /// Stop the balance actor
    pub fn shutdown(&self) {
        self.send(BalanceCommand::Shutdown);
    }

    fn send(&self, command: BalanceCommand) {
        if self.command_tx.send(command).is_err() {
            tracing::warn!("Balance actor is gone; command dropped");
        }
    }
}
