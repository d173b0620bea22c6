//! Balance actor - owns the cache and runs balance fetches in the Tokio runtime

use std::collections::HashMap;
use std::sync::Arc;

use futures_util::future::join_all;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::balance::cache::BalanceCache;
use crate::balance::source::BalanceSource;
use crate::config::AppConfig;
use crate::messages::{BalanceCommand, BalanceResponse};
use crate::models::{AssetDefinition, BalanceRecord};

/// Result of one spawned wallet fetch
struct FetchOutcome {
    id: u64,
    account_index: u32,
    epoch: u64,
    fetched: Vec<BalanceRecord>,
    error: Option<String>,
}

/// Balance actor processing fetch and refresh commands
pub struct BalanceActor {
    source: Arc<dyn BalanceSource>,
    assets: Vec<AssetDefinition>,
    cache: BalanceCache,
    /// Bumped per account on every invalidation; older fetches don't write back
    epochs: HashMap<u32, u64>,
    response_tx: mpsc::UnboundedSender<BalanceResponse>,
    active_fetches: JoinSet<FetchOutcome>,
}

impl BalanceActor {
    pub fn new(
        config: &AppConfig,
        source: Arc<dyn BalanceSource>,
        response_tx: mpsc::UnboundedSender<BalanceResponse>,
    ) -> Self {
        BalanceActor {
            source,
            assets: config.assets.clone(),
            cache: BalanceCache::new(),
            epochs: HashMap::new(),
            response_tx,
            active_fetches: JoinSet::new(),
        }
    }

    /// Run the balance actor message loop
    pub async fn run(mut self, mut cmd_rx: mpsc::UnboundedReceiver<BalanceCommand>) {
        loop {
            tokio::select! {
                biased;

                cmd = cmd_rx.recv() => {
                    match cmd {
                        Some(BalanceCommand::FetchWallet { id, account_index }) => {
                            self.spawn_fetch(id, account_index);
                        }

                        Some(BalanceCommand::Refresh { id, request }) => {
                            let invalidated = self.cache.invalidate(&request, &self.assets);
                            *self.epochs.entry(request.account_index).or_default() += 1;
                            tracing::info!(
                                id,
                                account = request.account_index,
                                scope = request.scope.as_str(),
                                invalidated,
                                "Applied refresh"
                            );
                            let account_index = request.account_index;
                            let _ = self.response_tx.send(BalanceResponse::Refreshed {
                                id,
                                request,
                                invalidated,
                            });
                            self.spawn_fetch(id, account_index);
                        }

                        Some(BalanceCommand::Shutdown) | None => {
                            self.active_fetches.abort_all();
                            break;
                        }
                    }
                }

                Some(joined) = self.active_fetches.join_next() => {
                    match joined {
                        Ok(outcome) => self.finish_fetch(outcome),
                        Err(e) => tracing::error!(error = %e, "Balance fetch task failed"),
                    }
                }
            }
        }
    }

    fn epoch(&self, account_index: u32) -> u64 {
        self.epochs.get(&account_index).copied().unwrap_or(0)
    }

    /// Fetch the assets of the account that are not cached
    fn spawn_fetch(&mut self, id: u64, account_index: u32) {
        let missing: Vec<AssetDefinition> = self
            .assets
            .iter()
            .filter(|asset| self.cache.get(account_index, &asset.key()).is_none())
            .cloned()
            .collect();
        tracing::debug!(
            id,
            account = account_index,
            cached = self.assets.len() - missing.len(),
            missing = missing.len(),
            "Fetching wallet balances"
        );

        let fetches: Vec<_> = missing
            .iter()
            .map(|asset| self.source.fetch(account_index, asset))
            .collect();
        let epoch = self.epoch(account_index);

        self.active_fetches.spawn(async move {
            let results = join_all(fetches).await;
            let mut fetched = Vec::new();
            let mut error = None;
            for (asset, result) in missing.iter().zip(results) {
                match result {
                    Ok(Some(record)) => fetched.push(record),
                    Ok(None) => {}
                    Err(e) => {
                        if error.is_none() {
                            error = Some(format!("{}: {:#}", asset.id, e));
                        }
                    }
                }
            }
            FetchOutcome { id, account_index, epoch, fetched, error }
        });
    }

    fn finish_fetch(&mut self, outcome: FetchOutcome) {
        let FetchOutcome { id, account_index, epoch, fetched, error } = outcome;

        if epoch == self.epoch(account_index) {
            for record in fetched {
                self.cache.insert(account_index, record);
            }
        } else {
            tracing::debug!(
                id,
                account = account_index,
                "Dropping fetch results older than a refresh"
            );
        }

        let response = match error {
            Some(message) => {
                tracing::warn!(
                    id,
                    account = account_index,
                    error = %message,
                    "Balance query failed"
                );
                BalanceResponse::Error { id, account_index, message }
            }
            None => {
                let records = self.snapshot(account_index);
                tracing::info!(
                    id,
                    account = account_index,
                    records = records.len(),
                    "Balance query completed"
                );
                BalanceResponse::Records { id, account_index, records }
            }
        };
        let _ = self.response_tx.send(response);
    }

    /// Cached records of the account, in catalog order
    fn snapshot(&self, account_index: u32) -> Vec<BalanceRecord> {
        self.assets
            .iter()
            .filter_map(|asset| self.cache.get(account_index, &asset.key()))
            .cloned()
            .collect()
    }
}
