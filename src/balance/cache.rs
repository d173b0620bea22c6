//! Balance cache of the fetch layer, keyed by (account, asset key)

use std::collections::HashMap;

use crate::models::{AssetDefinition, AssetKey, BalanceRecord, RefreshRequest, RefreshScope};

/// What a refresh request invalidates within one account
#[derive(Clone, Debug, PartialEq, Eq)]
enum Target {
    One(AssetKey),
    Network(String),
    All,
}

impl Target {
    fn matches(&self, key: &AssetKey) -> bool {
        match self {
            Target::One(target) => target == key,
            Target::Network(network) => &key.network == network,
            Target::All => true,
        }
    }
}

#[derive(Debug, Default)]
pub struct BalanceCache {
    entries: HashMap<(u32, AssetKey), BalanceRecord>,
}

impl BalanceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, account_index: u32, key: &AssetKey) -> Option<&BalanceRecord> {
        self.entries.get(&(account_index, key.clone()))
    }

    pub fn insert(&mut self, account_index: u32, record: BalanceRecord) {
        self.entries.insert((account_index, record.key()), record);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop the entries covered by `request`, returning how many went.
    /// A single-asset request without an asset id targets the network's
    /// native asset; an unknown asset id invalidates nothing.
    pub fn invalidate(&mut self, request: &RefreshRequest, assets: &[AssetDefinition]) -> usize {
        let target = match &request.scope {
            RefreshScope::Asset {
                network,
                asset_id: None,
            } => Target::One(AssetKey::new(network.as_str(), None)),
            RefreshScope::Asset {
                asset_id: Some(asset_id),
                ..
            } => match assets.iter().find(|a| &a.id == asset_id) {
                Some(asset) => Target::One(asset.key()),
                None => {
                    tracing::warn!(asset_id = %asset_id, "Refresh for unknown asset ignored");
                    return 0;
                }
            },
            RefreshScope::Network { network } => Target::Network(network.clone()),
            RefreshScope::Wallet => Target::All,
        };

        let before = self.entries.len();
        self.entries.retain(|(account, key), _| {
            !(*account == request.account_index && target.matches(key))
        });
        let removed = before - self.entries.len();
        tracing::debug!(
            account = request.account_index,
            scope = request.scope.as_str(),
            removed,
            "Invalidated balance cache"
        );
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const USDT: &str = "0xdAC17F958D2ee523a2206206994597C13D831ec7";
    const XAUT: &str = "0x68749665FF8D2d112Fa859AA293F07A622782F38";

    fn catalog() -> Vec<AssetDefinition> {
        vec![
            AssetDefinition::native("ethereum-native", "ethereum", "ETH", "Ethereum", 18),
            AssetDefinition::token("ethereum-usdt", "ethereum", USDT, "USDT", "Tether USD", 6),
            AssetDefinition::token("ethereum-xaut", "ethereum", XAUT, "XAUT", "Tether Gold", 6),
            AssetDefinition::native("polygon-native", "polygon", "POL", "Polygon", 18),
        ]
    }

    fn populated() -> BalanceCache {
        let mut cache = BalanceCache::new();
        cache.insert(0, BalanceRecord::new("ethereum", None, "1"));
        cache.insert(0, BalanceRecord::new("ethereum", Some(USDT), "2"));
        cache.insert(0, BalanceRecord::new("ethereum", Some(XAUT), "3"));
        cache.insert(0, BalanceRecord::new("polygon", None, "4"));
        cache.insert(1, BalanceRecord::new("ethereum", None, "5"));
        cache
    }

    fn has(cache: &BalanceCache, account: u32, network: &str, address: Option<&str>) -> bool {
        cache.get(account, &AssetKey::new(network, address)).is_some()
    }

    #[test]
    fn test_insert_normalizes_key() {
        let mut cache = BalanceCache::new();
        cache.insert(0, BalanceRecord::new("ethereum", Some(USDT), "2"));
        let key = AssetKey::new("ethereum", Some(&USDT.to_lowercase()));
        assert_eq!(cache.get(0, &key).map(|r| r.balance.as_str()), Some("2"));
        assert!(cache.get(1, &key).is_none());
    }

    #[test]
    fn test_single_asset_invalidates_one_entry() {
        let mut cache = populated();
        let removed = cache.invalidate(
            &RefreshRequest::asset(0, "ethereum", Some("ethereum-usdt".into())),
            &catalog(),
        );
        assert_eq!(removed, 1);
        assert!(!has(&cache, 0, "ethereum", Some(USDT)));
        assert!(has(&cache, 0, "ethereum", None));
        assert!(has(&cache, 0, "ethereum", Some(XAUT)));
    }

    #[test]
    fn test_single_asset_without_id_targets_native() {
        let mut cache = populated();
        let removed = cache.invalidate(&RefreshRequest::asset(0, "ethereum", None), &catalog());
        assert_eq!(removed, 1);
        assert!(!has(&cache, 0, "ethereum", None));
        assert!(has(&cache, 0, "ethereum", Some(USDT)));
        assert!(has(&cache, 1, "ethereum", None));
    }

    #[test]
    fn test_network_scope_covers_native_and_tokens_only() {
        let mut cache = populated();
        let removed = cache.invalidate(&RefreshRequest::network(0, "ethereum"), &catalog());
        assert_eq!(removed, 3);
        assert!(!has(&cache, 0, "ethereum", None));
        assert!(!has(&cache, 0, "ethereum", Some(USDT)));
        assert!(!has(&cache, 0, "ethereum", Some(XAUT)));
        assert!(has(&cache, 0, "polygon", None));
        assert!(has(&cache, 1, "ethereum", None));
    }

    #[test]
    fn test_wallet_scope_covers_one_account() {
        let mut cache = populated();
        let removed = cache.invalidate(&RefreshRequest::wallet(0), &catalog());
        assert_eq!(removed, 4);
        assert_eq!(cache.len(), 1);
        assert!(has(&cache, 1, "ethereum", None));
    }

    #[test]
    fn test_unknown_asset_id_invalidates_nothing() {
        let mut cache = populated();
        let removed = cache.invalidate(
            &RefreshRequest::asset(0, "ethereum", Some("ethereum-doge".into())),
            &catalog(),
        );
        assert_eq!(removed, 0);
        assert_eq!(cache.len(), 5);
    }
}
