use serde::{Deserialize, Serialize};
use std::fmt;

/// Static description of a native coin or token on a network
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetDefinition {
    pub id: String,
    pub network: String,
    pub is_native: bool,
    /// Contract address, `None` for the native asset
    pub address: Option<String>,
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
}

impl AssetDefinition {
    pub fn native(
        id: impl Into<String>,
        network: impl Into<String>,
        symbol: impl Into<String>,
        name: impl Into<String>,
        decimals: u8,
    ) -> Self {
        AssetDefinition {
            id: id.into(),
            network: network.into(),
            is_native: true,
            address: None,
            symbol: symbol.into(),
            name: name.into(),
            decimals,
        }
    }

    pub fn token(
        id: impl Into<String>,
        network: impl Into<String>,
        address: impl Into<String>,
        symbol: impl Into<String>,
        name: impl Into<String>,
        decimals: u8,
    ) -> Self {
        AssetDefinition {
            id: id.into(),
            network: network.into(),
            is_native: false,
            address: Some(address.into()),
            symbol: symbol.into(),
            name: name.into(),
            decimals,
        }
    }

    /// Key used to match this asset against balance records and cache entries
    pub fn key(&self) -> AssetKey {
        AssetKey::for_asset(self)
    }
}

/// Currently-known balance of one (network, asset) pair
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceRecord {
    pub network: String,
    #[serde(default)]
    pub asset_address: Option<String>,
    /// Decimal amount, already scaled by the asset's decimals
    pub balance: String,
}

impl BalanceRecord {
    pub fn new(
        network: impl Into<String>,
        asset_address: Option<&str>,
        balance: impl Into<String>,
    ) -> Self {
        BalanceRecord {
            network: network.into(),
            asset_address: asset_address.map(str::to_string),
            balance: balance.into(),
        }
    }

    pub fn key(&self) -> AssetKey {
        AssetKey::for_record(self)
    }
}

/// Normalized (network, address) pair; `address == None` is the native asset
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetKey {
    pub network: String,
    pub address: Option<String>,
}

impl AssetKey {
    pub fn new(network: impl Into<String>, address: Option<&str>) -> Self {
        AssetKey {
            network: network.into(),
            address: address.map(normalize_address),
        }
    }

    /// Native assets always key as `(network, None)`, whatever address they carry
    pub fn for_asset(asset: &AssetDefinition) -> Self {
        if asset.is_native {
            AssetKey::new(asset.network.as_str(), None)
        } else {
            AssetKey::new(asset.network.as_str(), asset.address.as_deref())
        }
    }

    pub fn for_record(record: &BalanceRecord) -> Self {
        AssetKey::new(record.network.as_str(), record.asset_address.as_deref())
    }

    pub fn is_native(&self) -> bool {
        self.address.is_none()
    }
}

impl fmt::Display for AssetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.address {
            Some(address) => write!(f, "{}:{}", self.network, address),
            None => write!(f, "{}:native", self.network),
        }
    }
}

/// Lower-cases and trims a contract address
pub fn normalize_address(address: &str) -> String {
    address.trim().to_ascii_lowercase()
}

/// One asset of the dashboard: the definition plus its known balance
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciledAsset {
    #[serde(flatten)]
    pub asset: AssetDefinition,
    pub balance: String,
    /// No balance record matched yet; `balance` holds the default
    pub pending: bool,
}

/// Cache invalidation granularity
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RefreshScope {
    /// One asset; the network's native asset when `asset_id` is `None`
    #[serde(rename_all = "camelCase")]
    Asset {
        network: String,
        #[serde(default)]
        asset_id: Option<String>,
    },
    /// Native asset and every token of one network
    Network { network: String },
    /// Every asset of the account
    Wallet,
}

impl RefreshScope {
    pub fn as_str(&self) -> &str {
        match self {
            RefreshScope::Asset { .. } => "asset",
            RefreshScope::Network { .. } => "network",
            RefreshScope::Wallet => "wallet",
        }
    }
}

/// User-initiated refresh, consumed once by the balance layer
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub account_index: u32,
    pub scope: RefreshScope,
}

impl RefreshRequest {
    pub fn asset(account_index: u32, network: impl Into<String>, asset_id: Option<String>) -> Self {
        RefreshRequest {
            account_index,
            scope: RefreshScope::Asset {
                network: network.into(),
                asset_id,
            },
        }
    }

    pub fn network(account_index: u32, network: impl Into<String>) -> Self {
        RefreshRequest {
            account_index,
            scope: RefreshScope::Network {
                network: network.into(),
            },
        }
    }

    pub fn wallet(account_index: u32) -> Self {
        RefreshRequest {
            account_index,
            scope: RefreshScope::Wallet,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_key_ignores_stray_address() {
        let mut eth = AssetDefinition::native("eth-native", "ethereum", "ETH", "Ethereum", 18);
        eth.address = Some("0xDEAD".to_string());
        assert_eq!(eth.key(), AssetKey::new("ethereum", None));
        assert!(eth.key().is_native());
    }

    #[test]
    fn test_token_key_is_lowercased() {
        let usdt = AssetDefinition::token(
            "eth-usdt",
            "ethereum",
            "0xDAC17F958D2ee523a2206206994597C13D831ec7",
            "USDT",
            "Tether USD",
            6,
        );
        let record = BalanceRecord::new(
            "ethereum",
            Some("0xdac17f958d2ee523a2206206994597c13d831ec7"),
            "3",
        );
        assert_eq!(usdt.key(), record.key());
        assert_eq!(
            usdt.key().to_string(),
            "ethereum:0xdac17f958d2ee523a2206206994597c13d831ec7"
        );
    }

    #[test]
    fn test_refresh_request_serde_shape() {
        let req = RefreshRequest::asset(0, "ethereum", Some("ethereum-usdt".into()));
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["accountIndex"], 0);
        assert_eq!(json["scope"]["type"], "asset");
        assert_eq!(json["scope"]["assetId"], "ethereum-usdt");

        let wallet: RefreshRequest =
            serde_json::from_str(r#"{"accountIndex":2,"scope":{"type":"wallet"}}"#).unwrap();
        assert_eq!(wallet, RefreshRequest::wallet(2));
    }
}
