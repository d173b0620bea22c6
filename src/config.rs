//! Wallet configuration - networks, asset catalog, watch-only accounts
//!
//! Threaded explicitly into the action cards and the balance layer. Never
//! mutated after load.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::{CONFIG_DIR_NAME, CONFIG_ENV_VAR, CONFIG_FILE_NAME};
use crate::error::ConfigError;
use crate::models::{AssetDefinition, BalanceRecord};

/// One network the wallet engine is configured for
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub name: String,
    /// JSON-RPC endpoint, required by the rpc balance source
    #[serde(default)]
    pub provider: Option<String>,
}

/// Watch-only addresses of one account index
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountConfig {
    pub index: u32,
    /// network name -> address
    #[serde(default)]
    pub addresses: BTreeMap<String, String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BalanceSourceKind {
    #[default]
    Fixture,
    Rpc,
}

/// Canned balance served by the fixture source
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureBalance {
    #[serde(default)]
    pub account_index: u32,
    #[serde(flatten)]
    pub record: BalanceRecord,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Order is the network-select order
    pub networks: Vec<NetworkConfig>,
    pub assets: Vec<AssetDefinition>,
    #[serde(default)]
    pub accounts: Vec<AccountConfig>,
    #[serde(default)]
    pub balance_source: BalanceSourceKind,
    #[serde(default)]
    pub fixtures: Vec<FixtureBalance>,
    #[serde(default)]
    pub fixture_latency_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            networks: vec![NetworkConfig {
                name: "ethereum".to_string(),
                provider: Some("https://ethereum-sepolia.gateway.tatum.io".to_string()),
            }],
            assets: vec![
                AssetDefinition::native("ethereum-native", "ethereum", "ETH", "Ethereum", 18),
                AssetDefinition::token(
                    "ethereum-usdt",
                    "ethereum",
                    "0xdAC17F958D2ee523a2206206994597C13D831ec7",
                    "USDT",
                    "Tether USD",
                    6,
                ),
                AssetDefinition::token(
                    "ethereum-xaut",
                    "ethereum",
                    "0x68749665FF8D2d112Fa859AA293F07A622782F38",
                    "XAUT",
                    "Tether Gold",
                    6,
                ),
                AssetDefinition::token(
                    "ethereum-usat",
                    "ethereum",
                    "0x07041776f5007aca2a54844f50503a18a72a8b68",
                    "USAT",
                    "Tether USAT",
                    6,
                ),
            ],
            accounts: vec![AccountConfig {
                index: 0,
                addresses: BTreeMap::new(),
            }],
            balance_source: BalanceSourceKind::Fixture,
            fixtures: vec![
                FixtureBalance {
                    account_index: 0,
                    record: BalanceRecord::new("ethereum", None, "1.5"),
                },
                FixtureBalance {
                    account_index: 0,
                    record: BalanceRecord::new(
                        "ethereum",
                        Some("0xdac17f958d2ee523a2206206994597c13d831ec7"),
                        "250.00",
                    ),
                },
            ],
            fixture_latency_ms: 300,
        }
    }
}

impl AppConfig {
    /// Load from `$WALLETDECK_CONFIG`, then `~/.walletdeck/config.yaml`,
    /// falling back to the built-in defaults
    pub fn load() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => {
                let config = AppConfig::default();
                config.validate()?;
                Ok(config)
            }
        }
    }

    pub fn default_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            return Some(PathBuf::from(path));
        }
        dirs::home_dir().map(|home| home.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: AppConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.validate()?;
        tracing::info!(
            path = %path.display(),
            networks = config.networks.len(),
            assets = config.assets.len(),
            "Loaded config"
        );
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir)?;
            }
        }
        fs::write(path, serde_yaml::to_string(self)?)?;
        Ok(())
    }

    /// Check catalog invariants
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.networks.is_empty() {
            return Err(ConfigError::NoNetworks);
        }

        let mut networks = HashSet::new();
        for network in &self.networks {
            if !networks.insert(network.name.as_str()) {
                return Err(ConfigError::DuplicateNetwork(network.name.clone()));
            }
            if self.balance_source == BalanceSourceKind::Rpc && network.provider.is_none() {
                return Err(ConfigError::MissingProvider(network.name.clone()));
            }
        }

        let mut ids = HashSet::new();
        let mut natives: HashMap<&str, &str> = HashMap::new();
        for asset in &self.assets {
            if !ids.insert(asset.id.as_str()) {
                return Err(ConfigError::DuplicateAsset(asset.id.clone()));
            }
            if !networks.contains(asset.network.as_str()) {
                return Err(ConfigError::UnknownNetwork {
                    asset: asset.id.clone(),
                    network: asset.network.clone(),
                });
            }
            match (asset.is_native, &asset.address) {
                (true, Some(_)) => return Err(ConfigError::NativeWithAddress(asset.id.clone())),
                (false, None) => return Err(ConfigError::TokenWithoutAddress(asset.id.clone())),
                _ => {}
            }
            if asset.is_native {
                if let Some(first) = natives.insert(asset.network.as_str(), asset.id.as_str()) {
                    return Err(ConfigError::MultipleNatives {
                        network: asset.network.clone(),
                        first: first.to_string(),
                        second: asset.id.clone(),
                    });
                }
            }
        }

        Ok(())
    }

    pub fn network_names(&self) -> Vec<String> {
        self.networks.iter().map(|n| n.name.clone()).collect()
    }

    pub fn network(&self, name: &str) -> Option<&NetworkConfig> {
        self.networks.iter().find(|n| n.name == name)
    }

    pub fn asset(&self, id: &str) -> Option<&AssetDefinition> {
        self.assets.iter().find(|a| a.id == id)
    }

    pub fn native_asset(&self, network: &str) -> Option<&AssetDefinition> {
        self.assets
            .iter()
            .find(|a| a.network == network && a.is_native)
    }

    pub fn assets_for_network<'a>(
        &'a self,
        network: &'a str,
    ) -> impl Iterator<Item = &'a AssetDefinition> + 'a {
        self.assets.iter().filter(move |a| a.network == network)
    }

    pub fn account(&self, index: u32) -> Option<&AccountConfig> {
        self.accounts.iter().find(|a| a.index == index)
    }

    pub fn address(&self, index: u32, network: &str) -> Option<&str> {
        self.account(index)
            .and_then(|a| a.addresses.get(network))
            .map(String::as_str)
    }

    /// Account indices in configuration order, never empty
    pub fn account_indices(&self) -> Vec<u32> {
        let indices: Vec<u32> = self.accounts.iter().map(|a| a.index).collect();
        if indices.is_empty() {
            vec![0]
        } else {
            indices
        }
    }
}
