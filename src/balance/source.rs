//! Balance sources - where the fetch layer gets raw balances from
//!
//! `Ok(None)` means the source has no balance for the pair yet; the
//! dashboard shows it as pending.

use anyhow::{anyhow, bail, Context, Result};
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{AppConfig, BalanceSourceKind};
use crate::constants::RPC_TIMEOUT_SECS;
use crate::models::{AssetDefinition, AssetKey, BalanceRecord};

/// Async balance lookup for one (account, asset) pair
pub trait BalanceSource: Send + Sync {
    fn fetch(
        &self,
        account_index: u32,
        asset: &AssetDefinition,
    ) -> BoxFuture<'static, Result<Option<BalanceRecord>>>;
}

/// Build the source selected by the configuration
pub fn source_from_config(config: &AppConfig) -> Arc<dyn BalanceSource> {
    match config.balance_source {
        BalanceSourceKind::Fixture => Arc::new(FixtureBalanceSource::from_config(config)),
        BalanceSourceKind::Rpc => Arc::new(RpcBalanceSource::from_config(config)),
    }
}

// ============================================================================
// Fixture source
// ============================================================================

/// Serves canned records, optionally after a delay
#[derive(Clone, Debug, Default)]
pub struct FixtureBalanceSource {
    records: HashMap<(u32, AssetKey), BalanceRecord>,
    latency: Duration,
}

impl FixtureBalanceSource {
    pub fn new(latency: Duration) -> Self {
        FixtureBalanceSource {
            records: HashMap::new(),
            latency,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let mut source = Self::new(Duration::from_millis(config.fixture_latency_ms));
        for fixture in &config.fixtures {
            source.insert(fixture.account_index, fixture.record.clone());
        }
        source
    }

    pub fn with_record(mut self, account_index: u32, record: BalanceRecord) -> Self {
        self.insert(account_index, record);
        self
    }

    pub fn insert(&mut self, account_index: u32, record: BalanceRecord) {
        self.records.insert((account_index, record.key()), record);
    }
}

impl BalanceSource for FixtureBalanceSource {
    fn fetch(
        &self,
        account_index: u32,
        asset: &AssetDefinition,
    ) -> BoxFuture<'static, Result<Option<BalanceRecord>>> {
        let record = self.records.get(&(account_index, asset.key())).cloned();
        let latency = self.latency;
        async move {
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }
            Ok(record)
        }
        .boxed()
    }
}

// ============================================================================
// EVM JSON-RPC source
// ============================================================================

/// `balanceOf(address)` selector
const BALANCE_OF_SELECTOR: &str = "70a08231";

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<Value>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

/// Reads native and ERC-20 balances of the configured watch-only addresses
#[derive(Clone, Debug)]
pub struct RpcBalanceSource {
    client: reqwest::Client,
    providers: HashMap<String, String>,
    addresses: HashMap<(u32, String), String>,
}

impl RpcBalanceSource {
    pub fn from_config(config: &AppConfig) -> Self {
        let providers = config
            .networks
            .iter()
            .filter_map(|n| n.provider.clone().map(|p| (n.name.clone(), p)))
            .collect();
        let addresses = config
            .accounts
            .iter()
            .flat_map(|account| {
                account.addresses.iter().map(move |(network, address)| {
                    ((account.index, network.clone()), address.clone())
                })
            })
            .collect();
        RpcBalanceSource {
            client: create_client(),
            providers,
            addresses,
        }
    }
}

impl BalanceSource for RpcBalanceSource {
    fn fetch(
        &self,
        account_index: u32,
        asset: &AssetDefinition,
    ) -> BoxFuture<'static, Result<Option<BalanceRecord>>> {
        let client = self.client.clone();
        let provider = self.providers.get(&asset.network).cloned();
        let owner = self
            .addresses
            .get(&(account_index, asset.network.clone()))
            .cloned();
        let asset = asset.clone();

        async move {
            let provider = provider
                .ok_or_else(|| anyhow!("no provider configured for network '{}'", asset.network))?;
            let owner = owner.ok_or_else(|| {
                anyhow!(
                    "no address configured for account {} on '{}'",
                    account_index,
                    asset.network
                )
            })?;

            let raw = match (asset.is_native, &asset.address) {
                (false, Some(token)) => {
                    let data = balance_of_calldata(&owner)?;
                    rpc_call(
                        &client,
                        &provider,
                        "eth_call",
                        json!([{ "to": token, "data": data }, "latest"]),
                    )
                    .await?
                }
                _ => {
                    rpc_call(
                        &client,
                        &provider,
                        "eth_getBalance",
                        json!([owner, "latest"]),
                    )
                    .await?
                }
            };

            let amount = parse_hex_quantity(&raw)
                .with_context(|| format!("decoding balance of {}", asset.id))?;
            tracing::debug!(asset = %asset.id, account = account_index, "Fetched balance over rpc");

            Ok(Some(BalanceRecord {
                network: asset.network.clone(),
                asset_address: if asset.is_native { None } else { asset.address.clone() },
                balance: format_units(amount, asset.decimals),
            }))
        }
        .boxed()
    }
}

/// Issue one JSON-RPC call and return its string result
async fn rpc_call(
    client: &reqwest::Client,
    provider: &str,
    method: &str,
    params: Value,
) -> Result<String> {
    let body = json!({ "jsonrpc": "2.0", "id": 1, "method": method, "params": params });
    let response = client.post(provider).json(&body).send().await.map_err(|e| {
        if e.is_timeout() {
            anyhow!("{} timed out ({}s)", method, RPC_TIMEOUT_SECS)
        } else if e.is_connect() {
            anyhow!("Connection failed: {}", e)
        } else {
            anyhow!("Request failed: {}", e)
        }
    })?;

    let status = response.status();
    if !status.is_success() {
        bail!("{} returned HTTP {}", method, status.as_u16());
    }

    let decoded: RpcResponse = response
        .json()
        .await
        .with_context(|| format!("decoding {} response", method))?;
    if let Some(err) = decoded.error {
        bail!("{} failed ({}): {}", method, err.code, err.message);
    }
    match decoded.result {
        Some(Value::String(result)) => Ok(result),
        other => bail!("{} returned unexpected result: {:?}", method, other),
    }
}

/// Calldata for `balanceOf(owner)`
pub fn balance_of_calldata(owner: &str) -> Result<String> {
    let hex = owner.trim().trim_start_matches("0x").to_ascii_lowercase();
    if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        bail!("invalid address '{}'", owner);
    }
    Ok(format!("0x{}{:0>64}", BALANCE_OF_SELECTOR, hex))
}

/// Parse a `0x`-prefixed quantity or 32-byte word
pub fn parse_hex_quantity(raw: &str) -> Result<u128> {
    let digits = raw.trim().trim_start_matches("0x").trim_start_matches('0');
    if digits.is_empty() {
        return Ok(0);
    }
    if digits.len() > 32 {
        bail!("balance 0x{} does not fit in 128 bits", digits);
    }
    u128::from_str_radix(digits, 16).with_context(|| format!("invalid hex quantity '{}'", raw))
}

/// Scale a raw integer amount by `decimals`, trimming trailing zeros
pub fn format_units(amount: u128, decimals: u8) -> String {
    let digits = amount.to_string();
    let decimals = decimals as usize;
    if decimals == 0 {
        return digits;
    }

    let padded = format!("{:0>width$}", digits, width = decimals + 1);
    let (int, frac) = padded.split_at(padded.len() - decimals);
    let frac = frac.trim_end_matches('0');
    if frac.is_empty() {
        int.to_string()
    } else {
        format!("{}.{}", int, frac)
    }
}

/// Create an HTTP client with default configuration
pub fn create_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(RPC_TIMEOUT_SECS))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}
