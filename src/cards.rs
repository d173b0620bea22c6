//! Feature cards shown on the Actions tab
//!
//! Each card is a field schema plus an operation against the wallet
//! configuration, the balance reconciler or the balance source.

use anyhow::{anyhow, bail, Result};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::action::{operation, ActionRunner, FieldSpec, FormValues, SelectOption};
use crate::balance::{reconcile, BalanceReconciler, BalanceSource};
use crate::config::AppConfig;
use crate::error::SchemaError;
use crate::models::{normalize_address, AssetDefinition, BalanceRecord, RefreshRequest};

/// Collaborators the card operations close over
#[derive(Clone)]
pub struct CardContext {
    pub config: Arc<AppConfig>,
    pub reconciler: BalanceReconciler,
    pub source: Arc<dyn BalanceSource>,
}

/// Asset on `network` named by `asset_id`, or the network's native asset
fn resolve_asset(
    config: &AppConfig,
    network: &str,
    asset_id: Option<&str>,
) -> Result<AssetDefinition> {
    match asset_id {
        Some(id) => {
            let asset = config
                .asset(id)
                .ok_or_else(|| anyhow!("unknown asset '{}'", id))?;
            if asset.network != network {
                bail!("asset '{}' belongs to network '{}'", id, asset.network);
            }
            Ok(asset.clone())
        }
        None => config
            .native_asset(network)
            .cloned()
            .ok_or_else(|| anyhow!("network '{}' has no native asset configured", network)),
    }
}

fn required<'a>(values: &'a FormValues, id: &str) -> Result<&'a str> {
    values.text(id).ok_or_else(|| anyhow!("{} is required", id))
}

fn account_index(values: &FormValues) -> Result<u32> {
    match values.get("accountIndex") {
        None => Ok(0),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(0),
        Some(_) => values
            .index("accountIndex")
            .ok_or_else(|| anyhow!("account index must be a non-negative integer")),
    }
}

/// Comma-separated account indices; entries that are not indices are skipped
fn parse_indices(text: Option<&str>) -> Vec<u32> {
    match text {
        Some(text) => text
            .split(',')
            .filter_map(|part| part.trim().parse().ok())
            .collect(),
        None => vec![0],
    }
}

/// Comma-separated network names, checked against the configuration
fn parse_networks(config: &AppConfig, text: Option<&str>) -> Result<Vec<String>> {
    let Some(text) = text else {
        return Ok(config.network_names());
    };
    text.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| {
            config
                .network(name)
                .map(|network| network.name.clone())
                .ok_or_else(|| anyhow!("unknown network '{}'", name))
        })
        .collect()
}

fn account_field() -> FieldSpec {
    FieldSpec::number("accountIndex")
        .label("Account Index")
        .default_value("0")
}

/// Build the catalog of cards
pub fn build_cards(ctx: &CardContext) -> Result<Vec<ActionRunner>, SchemaError> {
    let config = ctx.config.as_ref();
    let mut cards = Vec::new();

    let shared = Arc::clone(&ctx.config);
    let reconciler = ctx.reconciler.clone();
    cards.push(
        ActionRunner::configure(
            "Force Refresh Specific Asset",
            vec![
                FieldSpec::network("network").label("Select Network"),
                FieldSpec::text("assetId")
                    .label("Asset ID (Optional)")
                    .placeholder("e.g. ethereum-native"),
                account_field(),
            ],
            operation(move |values: FormValues| {
                let config = Arc::clone(&shared);
                let reconciler = reconciler.clone();
                async move {
                    let network = required(&values, "network")?;
                    let account = account_index(&values)?;
                    // Blank asset id refreshes the whole network
                    let request = match values.text("assetId") {
                        Some(asset_id) => {
                            let asset = resolve_asset(&config, network, Some(asset_id))?;
                            RefreshRequest::asset(account, network, Some(asset.id))
                        }
                        None => RefreshRequest::network(account, network),
                    };
                    reconciler.request_refresh(request.clone());
                    Ok(json!({ "success": true, "requested": request }))
                }
            }),
            "Refresh",
            config,
        )?
        .with_description("Invalidate cache and fetch fresh balance for a specific token."),
    );

    let reconciler = ctx.reconciler.clone();
    cards.push(
        ActionRunner::configure(
            "Refresh Balances",
            vec![
                FieldSpec::select(
                    "scope",
                    vec![
                        SelectOption::new("Single asset", "asset"),
                        SelectOption::new("Whole network", "network"),
                        SelectOption::new("Whole wallet", "wallet"),
                    ],
                )
                .label("Scope"),
                FieldSpec::network("network").label("Network"),
                FieldSpec::text("assetId")
                    .label("Asset ID")
                    .placeholder("blank = native asset"),
                account_field(),
            ],
            operation(move |values: FormValues| {
                let reconciler = reconciler.clone();
                async move {
                    let account = account_index(&values)?;
                    let request = match required(&values, "scope")? {
                        "asset" => RefreshRequest::asset(
                            account,
                            required(&values, "network")?,
                            values.text("assetId").map(str::to_string),
                        ),
                        "network" => {
                            RefreshRequest::network(account, required(&values, "network")?)
                        }
                        "wallet" => RefreshRequest::wallet(account),
                        other => bail!("unknown refresh scope '{}'", other),
                    };
                    reconciler.request_refresh(request.clone());
                    Ok(request)
                }
            }),
            "Refresh",
            config,
        )?
        .with_description("Invalidate one asset, one network or the whole wallet."),
    );

    let shared = Arc::clone(&ctx.config);
    cards.push(
        ActionRunner::configure(
            "Get Network Addresses",
            vec![FieldSpec::network("network").label("Select Network")],
            operation(move |values: FormValues| {
                let config = Arc::clone(&shared);
                async move {
                    let network = required(&values, "network")?;
                    let addresses: serde_json::Map<String, Value> = config
                        .accounts
                        .iter()
                        .filter_map(|account| {
                            account
                                .addresses
                                .get(network)
                                .map(|address| (account.index.to_string(), json!(address)))
                        })
                        .collect();
                    Ok(Value::Object(addresses))
                }
            }),
            "Fetch Map",
            config,
        )?
        .with_description("Retrieve all configured addresses for a specific network."),
    );

    let shared = Arc::clone(&ctx.config);
    cards.push(
        ActionRunner::configure(
            "Account Address",
            vec![
                FieldSpec::network("network").label("Select Network"),
                FieldSpec::number("index").label("Account Index").default_value("0"),
            ],
            operation(move |values: FormValues| {
                let config = Arc::clone(&shared);
                async move {
                    let network = required(&values, "network")?;
                    let index = values
                        .index("index")
                        .ok_or_else(|| anyhow!("account index must be a non-negative integer"))?;
                    let address = config.address(index, network).ok_or_else(|| {
                        anyhow!("no address configured for account {} on '{}'", index, network)
                    })?;
                    Ok(json!({ "network": network, "index": index, "address": address }))
                }
            }),
            "Get Address",
            config,
        )?
        .with_description("Look up the address of one account index."),
    );

    let shared = Arc::clone(&ctx.config);
    cards.push(
        ActionRunner::configure(
            "Load Addresses",
            vec![
                FieldSpec::text("indices")
                    .label("Account Indices (comma-separated)")
                    .placeholder("0, 1, 2"),
                FieldSpec::text("networks")
                    .label("Networks (comma-separated, optional)")
                    .placeholder("ethereum (leave empty for all)"),
            ],
            operation(move |values: FormValues| {
                let config = Arc::clone(&shared);
                async move {
                    let indices = parse_indices(values.text("indices"));
                    let networks = parse_networks(&config, values.text("networks"))?;
                    let mut addresses = Vec::new();
                    for &index in &indices {
                        for network in &networks {
                            if let Some(address) = config.address(index, network) {
                                addresses.push(json!({
                                    "accountIndex": index,
                                    "network": network,
                                    "address": address,
                                }));
                            }
                        }
                    }
                    let listed: Vec<String> = indices.iter().map(u32::to_string).collect();
                    Ok(json!({
                        "success": true,
                        "message": format!("Loaded addresses for indices: {}", listed.join(", ")),
                        "addresses": addresses,
                    }))
                }
            }),
            "Load Addresses",
            config,
        )?
        .with_description("Fetch addresses for specific account indices and networks."),
    );

    let shared = Arc::clone(&ctx.config);
    cards.push(
        ActionRunner::configure(
            "Resolve Address Info",
            vec![FieldSpec::text("address")
                .label("Wallet Address")
                .placeholder("0x...")],
            operation(move |values: FormValues| {
                let config = Arc::clone(&shared);
                async move {
                    let wanted = normalize_address(required(&values, "address")?);
                    config
                        .accounts
                        .iter()
                        .find_map(|account| {
                            account
                                .addresses
                                .iter()
                                .find(|(_, address)| normalize_address(address) == wanted)
                                .map(|(network, _)| {
                                    json!({ "accountIndex": account.index, "network": network })
                                })
                        })
                        .ok_or_else(|| anyhow!("Address not found in configured accounts"))
                }
            }),
            "Resolve",
            config,
        )?
        .with_description("Find account info for a specific address string."),
    );

    let shared = Arc::clone(&ctx.config);
    let source = Arc::clone(&ctx.source);
    cards.push(
        ActionRunner::configure(
            "Fetch Single Balance",
            vec![
                FieldSpec::network("network").label("Select Network"),
                FieldSpec::text("assetId")
                    .label("Asset ID (Optional)")
                    .placeholder("blank = native asset"),
                account_field(),
            ],
            operation(move |values: FormValues| {
                let config = Arc::clone(&shared);
                let source = Arc::clone(&source);
                async move {
                    let network = required(&values, "network")?;
                    let account = account_index(&values)?;
                    let asset = resolve_asset(&config, network, values.text("assetId"))?;
                    let records: Vec<BalanceRecord> =
                        source.fetch(account, &asset).await?.into_iter().collect();
                    Ok(reconcile(std::slice::from_ref(&asset), &records).remove(0))
                }
            }),
            "Get Balance",
            config,
        )?
        .with_description(
            "Query one balance straight from the balance source, bypassing the cache.",
        ),
    );

    let shared = Arc::clone(&ctx.config);
    cards.push(
        ActionRunner::configure(
            "Reconcile Snapshot",
            vec![FieldSpec::json("records")
                .label("Balance Records (JSON)")
                .default_value(
                    r#"[{"network":"ethereum","assetAddress":null,"balance":"1.5"}]"#,
                )],
            operation(move |values: FormValues| {
                let config = Arc::clone(&shared);
                async move {
                    let records: Vec<BalanceRecord> = match values.get("records") {
                        Some(value @ Value::Array(_)) => serde_json::from_value(value.clone())?,
                        _ => bail!("records must be a JSON array of balance records"),
                    };
                    Ok(reconcile(&config.assets, &records))
                }
            }),
            "Reconcile",
            config,
        )?
        .with_description(
            "Merge a hand-written set of balance records with the configured assets.",
        ),
    );

    let shared = Arc::clone(&ctx.config);
    cards.push(
        ActionRunner::configure(
            "View Config",
            vec![],
            operation(move |_values: FormValues| {
                let config = Arc::clone(&shared);
                async move { Ok(config.as_ref().clone()) }
            }),
            "Show",
            config,
        )?
        .with_description("Networks, assets and accounts the deck was started with."),
    );

    Ok(cards)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Outcome;
    use crate::balance::FixtureBalanceSource;
    use crate::messages::BalanceCommand;
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn context() -> (CardContext, mpsc::UnboundedReceiver<BalanceCommand>) {
        let mut config = AppConfig::default();
        config.accounts[0].addresses.insert(
            "ethereum".into(),
            "0x1111111111111111111111111111111111111111".into(),
        );
        let (tx, rx) = mpsc::unbounded_channel();
        let source = FixtureBalanceSource::new(Duration::ZERO)
            .with_record(0, BalanceRecord::new("ethereum", None, "1.5"));
        let ctx = CardContext {
            reconciler: BalanceReconciler::new(&config, tx),
            config: Arc::new(config),
            source: Arc::new(source),
        };
        (ctx, rx)
    }

    fn card<'a>(cards: &'a mut [ActionRunner], title: &str) -> &'a mut ActionRunner {
        cards.iter_mut().find(|c| c.title() == title).unwrap()
    }

    #[test]
    fn test_catalog_builds() {
        let (ctx, _rx) = context();
        let cards = build_cards(&ctx).unwrap();
        assert_eq!(cards.len(), 9);
        assert!(cards.iter().all(|c| c.current_outcome() == &Outcome::Idle));
        assert_eq!(cards.last().unwrap().title(), "View Config");
    }

    #[tokio::test]
    async fn test_force_refresh_sends_request() {
        let (ctx, mut rx) = context();
        let mut cards = build_cards(&ctx).unwrap();

        let refresh = card(&mut cards, "Force Refresh Specific Asset");
        refresh.run_to_completion().await;
        assert_eq!(
            rx.try_recv().unwrap(),
            BalanceCommand::Refresh {
                id: 1,
                request: RefreshRequest::network(0, "ethereum"),
            }
        );

        refresh.update_field("assetId", "ethereum-usdt").unwrap();
        refresh.run_to_completion().await;
        assert_eq!(
            rx.try_recv().unwrap(),
            BalanceCommand::Refresh {
                id: 2,
                request: RefreshRequest::asset(0, "ethereum", Some("ethereum-usdt".into())),
            }
        );
    }

    #[tokio::test]
    async fn test_force_refresh_rejects_asset_of_other_network() {
        let (ctx, mut rx) = context();
        let mut cards = build_cards(&ctx).unwrap();

        let refresh = card(&mut cards, "Force Refresh Specific Asset");
        refresh.update_field("network", "polygon").unwrap();
        refresh.update_field("assetId", "ethereum-usdt").unwrap();
        assert_eq!(
            refresh.run_to_completion().await.unwrap(),
            &Outcome::Failed("asset 'ethereum-usdt' belongs to network 'ethereum'".into())
        );

        refresh.update_field("network", "ethereum").unwrap();
        refresh.update_field("assetId", "ethereum-doge").unwrap();
        assert_eq!(
            refresh.run_to_completion().await.unwrap(),
            &Outcome::Failed("unknown asset 'ethereum-doge'".into())
        );
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_refresh_balances_wallet_scope() {
        let (ctx, mut rx) = context();
        let mut cards = build_cards(&ctx).unwrap();

        let refresh = card(&mut cards, "Refresh Balances");
        refresh.update_field("scope", "wallet").unwrap();
        refresh.update_field("accountIndex", "3").unwrap();
        refresh.run_to_completion().await;
        let Ok(BalanceCommand::Refresh { request, .. }) = rx.try_recv() else {
            panic!("expected a refresh");
        };
        assert_eq!(request, RefreshRequest::wallet(3));
    }

    #[tokio::test]
    async fn test_load_addresses() {
        let (ctx, _rx) = context();
        let mut cards = build_cards(&ctx).unwrap();

        let load = card(&mut cards, "Load Addresses");
        let Outcome::Succeeded(loaded) = load.run_to_completion().await.unwrap().clone() else {
            panic!("loading default indices failed");
        };
        assert_eq!(loaded["message"], "Loaded addresses for indices: 0");
        assert_eq!(
            loaded["addresses"],
            json!([{
                "accountIndex": 0,
                "network": "ethereum",
                "address": "0x1111111111111111111111111111111111111111"
            }])
        );

        load.update_field("indices", "2, x, 0").unwrap();
        let Outcome::Succeeded(loaded) = load.run_to_completion().await.unwrap().clone() else {
            panic!("loading listed indices failed");
        };
        assert_eq!(loaded["message"], "Loaded addresses for indices: 2, 0");
        assert_eq!(loaded["addresses"].as_array().unwrap().len(), 1);

        load.update_field("networks", "ethereum, bitcoin").unwrap();
        assert_eq!(
            load.run_to_completion().await.unwrap(),
            &Outcome::Failed("unknown network 'bitcoin'".into())
        );
    }

    #[tokio::test]
    async fn test_resolve_address_info() {
        let (ctx, _rx) = context();
        let mut cards = build_cards(&ctx).unwrap();

        let resolve = card(&mut cards, "Resolve Address Info");
        resolve
            .update_field("address", " 0X1111111111111111111111111111111111111111")
            .unwrap();
        assert_eq!(
            resolve.run_to_completion().await.unwrap(),
            &Outcome::Succeeded(json!({ "accountIndex": 0, "network": "ethereum" }))
        );

        resolve
            .update_field("address", "0x2222222222222222222222222222222222222222")
            .unwrap();
        assert_eq!(
            resolve.run_to_completion().await.unwrap(),
            &Outcome::Failed("Address not found in configured accounts".into())
        );

        resolve.update_field("address", "").unwrap();
        assert_eq!(
            resolve.run_to_completion().await.unwrap(),
            &Outcome::Failed("address is required".into())
        );
    }

    #[tokio::test]
    async fn test_account_address_lookup() {
        let (ctx, _rx) = context();
        let mut cards = build_cards(&ctx).unwrap();

        let lookup = card(&mut cards, "Account Address");
        let outcome = lookup.run_to_completion().await.unwrap().clone();
        assert_eq!(
            outcome,
            Outcome::Succeeded(json!({
                "network": "ethereum",
                "index": 0,
                "address": "0x1111111111111111111111111111111111111111"
            }))
        );

        lookup.update_field("index", "4").unwrap();
        let outcome = lookup.run_to_completion().await.unwrap();
        assert_eq!(
            outcome,
            &Outcome::Failed("no address configured for account 4 on 'ethereum'".into())
        );
    }

    #[tokio::test]
    async fn test_fetch_single_balance() {
        let (ctx, _rx) = context();
        let mut cards = build_cards(&ctx).unwrap();

        let fetch = card(&mut cards, "Fetch Single Balance");
        let Outcome::Succeeded(native) = fetch.run_to_completion().await.unwrap().clone() else {
            panic!("native balance lookup failed");
        };
        assert_eq!(native["id"], "ethereum-native");
        assert_eq!(native["balance"], "1.5");
        assert_eq!(native["pending"], false);

        fetch.update_field("assetId", "ethereum-xaut").unwrap();
        let Outcome::Succeeded(xaut) = fetch.run_to_completion().await.unwrap().clone() else {
            panic!("token balance lookup failed");
        };
        assert_eq!(xaut["balance"], "0");
        assert_eq!(xaut["pending"], true);

        fetch.update_field("assetId", "bitcoin-native").unwrap();
        assert_eq!(
            fetch.run_to_completion().await.unwrap(),
            &Outcome::Failed("unknown asset 'bitcoin-native'".into())
        );
    }

    #[tokio::test]
    async fn test_reconcile_snapshot_card() {
        let (ctx, _rx) = context();
        let mut cards = build_cards(&ctx).unwrap();

        let snapshot = card(&mut cards, "Reconcile Snapshot");
        let Outcome::Succeeded(view) = snapshot.run_to_completion().await.unwrap().clone() else {
            panic!("reconcile failed");
        };
        assert_eq!(view[0]["balance"], "1.5");
        assert_eq!(view[1]["balance"], "0");
        assert_eq!(view.as_array().unwrap().len(), 4);

        snapshot.update_field("records", "not json").unwrap();
        assert_eq!(
            snapshot.run_to_completion().await.unwrap(),
            &Outcome::Failed("records must be a JSON array of balance records".into())
        );
    }
}
