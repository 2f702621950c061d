//! Configuration loader and application settings.

use crate::assets::{AssetId, AssetRegistry, Network};
use crate::errors::{AppError, Result};
use crate::models::Direction;
use std::time::Duration;

const DEFAULT_LOOKUP_TIMEOUT_SECS: u64 = 30;

/// Consolidated application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Network pair the asset identifiers belong to.
    pub network: Network,
    /// Asset identifiers handed to the execution service.
    pub registry: AssetRegistry,
    /// Direction the form starts in.
    pub direction: Direction,
    /// Account the local wallet reports once connected.
    pub evm_account_address: String,
    /// Address the local bitcoin signer reports once signed.
    pub btc_address: String,
    /// Upper bound for a single address lookup.
    pub lookup_timeout: Duration,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from any key/value source.
    pub fn from_lookup<F>(get: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let network: Network = get("SWAP_NETWORK")
            .unwrap_or_else(|| "localnet".into())
            .parse()?;

        let mut registry = AssetRegistry::for_network(network);
        if let Some(id) = get("WBTC_ASSET_ID").filter(|s| !s.trim().is_empty()) {
            registry.wbtc = AssetId::new(id.trim());
        }
        if let Some(id) = get("BTC_ASSET_ID").filter(|s| !s.trim().is_empty()) {
            registry.btc = AssetId::new(id.trim());
        }

        let direction: Direction = get("DIRECTION")
            .unwrap_or_else(|| Direction::default().to_string())
            .parse()?;

        let lookup_timeout_secs: u64 = match get("LOOKUP_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse().map_err(|_| {
                AppError::Config(format!("LOOKUP_TIMEOUT_SECS must be whole seconds, got {raw:?}"))
            })?,
            None => DEFAULT_LOOKUP_TIMEOUT_SECS,
        };
        if lookup_timeout_secs == 0 {
            return Err(AppError::Config("LOOKUP_TIMEOUT_SECS must be positive".into()));
        }

        let evm_account_address = get("EVM_ACCOUNT_ADDRESS")
            .unwrap_or_else(|| "0x70997970C51812dc3A010C7d01b50e0d17dc79C8".into());
        let btc_address = get("BTC_ADDRESS")
            .unwrap_or_else(|| "bcrt1qw508d6qejxtdg4y5r3zarvary0c5xw7kygt080".into());

        Ok(Self {
            network,
            registry,
            direction,
            evm_account_address,
            btc_address,
            lookup_timeout: Duration::from_secs(lookup_timeout_secs),
        })
    }
}
