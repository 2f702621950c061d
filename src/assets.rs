//! Asset identifiers handed to the swap execution service.

use crate::errors::AppError;
use crate::models::Direction;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Opaque asset identifier. Only the execution service interprets it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct AssetId(String);

impl AssetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Network pair the swap runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Network {
    /// Local ethereum node paired with bitcoin regtest.
    #[default]
    Localnet,
    /// Sepolia paired with bitcoin testnet.
    Testnet,
}

impl FromStr for Network {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "localnet" | "local" | "regtest" => Ok(Network::Localnet),
            "testnet" => Ok(Network::Testnet),
            other => Err(AppError::Config(format!("unknown network {other:?}"))),
        }
    }
}

const LOCALNET_WBTC: &str = "ethereum_localnet:0x5FbDB2315678afecb367f032d93F642f64180aa3";
const REGTEST_BTC: &str = "bitcoin_regtest:primary";
const SEPOLIA_WBTC: &str = "ethereum_sepolia:0x3D1e56247033FE1B4CF7F2bA4Fc4C3D1ce5b4A1E";
const TESTNET_BTC: &str = "bitcoin_testnet:primary";

/// Wrapped and native identifiers for one network pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRegistry {
    pub wbtc: AssetId,
    pub btc: AssetId,
}

impl AssetRegistry {
    pub fn for_network(network: Network) -> Self {
        let (wbtc, btc) = match network {
            Network::Localnet => (LOCALNET_WBTC, REGTEST_BTC),
            Network::Testnet => (SEPOLIA_WBTC, TESTNET_BTC),
        };
        Self {
            wbtc: AssetId::new(wbtc),
            btc: AssetId::new(btc),
        }
    }

    /// Returns `(send, receive)` for the given direction.
    pub fn pair_for(&self, direction: Direction) -> (&AssetId, &AssetId) {
        match direction {
            Direction::WbtcToBtc => (&self.wbtc, &self.btc),
            Direction::BtcToWbtc => (&self.btc, &self.wbtc),
        }
    }
}
