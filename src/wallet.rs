//! Collaborator interfaces: wallet connection, bitcoin address provider and
//! swap execution service.
//!
//! The form never reaches for these through globals; each one is injected
//! into [`crate::controller::SwapController`] as a trait object.

use crate::assets::AssetId;
use crate::errors::Result;
use crate::models::SwapReceipt;
use async_trait::async_trait;

/// Connection to the smart-contract network wallet.
#[async_trait]
pub trait WalletConnection: Send + Sync {
    /// Identifier of the live connection, `None` while disconnected.
    /// A reconnect yields a new identifier.
    fn connection_id(&self) -> Option<u64>;

    fn is_connected(&self) -> bool {
        self.connection_id().is_some()
    }

    async fn connect(&self) -> Result<()>;

    /// First account exposed by the connected wallet.
    async fn account_address(&self) -> Result<String>;
}

/// Source of the native bitcoin receive address.
#[async_trait]
pub trait BitcoinAddressProvider: Send + Sync {
    /// Identifier of the current signed state, `None` until signed.
    fn signed_id(&self) -> Option<u64>;

    async fn get_address(&self) -> Result<String>;
}

/// External service that executes the swap.
#[async_trait]
pub trait SwapExecutor: Send + Sync {
    async fn swap(
        &self,
        send_asset: &AssetId,
        receive_asset: &AssetId,
        send_amount_base_units: u64,
        receive_amount_base_units: u64,
    ) -> Result<SwapReceipt>;
}
