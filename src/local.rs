//! In-process collaborators used by the console binary.

use crate::assets::AssetId;
use crate::errors::{AppError, Result};
use crate::models::SwapReceipt;
use crate::wallet::{BitcoinAddressProvider, SwapExecutor, WalletConnection};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

/// Toggleable session id: 0 means inactive.
#[derive(Debug, Default)]
struct Session {
    current: AtomicU64,
    issued: AtomicU64,
}

impl Session {
    fn open(&self) -> u64 {
        let id = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        self.current.store(id, Ordering::SeqCst);
        id
    }

    fn close(&self) {
        self.current.store(0, Ordering::SeqCst);
    }

    fn id(&self) -> Option<u64> {
        let id = self.current.load(Ordering::SeqCst);
        (id != 0).then_some(id)
    }
}

/// Wallet that connects instantly and exposes a fixed account.
#[derive(Debug)]
pub struct LocalWallet {
    account: String,
    session: Session,
}

impl LocalWallet {
    pub fn new(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            session: Session::default(),
        }
    }

    pub fn disconnect(&self) {
        self.session.close();
        info!("[WALLET] disconnected");
    }
}

#[async_trait]
impl WalletConnection for LocalWallet {
    fn connection_id(&self) -> Option<u64> {
        self.session.id()
    }

    async fn connect(&self) -> Result<()> {
        let id = self.session.open();
        info!(connection_id = id, "[WALLET] connected");
        Ok(())
    }

    async fn account_address(&self) -> Result<String> {
        if self.session.id().is_none() {
            return Err(AppError::Wallet("wallet is not connected".into()));
        }
        Ok(self.account.clone())
    }
}

/// Bitcoin signer holding a fixed address, available once signed.
#[derive(Debug)]
pub struct LocalBitcoinSigner {
    address: String,
    session: Session,
}

impl LocalBitcoinSigner {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            session: Session::default(),
        }
    }

    pub fn sign(&self) -> u64 {
        let id = self.session.open();
        info!(signed_id = id, "[SIGNER] signed");
        id
    }

    pub fn sign_out(&self) {
        self.session.close();
    }
}

#[async_trait]
impl BitcoinAddressProvider for LocalBitcoinSigner {
    fn signed_id(&self) -> Option<u64> {
        self.session.id()
    }

    async fn get_address(&self) -> Result<String> {
        if self.session.id().is_none() {
            return Err(AppError::Wallet("bitcoin signer has not signed".into()));
        }
        Ok(self.address.clone())
    }
}

/// Execution service stand-in that accepts every swap and logs it.
#[derive(Debug, Default)]
pub struct LoggingExecutor {
    orders: AtomicU64,
}

#[async_trait]
impl SwapExecutor for LoggingExecutor {
    async fn swap(
        &self,
        send_asset: &AssetId,
        receive_asset: &AssetId,
        send_amount_base_units: u64,
        receive_amount_base_units: u64,
    ) -> Result<SwapReceipt> {
        let order = self.orders.fetch_add(1, Ordering::SeqCst) + 1;
        info!(
            order,
            %send_asset,
            %receive_asset,
            send_amount_base_units,
            receive_amount_base_units,
            "[EXEC] swap accepted"
        );
        Ok(SwapReceipt {
            order_id: format!("local-{order}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn wallet_reconnect_issues_new_id() {
        let wallet = LocalWallet::new("0xabc");
        assert!(!wallet.is_connected());
        assert!(wallet.account_address().await.is_err());

        wallet.connect().await.unwrap();
        let first = wallet.connection_id().unwrap();
        assert_eq!(wallet.account_address().await.unwrap(), "0xabc");

        wallet.disconnect();
        assert_eq!(wallet.connection_id(), None);
        wallet.connect().await.unwrap();
        assert_ne!(wallet.connection_id(), Some(first));
    }

    #[tokio::test]
    async fn signer_gates_address_on_signature() {
        let signer = LocalBitcoinSigner::new("bcrt1qsigner");
        assert!(signer.get_address().await.is_err());
        let id = signer.sign();
        assert_eq!(signer.signed_id(), Some(id));
        assert_eq!(signer.get_address().await.unwrap(), "bcrt1qsigner");
        signer.sign_out();
        assert_eq!(signer.signed_id(), None);
    }

    #[tokio::test]
    async fn executor_numbers_orders() {
        let exec = LoggingExecutor::default();
        let a = AssetId::new("a");
        let b = AssetId::new("b");
        assert_eq!(exec.swap(&a, &b, 10, 9).await.unwrap().order_id, "local-1");
        assert_eq!(exec.swap(&b, &a, 10, 9).await.unwrap().order_id, "local-2");
    }
}
