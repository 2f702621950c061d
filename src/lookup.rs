//! Cancellable address lookups.
//!
//! Each slot runs at most one lookup, keyed by the condition that triggered
//! it (a wallet connection id, a signed-state id). Starting under a new key
//! aborts the previous task, and a result is only written while the slot's
//! generation still matches the one the task was started with.

use crate::errors::{AppError, Result};
use crate::models::{AddressKind, AddressSlot};
use futures::future::BoxFuture;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub struct LookupSlot {
    kind: AddressKind,
    timeout: Duration,
    key: Option<u64>,
    task: Option<JoinHandle<()>>,
    generation: Arc<AtomicU64>,
    tx: watch::Sender<AddressSlot>,
}

impl LookupSlot {
    pub fn new(kind: AddressKind, timeout: Duration) -> Self {
        let (tx, _rx) = watch::channel(AddressSlot::Unset);
        Self {
            kind,
            timeout,
            key: None,
            task: None,
            generation: Arc::new(AtomicU64::new(0)),
            tx,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<AddressSlot> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> AddressSlot {
        self.tx.borrow().clone()
    }

    /// Key of the lookup currently owning the slot.
    pub fn key(&self) -> Option<u64> {
        self.key
    }

    /// Start a lookup for `key`, aborting whatever ran under an older key.
    /// Returns `false` when a lookup for the same key was already started.
    pub fn start(&mut self, key: u64, lookup: BoxFuture<'static, Result<String>>) -> bool {
        if self.key == Some(key) {
            return false;
        }
        let started_generation = self.invalidate(AddressSlot::Pending);
        self.key = Some(key);

        let kind = self.kind;
        let timeout = self.timeout;
        let tx = self.tx.clone();
        let generation = Arc::clone(&self.generation);
        debug!(?kind, key, "[LOOKUP] started");

        self.task = Some(tokio::spawn(async move {
            let slot = match tokio::time::timeout(timeout, lookup).await {
                Ok(Ok(address)) => {
                    info!(?kind, %address, "[LOOKUP] resolved");
                    AddressSlot::Resolved(address)
                }
                Ok(Err(e)) => {
                    warn!(?kind, error = %e, "[LOOKUP] failed");
                    AddressSlot::Failed(e.to_string())
                }
                Err(_) => {
                    let e = AppError::Timeout(timeout.as_secs());
                    warn!(?kind, error = %e, "[LOOKUP] failed");
                    AddressSlot::Failed(e.to_string())
                }
            };

            let written = tx.send_if_modified(|current| {
                if generation.load(Ordering::SeqCst) != started_generation {
                    return false;
                }
                *current = slot;
                true
            });
            if !written {
                debug!(?kind, key, "[LOOKUP] stale result discarded");
            }
        }));
        true
    }

    /// The triggering condition went away: stop any lookup and clear the slot.
    pub fn cancel(&mut self) {
        if self.key.is_none() && self.task.is_none() {
            return;
        }
        debug!(kind = ?self.kind, key = ?self.key, "[LOOKUP] cancelled");
        self.invalidate(AddressSlot::Unset);
        self.key = None;
    }

    /// Replace the slot with a user-entered address. An in-flight lookup is
    /// dropped; the key is kept so the same condition does not restart it.
    pub fn set_manual(&mut self, address: AddressSlot) {
        self.invalidate(address);
    }

    fn invalidate(&mut self, next: AddressSlot) -> u64 {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        let generation = &self.generation;
        let mut bumped = 0;
        // Bumping inside the channel lock orders it against a task's write.
        self.tx.send_modify(|slot| {
            bumped = generation.fetch_add(1, Ordering::SeqCst) + 1;
            *slot = next;
        });
        bumped
    }
}

impl Drop for LookupSlot {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use tokio::sync::oneshot;

    fn ready(address: &str) -> BoxFuture<'static, Result<String>> {
        futures::future::ready(Ok(address.to_string())).boxed()
    }

    fn failing(reason: &str) -> BoxFuture<'static, Result<String>> {
        futures::future::ready(Err(AppError::Wallet(reason.to_string()))).boxed()
    }

    fn slot() -> LookupSlot {
        LookupSlot::new(AddressKind::Bitcoin, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn resolves_into_slot() {
        let mut slot = slot();
        let mut rx = slot.subscribe();
        assert!(slot.start(1, ready("bcrt1qalice")));

        let value = rx
            .wait_for(|s| matches!(s, AddressSlot::Resolved(_)))
            .await
            .unwrap()
            .clone();
        assert_eq!(value, AddressSlot::Resolved("bcrt1qalice".into()));
        assert_eq!(slot.key(), Some(1));
    }

    #[tokio::test]
    async fn same_key_does_not_restart() {
        let mut slot = slot();
        assert!(slot.start(7, futures::future::pending::<Result<String>>().boxed()));
        assert!(!slot.start(7, ready("ignored")));
        assert_eq!(slot.current(), AddressSlot::Pending);
    }

    #[tokio::test]
    async fn new_key_supersedes_stale_lookup() {
        let mut slot = slot();
        let mut rx = slot.subscribe();
        let (stale_tx, stale_rx) = oneshot::channel::<String>();

        slot.start(
            1,
            async move { stale_rx.await.map_err(|e| AppError::Other(e.to_string())) }.boxed(),
        );
        slot.start(2, ready("fresh"));

        rx.wait_for(|s| matches!(s, AddressSlot::Resolved(_)))
            .await
            .unwrap();
        // The first task was aborted, so its sender side is gone or ignored.
        let _ = stale_tx.send("stale".into());
        tokio::task::yield_now().await;
        assert_eq!(slot.current(), AddressSlot::Resolved("fresh".into()));
    }

    #[tokio::test]
    async fn cancel_clears_and_blocks_late_write() {
        let mut slot = slot();
        let (late_tx, late_rx) = oneshot::channel::<String>();
        slot.start(
            3,
            async move { late_rx.await.map_err(|e| AppError::Other(e.to_string())) }.boxed(),
        );
        assert_eq!(slot.current(), AddressSlot::Pending);

        slot.cancel();
        let _ = late_tx.send("late".into());
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(slot.current(), AddressSlot::Unset);
        assert_eq!(slot.key(), None);
    }

    #[tokio::test]
    async fn failures_and_timeouts_are_visible() {
        let mut slot = LookupSlot::new(AddressKind::Account, Duration::from_millis(30));
        let mut rx = slot.subscribe();
        slot.start(1, futures::future::pending::<Result<String>>().boxed());
        let value = rx
            .wait_for(|s| matches!(s, AddressSlot::Failed(_)))
            .await
            .unwrap()
            .clone();
        assert!(matches!(value, AddressSlot::Failed(msg) if msg.contains("Timed out")));

        slot.start(2, failing("locked"));
        let value = rx
            .wait_for(|s| matches!(s, AddressSlot::Failed(m) if m.contains("locked")))
            .await
            .unwrap()
            .clone();
        assert_eq!(value, AddressSlot::Failed("Wallet error: locked".into()));
    }

    #[tokio::test]
    async fn manual_address_wins_over_pending_lookup() {
        let mut slot = slot();
        slot.start(1, futures::future::pending::<Result<String>>().boxed());
        slot.set_manual(AddressSlot::Resolved("bcrt1qmanual".into()));
        assert_eq!(slot.current(), AddressSlot::Resolved("bcrt1qmanual".into()));
        assert!(!slot.start(1, ready("other")));
    }
}
