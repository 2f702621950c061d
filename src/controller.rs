//! Drives a single swap form: owns its state, the two address lookups and
//! the submission status, and talks to the injected collaborators.

use crate::assets::AssetRegistry;
use crate::config::AppConfig;
use crate::errors::Result;
use crate::lookup::LookupSlot;
use crate::models::{AddressKind, Direction, Side, SubmissionStatus, SubmitOutcome};
use crate::session::{FormState, manual_address};
use crate::submission;
use crate::wallet::{BitcoinAddressProvider, SwapExecutor, WalletConnection};
use futures::FutureExt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub struct SwapController {
    state: FormState,
    registry: AssetRegistry,
    wallet: Arc<dyn WalletConnection>,
    bitcoin: Arc<dyn BitcoinAddressProvider>,
    executor: Arc<dyn SwapExecutor>,
    account_lookup: LookupSlot,
    bitcoin_lookup: LookupSlot,
    status_tx: watch::Sender<SubmissionStatus>,
    latest_submission: Arc<AtomicU64>,
    in_flight: Option<JoinHandle<SubmissionStatus>>,
}

impl SwapController {
    pub fn new(
        config: &AppConfig,
        wallet: Arc<dyn WalletConnection>,
        bitcoin: Arc<dyn BitcoinAddressProvider>,
        executor: Arc<dyn SwapExecutor>,
    ) -> Self {
        let (status_tx, _rx) = watch::channel(SubmissionStatus::Idle);
        Self {
            state: FormState::new(config.direction),
            registry: config.registry.clone(),
            wallet,
            bitcoin,
            executor,
            account_lookup: LookupSlot::new(AddressKind::Account, config.lookup_timeout),
            bitcoin_lookup: LookupSlot::new(AddressKind::Bitcoin, config.lookup_timeout),
            status_tx,
            latest_submission: Arc::new(AtomicU64::new(0)),
            in_flight: None,
        }
    }

    /// Current form state with the latest lookup results and submission status.
    pub fn snapshot(&mut self) -> FormState {
        self.sync();
        self.state.clone()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<SubmissionStatus> {
        self.status_tx.subscribe()
    }

    /// Whether the submit control should be enabled.
    pub fn can_submit(&self) -> bool {
        self.wallet.is_connected()
    }

    /// Edit an amount field. Returns `false` for the read-only field of the
    /// current direction, which is left as is.
    pub fn edit(&mut self, side: Side, raw: &str) -> bool {
        if side != self.state.direction.send_side() {
            debug!(?side, direction = %self.state.direction, "[EDIT] field is read-only");
            return false;
        }
        self.state = self.state.on_edit(side, raw);
        debug!(?side, raw, pair = ?self.state.pair, "[EDIT] amounts updated");
        true
    }

    pub fn toggle_direction(&mut self, direction: Direction) {
        self.state = self.state.on_direction_toggle(direction);
        info!(%direction, "[EDIT] direction changed");
    }

    /// Edit the bitcoin receive address; ignored while sending BTC.
    pub fn edit_receive_address(&mut self, raw: &str) -> bool {
        if self.state.direction != Direction::WbtcToBtc {
            debug!("[EDIT] receive address is read-only");
            return false;
        }
        self.bitcoin_lookup.set_manual(manual_address(raw));
        self.state = self.state.on_receive_address_edit(raw);
        true
    }

    /// Connect the wallet, then start whichever lookups became possible.
    pub async fn connect(&mut self) -> Result<()> {
        self.wallet.connect().await?;
        self.refresh_lookups();
        Ok(())
    }

    /// Start, keep or cancel each address lookup according to the current
    /// connection and signed state.
    pub fn refresh_lookups(&mut self) {
        match self.wallet.connection_id() {
            Some(id) => {
                let wallet = Arc::clone(&self.wallet);
                self.account_lookup
                    .start(id, async move { wallet.account_address().await }.boxed());
            }
            None => self.account_lookup.cancel(),
        }

        match self.bitcoin.signed_id() {
            Some(id) => {
                let bitcoin = Arc::clone(&self.bitcoin);
                self.bitcoin_lookup
                    .start(id, async move { bitcoin.get_address().await }.boxed());
            }
            None => self.bitcoin_lookup.cancel(),
        }
        self.sync();
    }

    /// Submit the current amounts.
    ///
    /// The swap call runs in the background; its result lands in the status
    /// channel. The amount pair is cleared before that call starts. Nothing
    /// changes when the submission is skipped.
    pub fn submit(&mut self) -> SubmitOutcome {
        self.sync();
        let (next, outcome) = self.state.on_submit(&self.registry);
        self.state = next;

        let request = match outcome {
            SubmitOutcome::Submitted(request) => request,
            skipped => {
                warn!(outcome = ?skipped, direction = %self.state.direction, "[SWAP] submission skipped");
                return skipped;
            }
        };

        if request.receive_address.is_none() {
            warn!(direction = %request.direction, "[SWAP] no receive address resolved");
        }
        info!(
            direction = %request.direction,
            send = request.send_amount_base_units,
            receive = request.receive_amount_base_units,
            "[SWAP] submitting"
        );

        let seq = self.latest_submission.fetch_add(1, Ordering::SeqCst) + 1;
        self.status_tx
            .send_replace(SubmissionStatus::Pending(request.clone()));

        let executor = Arc::clone(&self.executor);
        let status_tx = self.status_tx.clone();
        let latest = Arc::clone(&self.latest_submission);
        let dispatched = request.clone();
        self.in_flight = Some(tokio::spawn(async move {
            let status = submission::execute(executor.as_ref(), dispatched).await;
            status_tx.send_if_modified(|current| {
                if latest.load(Ordering::SeqCst) != seq {
                    return false;
                }
                *current = status.clone();
                true
            });
            status
        }));
        SubmitOutcome::Submitted(request)
    }

    /// Submit and wait for the execution service to answer. The form is reset
    /// before the wait, exactly as with [`SwapController::submit`].
    pub async fn submit_and_wait(&mut self) -> SubmitOutcome {
        let request = match self.submit() {
            SubmitOutcome::Submitted(request) => request,
            other => return other,
        };
        let Some(task) = self.in_flight.take() else {
            return SubmitOutcome::Submitted(request);
        };

        let finished = match task.await {
            Ok(SubmissionStatus::Failed { request, error }) => SubmitOutcome::Failed { request, error },
            Ok(_) => SubmitOutcome::Submitted(request),
            Err(e) => SubmitOutcome::Failed {
                request,
                error: e.to_string(),
            },
        };
        self.sync();
        finished
    }

    fn sync(&mut self) {
        self.state = self
            .state
            .on_address_resolved(AddressKind::Account, self.account_lookup.current())
            .on_address_resolved(AddressKind::Bitcoin, self.bitcoin_lookup.current())
            .with_submission(self.status_tx.borrow().clone());
    }
}
