//! Form state and its transitions.
//!
//! A `FormState` is never mutated in place: every event produces a new
//! state. The amount pair is always replaced whole.

use crate::amount::apply_edit;
use crate::assets::AssetRegistry;
use crate::errors::Result;
use crate::models::{
    AddressKind, AddressSlot, Addresses, AmountPair, Direction, Side, SubmissionStatus,
    SubmitOutcome,
};
use crate::submission;
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormState {
    pub pair: AmountPair,
    pub direction: Direction,
    pub addresses: Addresses,
    pub submission: SubmissionStatus,
}

impl FormState {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            ..Self::default()
        }
    }

    pub fn on_edit(&self, side: Side, raw: &str) -> Self {
        Self {
            pair: apply_edit(side, raw),
            ..self.clone()
        }
    }

    /// Switch direction. The amounts are presented as they are.
    pub fn on_direction_toggle(&self, direction: Direction) -> Self {
        Self {
            direction,
            ..self.clone()
        }
    }

    /// User typed a receive address. Only the bitcoin address is editable,
    /// so this is ignored while sending BTC.
    pub fn on_receive_address_edit(&self, raw: &str) -> Self {
        if self.direction != Direction::WbtcToBtc {
            return self.clone();
        }
        self.on_address_resolved(AddressKind::Bitcoin, manual_address(raw))
    }

    pub fn on_address_resolved(&self, kind: AddressKind, slot: AddressSlot) -> Self {
        let mut addresses = self.addresses.clone();
        match kind {
            AddressKind::Account => addresses.account = slot,
            AddressKind::Bitcoin => addresses.bitcoin = slot,
        }
        Self {
            addresses,
            ..self.clone()
        }
    }

    pub fn with_submission(&self, submission: SubmissionStatus) -> Self {
        Self {
            submission,
            ..self.clone()
        }
    }

    /// Where the received asset goes: the bitcoin address when receiving BTC,
    /// the wallet account when receiving WBTC.
    pub fn receive_address(&self) -> Option<&str> {
        match self.direction {
            Direction::WbtcToBtc => self.addresses.bitcoin.resolved(),
            Direction::BtcToWbtc => self.addresses.account.resolved(),
        }
    }

    /// Pretty-printed JSON of the whole form.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Submit the current amounts.
    ///
    /// A skipped submission leaves the state untouched. Otherwise the pair is
    /// cleared straight away, before the swap call has run, and the status
    /// becomes pending.
    pub fn on_submit(&self, registry: &AssetRegistry) -> (Self, SubmitOutcome) {
        match submission::prepare(&self.pair, self.direction, self.receive_address(), registry) {
            Ok(request) => {
                let next = Self {
                    pair: AmountPair::default(),
                    submission: SubmissionStatus::Pending(request.clone()),
                    ..self.clone()
                };
                (next, SubmitOutcome::Submitted(request))
            }
            Err(reason) => (self.clone(), SubmitOutcome::Skipped(reason)),
        }
    }
}

/// A hand-typed address; blank input clears it.
pub fn manual_address(raw: &str) -> AddressSlot {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        AddressSlot::Unset
    } else {
        AddressSlot::Resolved(trimmed.to_string())
    }
}
