//! Shared data structures used throughout the application.

use crate::assets::AssetId;
use crate::errors::AppError;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Which of the two linked amount fields a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    /// Wrapped-asset denominated field.
    Wbtc,
    /// Native-asset denominated field.
    Btc,
}

/// Direction of the conversion: which asset is sent and which is received.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    #[default]
    WbtcToBtc,
    BtcToWbtc,
}

impl Direction {
    /// The editable field for this direction.
    pub fn send_side(self) -> Side {
        match self {
            Direction::WbtcToBtc => Side::Wbtc,
            Direction::BtcToWbtc => Side::Btc,
        }
    }

    /// The read-only field for this direction.
    pub fn receive_side(self) -> Side {
        match self {
            Direction::WbtcToBtc => Side::Btc,
            Direction::BtcToWbtc => Side::Wbtc,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::WbtcToBtc => write!(f, "WBTC_TO_BTC"),
            Direction::BtcToWbtc => write!(f, "BTC_TO_WBTC"),
        }
    }
}

impl FromStr for Direction {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "WBTC_TO_BTC" => Ok(Direction::WbtcToBtc),
            "BTC_TO_WBTC" => Ok(Direction::BtcToWbtc),
            other => Err(AppError::Config(format!("unknown direction {other:?}"))),
        }
    }
}

/// The two linked amount fields. One side holds the user's raw input, the
/// other is derived from it (or absent when nothing can be derived).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AmountPair {
    pub wbtc: Option<String>,
    pub btc: Option<String>,
}

impl AmountPair {
    pub fn get(&self, side: Side) -> Option<&str> {
        match side {
            Side::Wbtc => self.wbtc.as_deref(),
            Side::Btc => self.btc.as_deref(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.wbtc.is_none() && self.btc.is_none()
    }
}

/// Amounts handed to the swap execution service for a single attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionRequest {
    pub direction: Direction,
    pub send_asset: AssetId,
    pub receive_asset: AssetId,
    pub send_amount_base_units: u64,
    pub receive_amount_base_units: u64,
    pub receive_address: Option<String>,
}

/// Why a submission attempt did not produce a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    /// The send-side field is empty.
    MissingAmount,
    /// The send-side field does not hold a number.
    InvalidAmount(String),
    /// The send-side field is zero or negative.
    NonPositiveAmount(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingAmount => write!(f, "no amount entered"),
            SkipReason::InvalidAmount(raw) => write!(f, "{raw:?} is not a number"),
            SkipReason::NonPositiveAmount(raw) => write!(f, "{raw:?} is not a positive amount"),
        }
    }
}

/// Result of a submit attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SubmitOutcome {
    Skipped(SkipReason),
    Submitted(SubmissionRequest),
    Failed {
        request: SubmissionRequest,
        error: String,
    },
}

/// Acknowledgement returned by the swap execution service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SwapReceipt {
    pub order_id: String,
}

/// Progress of the most recent submission, as seen by the form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub enum SubmissionStatus {
    #[default]
    Idle,
    Pending(SubmissionRequest),
    Completed {
        request: SubmissionRequest,
        receipt: SwapReceipt,
    },
    Failed {
        request: SubmissionRequest,
        error: String,
    },
}

/// Which collaborator an address comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AddressKind {
    /// Smart-contract network account of the connected wallet.
    Account,
    /// Native bitcoin address.
    Bitcoin,
}

/// State of one address lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub enum AddressSlot {
    #[default]
    Unset,
    Pending,
    Resolved(String),
    Failed(String),
}

impl AddressSlot {
    pub fn resolved(&self) -> Option<&str> {
        match self {
            AddressSlot::Resolved(addr) => Some(addr),
            _ => None,
        }
    }
}

/// Addresses known to the form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Addresses {
    pub account: AddressSlot,
    pub bitcoin: AddressSlot,
}
