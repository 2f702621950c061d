//! Swap submission: base-unit conversion, fee application and dispatch.

use crate::amount::{FEE_RATE_BPS, ParsedAmount, parse_amount, parse_positive};
use crate::assets::AssetRegistry;
use crate::models::{AmountPair, Direction, SkipReason, SubmissionRequest, SubmissionStatus};
use crate::wallet::SwapExecutor;
use bigdecimal::{BigDecimal, RoundingMode};
use num_traits::ToPrimitive;
use tracing::{debug, info, warn};

/// Base units per whole coin (satoshis per BTC).
pub const BASE_UNITS_PER_COIN: u64 = 100_000_000;

/// Largest gap tolerated between the displayed receive amount and the
/// re-derived one before it is reported.
const DIVERGENCE_TOLERANCE_BASE_UNITS: u64 = 1;

/// Convert a whole-coin amount to base units, dropping anything below one
/// base unit. `None` if the result does not fit a `u64`.
pub fn to_base_units(amount: &BigDecimal) -> Option<u64> {
    (amount * BigDecimal::from(BASE_UNITS_PER_COIN))
        .with_scale_round(0, RoundingMode::Down)
        .to_u64()
}

/// Receive amount for `send_base_units` after the fee, rounded down.
pub fn receive_base_units(send_base_units: u64) -> u64 {
    let retained_bps = 10_000 - FEE_RATE_BPS as u128;
    (send_base_units as u128 * retained_bps / 10_000) as u64
}

/// Build the request sent to the execution service from the form values.
///
/// The send side is chosen by `direction`. The receive amount is derived
/// again from the send amount rather than read from the paired field.
pub fn prepare(
    pair: &AmountPair,
    direction: Direction,
    receive_address: Option<&str>,
    registry: &AssetRegistry,
) -> Result<SubmissionRequest, SkipReason> {
    let raw = match pair.get(direction.send_side()) {
        Some(raw) if !raw.trim().is_empty() => raw,
        _ => return Err(SkipReason::MissingAmount),
    };
    let amount = match parse_amount(raw) {
        ParsedAmount::Positive(amount) => amount,
        ParsedAmount::NotPositive => return Err(SkipReason::NonPositiveAmount(raw.to_string())),
        ParsedAmount::NotANumber => return Err(SkipReason::InvalidAmount(raw.to_string())),
    };

    let send_amount_base_units =
        to_base_units(&amount).ok_or_else(|| SkipReason::InvalidAmount(raw.to_string()))?;
    if send_amount_base_units == 0 {
        return Err(SkipReason::NonPositiveAmount(raw.to_string()));
    }
    let receive_amount_base_units = receive_base_units(send_amount_base_units);

    match direction {
        Direction::WbtcToBtc => {
            if let Some(gap) = displayed_divergence(pair, direction, receive_amount_base_units) {
                warn!(
                    %direction,
                    gap,
                    receive_amount_base_units,
                    "[SWAP] displayed receive amount differs from submitted amount"
                );
            }
        }
        // The WBTC field is grossed up by `1 / (1 - f)`, not reduced by the fee.
        Direction::BtcToWbtc => debug!(
            %direction,
            receive_amount_base_units,
            "[SWAP] receive amount re-derived from the BTC side"
        ),
    }

    let (send_asset, receive_asset) = registry.pair_for(direction);
    Ok(SubmissionRequest {
        direction,
        send_asset: send_asset.clone(),
        receive_asset: receive_asset.clone(),
        send_amount_base_units,
        receive_amount_base_units,
        receive_address: receive_address.map(str::to_string),
    })
}

/// Base units between the displayed receive field and `receive_amount_base_units`
/// when they differ by more than one base unit.
///
/// Only `WbtcToBtc` shows the fee-adjusted amount in the receive field, so the
/// other direction always yields `None`.
pub fn displayed_divergence(
    pair: &AmountPair,
    direction: Direction,
    receive_amount_base_units: u64,
) -> Option<u64> {
    if direction != Direction::WbtcToBtc {
        return None;
    }
    let shown = pair
        .get(direction.receive_side())
        .and_then(parse_positive)
        .and_then(|v| to_base_units(&v))?;
    let gap = shown.abs_diff(receive_amount_base_units);
    (gap > DIVERGENCE_TOLERANCE_BASE_UNITS).then_some(gap)
}

/// Hand a prepared request to the execution service and report how it ended.
pub async fn execute(executor: &dyn SwapExecutor, request: SubmissionRequest) -> SubmissionStatus {
    let result = executor
        .swap(
            &request.send_asset,
            &request.receive_asset,
            request.send_amount_base_units,
            request.receive_amount_base_units,
        )
        .await;

    match result {
        Ok(receipt) => {
            info!(
                order_id = %receipt.order_id,
                send = request.send_amount_base_units,
                receive = request.receive_amount_base_units,
                "[SWAP] accepted"
            );
            SubmissionStatus::Completed { request, receipt }
        }
        Err(e) => {
            warn!(error = %e, "[SWAP] execution failed");
            SubmissionStatus::Failed {
                request,
                error: e.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amount::apply_edit;
    use crate::assets::{AssetId, Network};
    use crate::errors::{AppError, Result};
    use crate::models::{Side, SwapReceipt};
    use async_trait::async_trait;
    use std::str::FromStr;

    fn registry() -> AssetRegistry {
        AssetRegistry::for_network(Network::Localnet)
    }

    #[test]
    fn two_wbtc_converts_to_base_units_with_fee() {
        let pair = apply_edit(Side::Wbtc, "2");
        let req = prepare(&pair, Direction::WbtcToBtc, Some("bcrt1qexample"), &registry()).unwrap();
        assert_eq!(req.send_amount_base_units, 200_000_000);
        assert_eq!(req.receive_amount_base_units, 199_400_000);
        assert_eq!(req.send_asset, registry().wbtc);
        assert_eq!(req.receive_asset, registry().btc);
        assert_eq!(req.receive_address.as_deref(), Some("bcrt1qexample"));
    }

    #[test]
    fn reverse_direction_sends_btc_side() {
        let pair = apply_edit(Side::Btc, "0.5");
        let req = prepare(&pair, Direction::BtcToWbtc, None, &registry()).unwrap();
        assert_eq!(req.send_asset, registry().btc);
        assert_eq!(req.receive_asset, registry().wbtc);
        assert_eq!(req.send_amount_base_units, 50_000_000);
        assert_eq!(req.receive_amount_base_units, 49_850_000);
    }

    #[test]
    fn displayed_and_submitted_receive_amounts_agree() {
        for raw in ["1", "0.12345678", "2", "0.00010000"] {
            let pair = apply_edit(Side::Wbtc, raw);
            let req = prepare(&pair, Direction::WbtcToBtc, None, &registry()).unwrap();
            let shown = to_base_units(&parse_positive(pair.btc.as_deref().unwrap()).unwrap()).unwrap();
            assert!(shown.abs_diff(req.receive_amount_base_units) <= 1, "{raw}");
        }
    }

    #[test]
    fn skip_reasons() {
        let empty = AmountPair::default();
        assert_eq!(
            prepare(&empty, Direction::WbtcToBtc, None, &registry()),
            Err(SkipReason::MissingAmount)
        );

        let blank = apply_edit(Side::Wbtc, "");
        assert_eq!(
            prepare(&blank, Direction::WbtcToBtc, None, &registry()),
            Err(SkipReason::MissingAmount)
        );

        let text = apply_edit(Side::Wbtc, "abc");
        assert_eq!(
            prepare(&text, Direction::WbtcToBtc, None, &registry()),
            Err(SkipReason::InvalidAmount("abc".into()))
        );

        let negative = apply_edit(Side::Wbtc, "-1");
        assert_eq!(
            prepare(&negative, Direction::WbtcToBtc, None, &registry()),
            Err(SkipReason::NonPositiveAmount("-1".into()))
        );

        let dust = apply_edit(Side::Wbtc, "0.000000001");
        assert_eq!(
            prepare(&dust, Direction::WbtcToBtc, None, &registry()),
            Err(SkipReason::NonPositiveAmount("0.000000001".into()))
        );
    }

    #[test]
    fn divergence_only_checked_when_sending_wbtc() {
        let pair = apply_edit(Side::Wbtc, "1");
        let req = prepare(&pair, Direction::WbtcToBtc, None, &registry()).unwrap();
        assert_eq!(displayed_divergence(&pair, Direction::WbtcToBtc, req.receive_amount_base_units), None);
        assert_eq!(displayed_divergence(&pair, Direction::WbtcToBtc, 90_000_000), Some(9_700_000));

        // 0.997 BTC shows 1 WBTC; the submitted receive is 0.997 * 0.997 WBTC.
        let pair = apply_edit(Side::Btc, "0.997");
        let req = prepare(&pair, Direction::BtcToWbtc, None, &registry()).unwrap();
        assert_eq!(req.receive_amount_base_units, 99_400_900);
        assert_eq!(displayed_divergence(&pair, Direction::BtcToWbtc, req.receive_amount_base_units), None);
    }

    #[test]
    fn extreme_exponents_are_skipped() {
        for raw in ["1e9223372036854775807", "1e20000000", "1e2000000", "1e308", "inf", "NaN"] {
            for (side, direction) in [(Side::Wbtc, Direction::WbtcToBtc), (Side::Btc, Direction::BtcToWbtc)] {
                let pair = apply_edit(side, raw);
                assert_eq!(
                    prepare(&pair, direction, None, &registry()),
                    Err(SkipReason::InvalidAmount(raw.into())),
                    "{raw}"
                );
            }
        }
        for raw in ["1e-9223372036854775807", "1e-400"] {
            let pair = apply_edit(Side::Wbtc, raw);
            assert_eq!(
                prepare(&pair, Direction::WbtcToBtc, None, &registry()),
                Err(SkipReason::NonPositiveAmount(raw.into()))
            );
        }
    }

    #[test]
    fn send_side_follows_direction_not_last_edit() {
        // WBTC field filled, but the direction sends BTC: only the derived value is there.
        let pair = apply_edit(Side::Wbtc, "1");
        let req = prepare(&pair, Direction::BtcToWbtc, None, &registry()).unwrap();
        assert_eq!(req.send_amount_base_units, 99_700_000);
    }

    #[test]
    fn base_units_truncate_sub_satoshi() {
        let v = BigDecimal::from_str("0.123456789").unwrap();
        assert_eq!(to_base_units(&v), Some(12_345_678));
        assert_eq!(receive_base_units(1), 0);
        assert_eq!(receive_base_units(1_000), 997);
    }

    struct Accepting;

    #[async_trait]
    impl SwapExecutor for Accepting {
        async fn swap(&self, _: &AssetId, _: &AssetId, send: u64, _: u64) -> Result<SwapReceipt> {
            Ok(SwapReceipt {
                order_id: format!("order-{send}"),
            })
        }
    }

    struct Rejecting;

    #[async_trait]
    impl SwapExecutor for Rejecting {
        async fn swap(&self, _: &AssetId, _: &AssetId, _: u64, _: u64) -> Result<SwapReceipt> {
            Err(AppError::Swap("insufficient liquidity".into()))
        }
    }

    #[tokio::test]
    async fn execute_reports_completion_and_failure() {
        let pair = apply_edit(Side::Wbtc, "2");
        let req = prepare(&pair, Direction::WbtcToBtc, None, &registry()).unwrap();

        match execute(&Accepting, req.clone()).await {
            SubmissionStatus::Completed { receipt, .. } => {
                assert_eq!(receipt.order_id, "order-200000000")
            }
            other => panic!("unexpected status {other:?}"),
        }

        match execute(&Rejecting, req).await {
            SubmissionStatus::Failed { error, .. } => assert!(error.contains("insufficient liquidity")),
            other => panic!("unexpected status {other:?}"),
        }
    }
}
