//! End-to-end conditional trade.
//!
//! Assembles `split -> deposit -> swaps -> settle` into one transaction, so the whole trade
//! commits or aborts as a unit.

use super::{
    ConditionalSwapBatch, OutcomeMarkets, Settlement, SplitAllocation, SplitProgress, SwapRequest,
};
use crate::{
    error::{FutarchyError, SplitError},
    metrics::OrchestratorMetrics,
    transaction::{ObjectHandle, ProgrammableTransaction, ProgrammableTransactionBuilder},
    types::{Address, Leg, MarketRef, WrapperObject},
};
use tracing::{info, instrument};

/// The spot coin a trade is funded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Funding {
    /// Which spot leg the coin holds.
    pub leg: Leg,
    /// The coin. `amount` is split off it.
    pub coin: ObjectHandle,
    /// Amount to trade.
    pub amount: u64,
}

/// The outcome of a planned trade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradePlan {
    /// The transaction to sign and submit.
    pub transaction: ProgrammableTransaction,
    /// How the deposit was split.
    pub allocation: SplitAllocation,
    /// What the trade is expected to settle to.
    pub settlement: Settlement,
}

/// Builder for a conditional trade against one market.
#[derive(Debug)]
pub struct ConditionalTrade<'a, M: ?Sized> {
    market: &'a MarketRef,
    markets: &'a M,
    funding: Funding,
    swaps: Vec<SwapRequest>,
    recipient: Address,
    merge_into: Option<&'a mut WrapperObject>,
    metrics: OrchestratorMetrics,
}

impl<'a, M: OutcomeMarkets + ?Sized> ConditionalTrade<'a, M> {
    /// Creates a trade funded by `funding`, paying out to `recipient`.
    pub fn new(
        market: &'a MarketRef,
        markets: &'a M,
        funding: Funding,
        recipient: Address,
    ) -> Self {
        Self {
            market,
            markets,
            funding,
            swaps: Vec::new(),
            recipient,
            merge_into: None,
            metrics: OrchestratorMetrics::default(),
        }
    }

    /// Adds a swap. Swaps run in the order they are added.
    pub fn with_swap(mut self, swap: SwapRequest) -> Self {
        self.swaps.push(swap);
        self
    }

    /// Adds several swaps.
    pub fn with_swaps(mut self, swaps: impl IntoIterator<Item = SwapRequest>) -> Self {
        self.swaps.extend(swaps);
        self
    }

    /// Merges leftovers into `wrapper` instead of minting a new one.
    pub fn merge_into(mut self, wrapper: &'a mut WrapperObject) -> Self {
        self.merge_into = Some(wrapper);
        self
    }

    /// Records into `metrics` instead of the default handles.
    pub fn with_metrics(mut self, metrics: OrchestratorMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    /// Appends the trade to `tx`.
    #[instrument(skip_all, fields(market_id = %self.market.market_id(), swaps = self.swaps.len()))]
    pub fn append_to(
        self,
        tx: &mut ProgrammableTransactionBuilder,
    ) -> Result<(SplitAllocation, Settlement), FutarchyError> {
        let Self { market, markets, funding, swaps, recipient, merge_into, metrics } = self;

        let source = funding.coin.input(tx)?;
        let coin = tx.split_coin(source, funding.amount)?;

        let mut split = SplitProgress::begin(tx, market, funding.leg, coin, funding.amount)?;
        let mut balances = Vec::with_capacity(market.outcome_count as usize);
        for outcome in market.outcomes() {
            let share = markets
                .split_share(market, funding.leg, funding.amount, outcome)
                .map_err(|err| SplitError::QuoteUnavailable { outcome, reason: err.0 })?;
            let (next, balance) = split.step(outcome, share)?;
            split = next;
            balances.push(balance);
        }
        let allocation = split.finish()?;
        metrics.splits.increment(1);

        let mut batch = ConditionalSwapBatch::begin(tx, market)?;
        for balance in balances {
            batch.deposit(balance)?;
        }
        for request in swaps {
            if let Err(err) = batch.swap(markets, request) {
                metrics.rejected_swaps.increment(1);
                return Err(err.into());
            }
            metrics.swaps.increment(1);
        }

        let settlement = match merge_into {
            Some(existing) => batch.finalize_into(market, recipient, existing)?,
            None => batch.finalize(market, recipient)?,
        };
        metrics.record_settlement(&settlement.remainder);
        info!(
            payout_asset = settlement.payout.asset,
            payout_stable = settlement.payout.stable,
            "assembled conditional trade"
        );

        Ok((allocation, settlement))
    }

    /// Builds the trade as a standalone transaction.
    pub fn plan(self) -> Result<TradePlan, FutarchyError> {
        let mut tx = ProgrammableTransactionBuilder::new();
        let (allocation, settlement) = self.append_to(&mut tx)?;
        Ok(TradePlan { transaction: tx.finish()?, allocation, settlement })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::{FailureKind, SwapError},
        orchestrator::{QuoteTable, Remainder},
        transaction::Argument,
        types::{ObjectId, SharedObject, SwapDirection},
    };

    fn market(outcome_count: u16) -> MarketRef {
        MarketRef {
            package: ObjectId::with_last_byte(0xab),
            proposal: SharedObject { id: ObjectId::with_last_byte(1), initial_shared_version: 1 },
            escrow: SharedObject { id: ObjectId::with_last_byte(2), initial_shared_version: 1 },
            outcome_count,
            asset_type: "0x2::sui::SUI".into(),
            stable_type: "0xab::usdc::USDC".into(),
        }
    }

    fn funding(amount: u64) -> Funding {
        Funding { leg: Leg::Stable, coin: ObjectHandle::Pending(Argument::GasCoin), amount }
    }

    #[test]
    fn full_trade_in_one_transaction() {
        let market = market(2);
        let quotes = QuoteTable::new().with_rate_bps(1, SwapDirection::StableToAsset, 9_000);
        let recipient = Address::with_last_byte(9);
        let plan = ConditionalTrade::new(&market, &quotes, funding(1_000_000), recipient)
            .with_swap(SwapRequest {
                outcome: 1,
                direction: SwapDirection::StableToAsset,
                amount_in: 500_000,
                min_amount_out: 400_000,
            })
            .plan()
            .unwrap();

        assert_eq!(plan.allocation.total(), 1_000_000);
        assert_eq!(plan.allocation.allocations, vec![500_000, 500_000]);
        // outcome 0 keeps 500k stable, outcome 1 holds 450k asset: nothing recombines.
        assert_eq!(plan.settlement.payout.asset, 0);
        let Remainder::Created(wrapper) = &plan.settlement.remainder else {
            panic!("expected a new wrapper");
        };
        assert_eq!(wrapper.balances().as_slice(), &[0, 500_000, 450_000, 0]);

        let functions: Vec<_> =
            plan.transaction.move_calls().map(|call| call.function.as_str()).collect();
        assert_eq!(
            functions,
            [
                "begin_split_stable",
                "split_step",
                "split_step",
                "finish_split",
                "begin_conditional_swaps",
                "deposit_to_batch",
                "deposit_to_batch",
                "swap_in_batch",
                "finalize_conditional_swaps",
            ]
        );
    }

    #[test]
    fn slippage_failure_aborts_the_plan() {
        let market = market(2);
        let quotes = QuoteTable::new().with_rate_bps(1, SwapDirection::StableToAsset, 9_000);
        let err = ConditionalTrade::new(&market, &quotes, funding(1_000_000), Address::ZERO)
            .with_swap(SwapRequest {
                outcome: 1,
                direction: SwapDirection::StableToAsset,
                amount_in: 500_000,
                min_amount_out: 460_000,
            })
            .plan()
            .unwrap_err();
        assert!(matches!(err, FutarchyError::Swap(SwapError::InsufficientOutput { .. })));
        assert_eq!(err.kind(), FailureKind::InsufficientOutput);
        assert!(!err.is_retryable());
    }

    #[test]
    fn zero_funding_is_rejected() {
        let market = market(2);
        let quotes = QuoteTable::new();
        let err = ConditionalTrade::new(&market, &quotes, funding(0), Address::ZERO)
            .plan()
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::ZeroAmount);
    }
}
