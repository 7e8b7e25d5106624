//! Batch swap sequencer.
//!
//! A [`ConditionalSwapBatch`] is the accumulator threaded through every conditional swap of a
//! trade. It is opened against one market, receives the split outputs through
//! [`deposit`](ConditionalSwapBatch::deposit), runs any number of swaps in any outcome order and
//! is consumed by exactly one settlement (see [`super::settlement`]).
//!
//! The batch keeps a client-side copy of its per-outcome ledger. Every check the on-chain batch
//! performs is run against that copy first, and a failed check leaves both the copy and the
//! transaction untouched, so the caller can correct the request and swap again.

use super::OutcomeMarkets;
use crate::{
    constants::MODULE_SWAP_BATCH,
    error::SwapError,
    transaction::{Argument, LinearKind, LinearToken, MoveCall, ProgrammableTransactionBuilder},
    types::{ConditionalBalance, Leg, MarketRef, OutcomeBalances, SwapDirection},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// One swap to run inside a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapRequest {
    /// The outcome whose market is traded.
    pub outcome: u8,
    /// Which leg is sold.
    pub direction: SwapDirection,
    /// Amount of the input leg sold.
    pub amount_in: u64,
    /// Slippage guard: the swap fails if it would return less.
    pub min_amount_out: u64,
}

/// The result of an accepted swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapOutput {
    /// The outcome traded.
    pub outcome: u8,
    /// Which leg was sold.
    pub direction: SwapDirection,
    /// Amount sold.
    pub amount_in: u64,
    /// Amount received, as quoted.
    pub amount_out: u64,
}

/// The swap accumulator for one market.
#[derive(Debug)]
#[must_use = "a swap batch must be finalized"]
pub struct ConditionalSwapBatch<'a> {
    pub(super) tx: &'a mut ProgrammableTransactionBuilder,
    pub(super) market: &'a MarketRef,
    pub(super) token: LinearToken,
    pub(super) batch: Argument,
    pub(super) ledger: OutcomeBalances,
    pub(super) swaps: Vec<SwapOutput>,
}

impl<'a> ConditionalSwapBatch<'a> {
    /// Opens an empty batch against `market`.
    pub fn begin(
        tx: &'a mut ProgrammableTransactionBuilder,
        market: &'a MarketRef,
    ) -> Result<Self, SwapError> {
        let escrow = market.escrow.input(tx, true)?;
        let batch = tx.move_call(
            MoveCall::new(market.package, MODULE_SWAP_BATCH, "begin_conditional_swaps")
                .with_type_arguments(market.type_arguments()?)
                .with_arguments(vec![escrow]),
        )?;
        let token = tx.open_linear(LinearKind::SwapBatch);
        debug!(market_id = %market.market_id(), "began swap batch");

        Ok(Self {
            tx,
            market,
            token,
            batch,
            ledger: OutcomeBalances::zeroed(market.outcome_count),
            swaps: Vec::new(),
        })
    }

    /// The market the batch trades.
    pub const fn market(&self) -> &'a MarketRef {
        self.market
    }

    /// The current per-outcome ledger.
    pub const fn balances(&self) -> &OutcomeBalances {
        &self.ledger
    }

    /// Swaps accepted so far, in order.
    pub fn swaps(&self) -> &[SwapOutput] {
        &self.swaps
    }

    /// Moves a conditional balance into the batch.
    pub fn deposit(&mut self, balance: ConditionalBalance) -> Result<(), SwapError> {
        let market_id = self.market.market_id();
        if balance.market_id != market_id {
            return Err(SwapError::MarketMismatch { expected: market_id, got: balance.market_id });
        }

        let mut ledger = self.ledger.clone();
        ledger.credit(balance.outcome, balance.leg, balance.amount)?;

        let outcome = self.tx.pure(&balance.outcome)?;
        let is_asset = self.tx.pure(&(balance.leg == Leg::Asset))?;
        self.tx.move_call(
            MoveCall::new(self.market.package, MODULE_SWAP_BATCH, "deposit_to_batch")
                .with_type_arguments(self.market.type_arguments()?)
                .with_arguments(vec![self.batch, outcome, is_asset, balance.argument]),
        )?;
        self.ledger = ledger;
        debug!(
            outcome = balance.outcome,
            leg = ?balance.leg,
            amount = balance.amount,
            "deposited into batch"
        );
        Ok(())
    }

    /// Runs one swap against the outcome's conditional market.
    ///
    /// The output amount is quoted by `markets`. Fails with [`SwapError::InsufficientOutput`] if
    /// the quote is below `request.min_amount_out`. On any error the batch is unchanged and can be
    /// used again.
    pub fn swap(
        &mut self,
        markets: &(impl OutcomeMarkets + ?Sized),
        request: SwapRequest,
    ) -> Result<SwapOutput, SwapError> {
        let SwapRequest { outcome, direction, amount_in, min_amount_out } = request;
        let outcome_count = self.market.outcome_count;
        if !self.market.has_outcome(outcome) {
            return Err(SwapError::OutcomeOutOfBounds { outcome, outcome_count });
        }
        if amount_in == 0 {
            return Err(SwapError::ZeroAmount { outcome });
        }

        let input_leg = direction.input_leg();
        let available = self.ledger.get(outcome, input_leg)?;
        if available < amount_in {
            return Err(SwapError::InsufficientBalance {
                outcome,
                leg: input_leg,
                available,
                requested: amount_in,
            });
        }

        let quoted = markets
            .quote_swap(self.market, outcome, direction, amount_in)
            .map_err(|err| SwapError::QuoteUnavailable { outcome, reason: err.0 })?;
        if quoted < min_amount_out {
            warn!(outcome, quoted, min_amount_out, "swap rejected by slippage guard");
            return Err(SwapError::InsufficientOutput {
                outcome,
                quoted,
                minimum: min_amount_out,
            });
        }

        let mut ledger = self.ledger.clone();
        ledger.debit(outcome, input_leg, amount_in)?;
        ledger.credit(outcome, direction.output_leg(), quoted)?;

        let escrow = self.market.escrow.input(self.tx, true)?;
        let args = vec![
            self.batch,
            escrow,
            self.tx.pure(&outcome)?,
            self.tx.pure(&amount_in)?,
            self.tx.pure(&direction.is_asset_to_stable())?,
            self.tx.pure(&min_amount_out)?,
            self.tx.clock()?,
        ];
        self.tx.move_call(
            MoveCall::new(self.market.package, MODULE_SWAP_BATCH, "swap_in_batch")
                .with_type_arguments(self.market.type_arguments()?)
                .with_arguments(args),
        )?;

        self.ledger = ledger;
        let output = SwapOutput { outcome, direction, amount_in, amount_out: quoted };
        self.swaps.push(output);
        debug!(outcome, ?direction, amount_in, amount_out = quoted, "swapped in batch");
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        orchestrator::QuoteTable,
        types::{ObjectId, SharedObject},
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

    fn balance(market: &MarketRef, outcome: u8, leg: Leg, amount: u64) -> ConditionalBalance {
        ConditionalBalance {
            market_id: market.market_id(),
            outcome,
            leg,
            amount,
            argument: Argument::Result(0),
        }
    }

    #[test]
    fn rejected_swap_leaves_batch_usable() {
        let mut tx = ProgrammableTransactionBuilder::new();
        let market = market(2);
        let quotes = QuoteTable::new().with_rate_bps(1, SwapDirection::StableToAsset, 9_000);
        let mut batch = ConditionalSwapBatch::begin(&mut tx, &market).unwrap();
        batch.deposit(balance(&market, 1, Leg::Stable, 1_000_000)).unwrap();
        let before = batch.balances().clone();

        let request = SwapRequest {
            outcome: 1,
            direction: SwapDirection::StableToAsset,
            amount_in: 1_000_000,
            min_amount_out: 950_000,
        };
        let err = batch.swap(&quotes, request).unwrap_err();
        assert!(matches!(
            err,
            SwapError::InsufficientOutput { outcome: 1, quoted: 900_000, minimum: 950_000 }
        ));
        assert_eq!(batch.balances(), &before);
        assert!(batch.swaps().is_empty());

        let output =
            batch.swap(&quotes, SwapRequest { min_amount_out: 890_000, ..request }).unwrap();
        assert_eq!(output.amount_out, 900_000);
        assert_eq!(batch.balances().get(1, Leg::Asset).unwrap(), 900_000);
        assert_eq!(batch.balances().get(1, Leg::Stable).unwrap(), 0);
    }

    #[test]
    fn swap_cannot_draw_more_than_deposited() {
        let mut tx = ProgrammableTransactionBuilder::new();
        let market = market(2);
        let quotes = QuoteTable::new().with_rate_bps(0, SwapDirection::AssetToStable, 10_000);
        let mut batch = ConditionalSwapBatch::begin(&mut tx, &market).unwrap();
        batch.deposit(balance(&market, 0, Leg::Asset, 10)).unwrap();

        let request = SwapRequest {
            outcome: 0,
            direction: SwapDirection::AssetToStable,
            amount_in: 11,
            min_amount_out: 0,
        };
        let err = batch.swap(&quotes, request).unwrap_err();
        assert!(matches!(err, SwapError::InsufficientBalance { available: 10, requested: 11, .. }));

        let err = batch.swap(&quotes, SwapRequest { amount_in: 0, ..request }).unwrap_err();
        assert!(matches!(err, SwapError::ZeroAmount { outcome: 0 }));

        let err = batch.swap(&quotes, SwapRequest { outcome: 2, ..request }).unwrap_err();
        assert!(matches!(err, SwapError::OutcomeOutOfBounds { outcome: 2, outcome_count: 2 }));
    }

    #[test]
    fn deposit_checks_market() {
        let mut tx = ProgrammableTransactionBuilder::new();
        let market = market(2);
        let mut batch = ConditionalSwapBatch::begin(&mut tx, &market).unwrap();
        let mut foreign = balance(&market, 0, Leg::Asset, 10);
        foreign.market_id = ObjectId::with_last_byte(0xee);
        assert!(matches!(batch.deposit(foreign), Err(SwapError::MarketMismatch { .. })));
    }

    #[test]
    fn swaps_run_in_any_order() {
        let mut tx = ProgrammableTransactionBuilder::new();
        let market = market(3);
        let quotes = QuoteTable::new()
            .with_rate_bps(2, SwapDirection::StableToAsset, 5_000)
            .with_rate_bps(0, SwapDirection::StableToAsset, 20_000);
        let mut batch = ConditionalSwapBatch::begin(&mut tx, &market).unwrap();
        for outcome in 0..3 {
            batch.deposit(balance(&market, outcome, Leg::Stable, 100)).unwrap();
        }
        for outcome in [2, 0] {
            let request = SwapRequest {
                outcome,
                direction: SwapDirection::StableToAsset,
                amount_in: 100,
                min_amount_out: 1,
            };
            batch.swap(&quotes, request).unwrap();
        }
        assert_eq!(batch.balances().as_slice(), &[200, 0, 0, 100, 50, 0]);
        assert_eq!(batch.swaps().len(), 2);
    }
}
