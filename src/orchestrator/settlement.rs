//! Settlement finalizer.
//!
//! Consumes a [`ConditionalSwapBatch`]. Every outcome that holds both legs is recombined into
//! spot tokens and paid to the recipient. Outcomes holding a single leg cannot be recombined and
//! are packed into a [`BalanceWrapper`], or merged into one the recipient already owns.

use super::{ConditionalSwapBatch, SwapOutput};
use crate::{
    constants::MODULE_SWAP_BATCH,
    error::SettlementError,
    transaction::{Argument, MoveCall, ProgrammableTransactionBuilder},
    types::{Address, BalanceWrapper, MarketRef, ObjectId, OutcomeBalances, WrapperObject},
};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Spot tokens paid out by a settlement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpotPayout {
    /// Spot asset.
    pub asset: u64,
    /// Spot stable.
    pub stable: u64,
}

impl SpotPayout {
    /// True if nothing is paid out.
    pub const fn is_empty(&self) -> bool {
        self.asset == 0 && self.stable == 0
    }
}

/// One outcome whose legs were recombined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecombinedSet {
    /// The outcome.
    pub outcome: u8,
    /// Conditional asset recombined.
    pub asset: u64,
    /// Conditional stable recombined.
    pub stable: u64,
}

/// What happened to the single-leg leftovers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Remainder {
    /// Nothing was left over.
    Empty,
    /// A new wrapper was minted to the recipient.
    Created(BalanceWrapper),
    /// The leftovers were merged into an existing wrapper. Holds its new state.
    Merged(BalanceWrapper),
}

impl Remainder {
    /// The resulting wrapper, if any.
    pub const fn wrapper(&self) -> Option<&BalanceWrapper> {
        match self {
            Self::Empty => None,
            Self::Created(wrapper) | Self::Merged(wrapper) => Some(wrapper),
        }
    }
}

/// The predicted result of a settlement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    /// The market.
    pub market_id: ObjectId,
    /// Who receives the payout and the wrapper.
    pub recipient: Address,
    /// Spot tokens paid out.
    pub payout: SpotPayout,
    /// Outcomes that were recombined, in index order.
    pub recombined: Vec<RecombinedSet>,
    /// Single-leg leftovers.
    pub remainder: Remainder,
    /// Swaps the batch ran.
    pub swaps: Vec<SwapOutput>,
}

/// Splits the ledger into recombinable sets and single-leg leftovers.
fn recombine(
    ledger: OutcomeBalances,
) -> Result<(SpotPayout, Vec<RecombinedSet>, OutcomeBalances), SettlementError> {
    let mut leftovers = ledger;
    let mut payout = SpotPayout::default();
    let mut recombined = Vec::new();
    let complete: Vec<u8> = leftovers
        .iter_outcomes()
        .filter(|(_, asset, stable)| *asset > 0 && *stable > 0)
        .map(|(outcome, ..)| outcome)
        .collect();
    for outcome in complete {
        let (asset, stable) = leftovers.take_outcome(outcome)?;
        payout.asset = payout.asset.checked_add(asset).ok_or(SettlementError::PayoutOverflow)?;
        payout.stable = payout.stable.checked_add(stable).ok_or(SettlementError::PayoutOverflow)?;
        recombined.push(RecombinedSet { outcome, asset, stable });
    }
    Ok((payout, recombined, leftovers))
}

impl ConditionalSwapBatch<'_> {
    fn check_market(&self, market: &MarketRef) -> Result<(), SettlementError> {
        if self.market.market_id() != market.market_id() {
            return Err(SettlementError::MarketMismatch {
                batch: self.market.market_id(),
                market: market.market_id(),
            });
        }
        Ok(())
    }

    /// Settles the batch, paying recombined sets to `recipient` and minting a wrapper for the
    /// leftovers, if there are any.
    pub fn finalize(
        self,
        market: &MarketRef,
        recipient: Address,
    ) -> Result<Settlement, SettlementError> {
        self.check_market(market)?;
        let Self { tx, market: batch_market, token, batch, ledger, swaps } = self;
        let (payout, recombined, leftovers) = recombine(ledger)?;

        let args = settle_args(tx, batch_market, batch, recipient)?;
        tx.move_call(
            MoveCall::new(batch_market.package, MODULE_SWAP_BATCH, "finalize_conditional_swaps")
                .with_type_arguments(batch_market.type_arguments()?)
                .with_arguments(args),
        )?;
        tx.close_linear(token);

        let remainder = if leftovers.is_empty() {
            Remainder::Empty
        } else {
            Remainder::Created(BalanceWrapper::from_balances(batch_market.market_id(), leftovers))
        };
        info!(
            market_id = %batch_market.market_id(),
            %recipient,
            payout_asset = payout.asset,
            payout_stable = payout.stable,
            wrapper = remainder.wrapper().is_some(),
            "finalized swap batch"
        );

        Ok(Settlement {
            market_id: batch_market.market_id(),
            recipient,
            payout,
            recombined,
            remainder,
            swaps,
        })
    }

    /// Settles the batch like [`finalize`](Self::finalize), but merges the leftovers into
    /// `existing` instead of minting a new wrapper.
    ///
    /// `existing` is updated to the state it will have once the transaction executes.
    pub fn finalize_into(
        self,
        market: &MarketRef,
        recipient: Address,
        existing: &mut WrapperObject,
    ) -> Result<Settlement, SettlementError> {
        self.check_market(market)?;
        let Self { tx, market: batch_market, token, batch, ledger, swaps } = self;
        let (payout, recombined, leftovers) = recombine(ledger)?;

        let mut merged = existing.wrapper.clone();
        merged.merge_balances(batch_market.market_id(), &leftovers)?;

        let wrapper = tx.object(existing.object)?;
        let mut args = settle_args(tx, batch_market, batch, recipient)?;
        args.insert(3, wrapper);
        tx.move_call(
            MoveCall::new(
                batch_market.package,
                MODULE_SWAP_BATCH,
                "finalize_conditional_swaps_into",
            )
            .with_type_arguments(batch_market.type_arguments()?)
            .with_arguments(args),
        )?;
        tx.close_linear(token);

        existing.wrapper = merged.clone();
        info!(
            market_id = %batch_market.market_id(),
            %recipient,
            wrapper_id = %existing.object.id,
            payout_asset = payout.asset,
            payout_stable = payout.stable,
            "finalized swap batch into existing wrapper"
        );

        Ok(Settlement {
            market_id: batch_market.market_id(),
            recipient,
            payout,
            recombined,
            remainder: Remainder::Merged(merged),
            swaps,
        })
    }
}

/// `[batch, proposal, escrow, recipient, clock]`
fn settle_args(
    tx: &mut ProgrammableTransactionBuilder,
    market: &MarketRef,
    batch: Argument,
    recipient: Address,
) -> Result<Vec<Argument>, SettlementError> {
    Ok(vec![
        batch,
        market.proposal.input(tx, false)?,
        market.escrow.input(tx, true)?,
        tx.pure(&recipient)?,
        tx.clock()?,
    ])
}
