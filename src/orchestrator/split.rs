//! Outcome balance splitter.
//!
//! Converts one spot deposit into per-outcome conditional balances. The split is a linear
//! resource: [`SplitProgress::begin`] opens it, [`SplitProgress::step`] visits outcomes
//! `0..outcome_count` in order, and [`SplitProgress::finish`] closes it once the whole deposit
//! has been handed out. Each method takes the progress by value, so a stale progress cannot be
//! stepped twice.

use crate::{
    constants::MODULE_SPLIT,
    error::SplitError,
    transaction::{Argument, LinearKind, LinearToken, MoveCall, ProgrammableTransactionBuilder},
    types::{ConditionalBalance, Leg, MarketRef},
};
use tracing::debug;

/// A split in progress.
///
/// Holds the transaction builder for its whole lifetime. Dropping it without calling
/// [`finish`](Self::finish) leaves the builder with an open resource, which makes
/// [`ProgrammableTransactionBuilder::finish`] fail.
#[derive(Debug)]
#[must_use = "a split must be stepped through every outcome and finished"]
pub struct SplitProgress<'a> {
    tx: &'a mut ProgrammableTransactionBuilder,
    market: &'a MarketRef,
    token: LinearToken,
    progress: Argument,
    leg: Leg,
    deposit: u64,
    remaining: u64,
    allocations: Vec<u64>,
}

/// How a finished split allocated its deposit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitAllocation {
    /// The spot leg that was split.
    pub leg: Leg,
    /// The original deposit.
    pub deposit: u64,
    /// Amount handed to each outcome, by index.
    pub allocations: Vec<u64>,
}

impl SplitAllocation {
    /// Sum of all allocations. Equals [`deposit`](Self::deposit) for every finished split.
    pub fn total(&self) -> u64 {
        self.allocations.iter().sum()
    }
}

impl<'a> SplitProgress<'a> {
    /// Starts splitting `coin`, worth `amount` of spot `leg`, into `market`'s outcomes.
    pub fn begin(
        tx: &'a mut ProgrammableTransactionBuilder,
        market: &'a MarketRef,
        leg: Leg,
        coin: Argument,
        amount: u64,
    ) -> Result<Self, SplitError> {
        if amount == 0 {
            return Err(SplitError::ZeroAmount { market_id: market.market_id() });
        }

        let proposal = market.proposal.input(tx, false)?;
        let escrow = market.escrow.input(tx, true)?;
        let function = match leg {
            Leg::Asset => "begin_split_asset",
            Leg::Stable => "begin_split_stable",
        };
        let progress = tx.move_call(
            MoveCall::new(market.package, MODULE_SPLIT, function)
                .with_type_arguments(market.type_arguments()?)
                .with_arguments(vec![proposal, escrow, coin]),
        )?;
        let token = tx.open_linear(LinearKind::SplitProgress);
        debug!(market_id = %market.market_id(), ?leg, amount, "began split");

        Ok(Self {
            tx,
            market,
            token,
            progress,
            leg,
            deposit: amount,
            remaining: amount,
            allocations: Vec::with_capacity(market.outcome_count as usize),
        })
    }

    /// The amount not allocated yet.
    pub const fn remaining(&self) -> u64 {
        self.remaining
    }

    /// The next outcome [`step`](Self::step) accepts, or `None` once every outcome was visited.
    pub fn next_outcome(&self) -> Option<u8> {
        let next = self.allocations.len();
        (next < self.market.outcome_count as usize).then_some(next as u8)
    }

    /// The market being split into.
    pub const fn market(&self) -> &'a MarketRef {
        self.market
    }

    /// The spot leg being split.
    pub const fn leg(&self) -> Leg {
        self.leg
    }

    /// Allocates `share` of the deposit to `outcome`.
    ///
    /// `share` comes from the external market layer. Outcomes must be visited in strictly
    /// increasing order starting at `0`, without gaps.
    pub fn step(
        mut self,
        outcome: u8,
        share: u64,
    ) -> Result<(Self, ConditionalBalance), SplitError> {
        let outcome_count = self.market.outcome_count;
        if !self.market.has_outcome(outcome) {
            return Err(SplitError::OutcomeOutOfBounds { outcome, outcome_count });
        }
        let expected = self.allocations.len() as u16;
        if outcome as u16 != expected {
            return Err(SplitError::OutOfOrderOutcome { expected, got: outcome });
        }
        if share > self.remaining {
            return Err(SplitError::AllocationExceedsRemaining {
                outcome,
                share,
                remaining: self.remaining,
            });
        }

        let escrow = self.market.escrow.input(self.tx, true)?;
        let outcome_arg = self.tx.pure(&outcome)?;
        let share_arg = self.tx.pure(&share)?;
        let argument = self.tx.move_call(
            MoveCall::new(self.market.package, MODULE_SPLIT, "split_step")
                .with_type_arguments(self.market.type_arguments()?)
                .with_arguments(vec![self.progress, escrow, outcome_arg, share_arg]),
        )?;

        self.remaining -= share;
        self.allocations.push(share);
        debug!(outcome, share, remaining = self.remaining, "split step");

        let balance = ConditionalBalance {
            market_id: self.market.market_id(),
            outcome,
            leg: self.leg,
            amount: share,
            argument,
        };
        Ok((self, balance))
    }

    /// Closes the split.
    ///
    /// Fails with [`SplitError::IncompleteSplit`] unless every outcome was visited and the whole
    /// deposit was allocated.
    pub fn finish(self) -> Result<SplitAllocation, SplitError> {
        let stepped = self.allocations.len() as u16;
        if self.remaining != 0 || stepped != self.market.outcome_count {
            return Err(SplitError::IncompleteSplit {
                remaining: self.remaining,
                stepped,
                outcome_count: self.market.outcome_count,
            });
        }

        let Self { tx, market, token, progress, leg, deposit, allocations, .. } = self;
        let escrow = market.escrow.input(tx, true)?;
        tx.move_call(
            MoveCall::new(market.package, MODULE_SPLIT, "finish_split")
                .with_type_arguments(market.type_arguments()?)
                .with_arguments(vec![progress, escrow]),
        )?;
        tx.close_linear(token);
        debug!(market_id = %market.market_id(), deposit, "finished split");

        Ok(SplitAllocation { leg, deposit, allocations })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::TransactionError,
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

    #[test]
    fn zero_deposit_is_rejected() {
        let mut tx = ProgrammableTransactionBuilder::new();
        let market = market(2);
        let err = SplitProgress::begin(&mut tx, &market, Leg::Stable, Argument::GasCoin, 0)
            .unwrap_err();
        assert!(matches!(err, SplitError::ZeroAmount { .. }));
        assert_eq!(tx.command_count(), 0);
    }

    #[test]
    fn conserving_split_finishes() {
        let mut tx = ProgrammableTransactionBuilder::new();
        let market = market(2);
        let split =
            SplitProgress::begin(&mut tx, &market, Leg::Stable, Argument::GasCoin, 1_000).unwrap();
        let (split, reject) = split.step(0, 400).unwrap();
        let (split, accept) = split.step(1, 600).unwrap();
        assert_eq!(split.next_outcome(), None);
        let allocation = split.finish().unwrap();

        assert_eq!(allocation.total(), 1_000);
        assert_eq!((reject.outcome(), reject.amount()), (0, 400));
        assert_eq!((accept.outcome(), accept.amount()), (1, 600));

        let ptb = tx.finish().unwrap();
        let calls: Vec<_> = ptb.move_calls().map(|c| c.function.as_str()).collect();
        assert_eq!(calls, ["begin_split_stable", "split_step", "split_step", "finish_split"]);
    }

    #[test]
    fn out_of_order_steps_fail() {
        for (first, second) in [(1, 0), (0, 0), (0, 2)] {
            let mut tx = ProgrammableTransactionBuilder::new();
            let market = market(3);
            let split =
                SplitProgress::begin(&mut tx, &market, Leg::Asset, Argument::GasCoin, 9).unwrap();
            let err =
                split.step(first, 1).and_then(|(split, _)| split.step(second, 1)).unwrap_err();
            assert!(matches!(err, SplitError::OutOfOrderOutcome { .. }), "{first}, {second}");
        }
    }

    #[test]
    fn out_of_bounds_outcome() {
        let mut tx = ProgrammableTransactionBuilder::new();
        let market = market(2);
        let split =
            SplitProgress::begin(&mut tx, &market, Leg::Asset, Argument::GasCoin, 5).unwrap();
        let err = split.step(2, 1).unwrap_err();
        assert!(matches!(err, SplitError::OutcomeOutOfBounds { outcome: 2, outcome_count: 2 }));
    }

    #[test]
    fn over_allocation_fails() {
        let mut tx = ProgrammableTransactionBuilder::new();
        let market = market(2);
        let split =
            SplitProgress::begin(&mut tx, &market, Leg::Asset, Argument::GasCoin, 5).unwrap();
        let err = split.step(0, 6).unwrap_err();
        assert!(matches!(
            err,
            SplitError::AllocationExceedsRemaining { outcome: 0, share: 6, remaining: 5 }
        ));
    }

    #[test]
    fn incomplete_split_cannot_finish() {
        let mut tx = ProgrammableTransactionBuilder::new();
        let market = market(2);
        let split =
            SplitProgress::begin(&mut tx, &market, Leg::Stable, Argument::GasCoin, 10).unwrap();
        let (split, _) = split.step(0, 4).unwrap();
        let (split, _) = split.step(1, 5).unwrap();
        let err = split.finish().unwrap_err();
        assert!(matches!(err, SplitError::IncompleteSplit { remaining: 1, stepped: 2, .. }));
        assert!(matches!(tx.finish(), Err(TransactionError::UnconsumedResource { .. })));
    }

    #[test]
    fn unvisited_outcome_cannot_finish() {
        let mut tx = ProgrammableTransactionBuilder::new();
        let market = market(3);
        let split =
            SplitProgress::begin(&mut tx, &market, Leg::Stable, Argument::GasCoin, 10).unwrap();
        let (split, _) = split.step(0, 4).unwrap();
        let (split, _) = split.step(1, 6).unwrap();
        let err = split.finish().unwrap_err();
        assert!(matches!(err, SplitError::IncompleteSplit { remaining: 0, stepped: 2, .. }));
    }

    #[test]
    fn full_width_proposal_steps_every_outcome() {
        let mut tx = ProgrammableTransactionBuilder::new();
        let market = market(256);
        let mut split =
            SplitProgress::begin(&mut tx, &market, Leg::Asset, Argument::GasCoin, 256).unwrap();
        for outcome in market.outcomes() {
            split = split.step(outcome, 1).unwrap().0;
        }
        assert_eq!(split.next_outcome(), None);
        let err = split.step(0, 0).unwrap_err();
        assert!(matches!(err, SplitError::OutOfOrderOutcome { expected: 256, got: 0 }));
    }
}
