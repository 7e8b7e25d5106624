//! The external market layer.
//!
//! How much each outcome receives in a split and what a swap returns are decided by the
//! on-chain markets. The orchestrator only asks for those numbers through [`OutcomeMarkets`] and
//! checks them against its bookkeeping invariants.

use crate::{
    constants::MAX_BPS,
    types::{Leg, MarketRef, SwapDirection},
};
use std::collections::HashMap;
use thiserror::Error;

/// A quote could not be produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct QuoteError(pub String);

/// Source of split shares and swap quotes for one proposal's markets.
pub trait OutcomeMarkets: std::fmt::Debug {
    /// The share of `deposit` (of spot `leg`) that `outcome` receives.
    fn split_share(
        &self,
        market: &MarketRef,
        leg: Leg,
        deposit: u64,
        outcome: u8,
    ) -> Result<u64, QuoteError>;

    /// The output of swapping `amount_in` in `outcome`'s conditional market.
    fn quote_swap(
        &self,
        market: &MarketRef,
        outcome: u8,
        direction: SwapDirection,
        amount_in: u64,
    ) -> Result<u64, QuoteError>;
}

/// Lowest output accepted for `quoted` under a slippage tolerance of `slippage_bps`.
pub fn min_amount_out(quoted: u64, slippage_bps: u16) -> u64 {
    let keep = MAX_BPS.saturating_sub(slippage_bps as u64);
    // Cannot overflow: `keep <= MAX_BPS`, so the result is at most `quoted`.
    ((quoted as u128 * keep as u128) / MAX_BPS as u128) as u64
}

/// A static quote source.
///
/// Split shares follow fixed per-outcome weights, with the last outcome taking any rounding
/// remainder so shares always sum to the deposit. Swaps convert at a fixed rate per
/// `(outcome, direction)`, in basis points of the input.
#[derive(Debug, Clone, Default)]
pub struct QuoteTable {
    weights: Vec<u64>,
    rates: HashMap<(u8, SwapDirection), u64>,
}

impl QuoteTable {
    /// Creates an empty table. Without weights, deposits split evenly.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the split weights, one per outcome.
    pub fn with_split_weights(mut self, weights: Vec<u64>) -> Self {
        self.weights = weights;
        self
    }

    /// Sets the conversion rate for swaps in `outcome` and `direction`.
    pub fn with_rate_bps(mut self, outcome: u8, direction: SwapDirection, rate_bps: u64) -> Self {
        self.rates.insert((outcome, direction), rate_bps);
        self
    }

    fn weight(&self, outcome: u8) -> u64 {
        if self.weights.is_empty() {
            return 1;
        }
        self.weights.get(outcome as usize).copied().unwrap_or(0)
    }
}

impl OutcomeMarkets for QuoteTable {
    fn split_share(
        &self,
        market: &MarketRef,
        _leg: Leg,
        deposit: u64,
        outcome: u8,
    ) -> Result<u64, QuoteError> {
        if !market.has_outcome(outcome) {
            return Err(QuoteError(format!("no market for outcome {outcome}")));
        }
        let total: u128 = market.outcomes().map(|o| self.weight(o) as u128).sum();
        if total == 0 {
            return Err(QuoteError("split weights are all zero".to_string()));
        }
        let share_of = |o: u8| (deposit as u128 * self.weight(o) as u128 / total) as u64;
        if outcome as u16 + 1 == market.outcome_count {
            let allocated: u64 = (0..outcome).map(share_of).sum();
            return Ok(deposit - allocated);
        }
        Ok(share_of(outcome))
    }

    fn quote_swap(
        &self,
        _market: &MarketRef,
        outcome: u8,
        direction: SwapDirection,
        amount_in: u64,
    ) -> Result<u64, QuoteError> {
        let rate = self
            .rates
            .get(&(outcome, direction))
            .ok_or_else(|| QuoteError(format!("no {direction:?} rate for outcome {outcome}")))?;
        u64::try_from(amount_in as u128 * *rate as u128 / MAX_BPS as u128)
            .map_err(|_| QuoteError(format!("quote for outcome {outcome} overflows u64")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ObjectId, SharedObject};

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
    fn uneven_weights_conserve_deposit() {
        let table = QuoteTable::new().with_split_weights(vec![1, 1, 1]);
        let market = market(3);
        let shares: Vec<u64> = (0..3)
            .map(|o| table.split_share(&market, Leg::Stable, 1_000_000, o).unwrap())
            .collect();
        assert_eq!(shares, vec![333_333, 333_333, 333_334]);
    }

    #[test]
    fn swap_rate() {
        let table = QuoteTable::new().with_rate_bps(1, SwapDirection::StableToAsset, 9_000);
        let market = market(2);
        assert_eq!(
            table.quote_swap(&market, 1, SwapDirection::StableToAsset, 1_000_000).unwrap(),
            900_000
        );
        assert!(table.quote_swap(&market, 0, SwapDirection::StableToAsset, 1).is_err());
    }

    #[test]
    fn slippage() {
        assert_eq!(min_amount_out(1_000_000, 50), 995_000);
        assert_eq!(min_amount_out(10, 0), 10);
        assert_eq!(min_amount_out(10, u16::MAX), 0);
    }
}
