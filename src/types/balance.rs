//! Per-outcome conditional balances.

use super::ObjectId;
use crate::{constants::MAX_OUTCOMES, error::WrapperError, transaction::Argument};
use serde::{Deserialize, Serialize};

/// One side of an outcome's conditional pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Leg {
    /// The conditional asset token.
    Asset,
    /// The conditional stable token.
    Stable,
}

impl Leg {
    /// Returns the other leg.
    pub const fn opposite(self) -> Self {
        match self {
            Self::Asset => Self::Stable,
            Self::Stable => Self::Asset,
        }
    }

    /// Offset of this leg inside an outcome's slot pair.
    const fn offset(self) -> usize {
        match self {
            Self::Asset => 0,
            Self::Stable => 1,
        }
    }
}

/// Direction of a conditional swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SwapDirection {
    /// Sell conditional asset for conditional stable.
    AssetToStable,
    /// Sell conditional stable for conditional asset.
    StableToAsset,
}

impl SwapDirection {
    /// The leg consumed by the swap.
    pub const fn input_leg(self) -> Leg {
        match self {
            Self::AssetToStable => Leg::Asset,
            Self::StableToAsset => Leg::Stable,
        }
    }

    /// The leg produced by the swap.
    pub const fn output_leg(self) -> Leg {
        self.input_leg().opposite()
    }

    /// The boolean flag passed on-chain. `true` means asset to stable.
    pub const fn is_asset_to_stable(self) -> bool {
        matches!(self, Self::AssetToStable)
    }
}

/// Dense per-outcome ledger laid out as
/// `[outcome0.asset, outcome0.stable, outcome1.asset, outcome1.stable, ...]`.
///
/// The length is always `2 * outcome_count`. Serializes as the bare vector and is validated on
/// the way back in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u64>", into = "Vec<u64>")]
pub struct OutcomeBalances {
    balances: Vec<u64>,
}

impl OutcomeBalances {
    /// Creates a zeroed ledger for `outcome_count` outcomes.
    pub fn zeroed(outcome_count: u16) -> Self {
        Self { balances: vec![0; 2 * outcome_count as usize] }
    }

    /// Wraps an existing dense vector, rejecting one whose length does not match or that covers
    /// more than [`MAX_OUTCOMES`] outcomes.
    pub fn from_dense(outcome_count: u64, balances: Vec<u64>) -> Result<Self, WrapperError> {
        let expected = outcome_count.checked_mul(2).ok_or(WrapperError::MalformedWrapper {
            outcome_count,
            length: balances.len(),
        })?;
        if balances.len() as u64 != expected || outcome_count > MAX_OUTCOMES as u64 {
            return Err(WrapperError::MalformedWrapper { outcome_count, length: balances.len() });
        }
        Ok(Self { balances })
    }

    /// Number of outcomes covered.
    pub fn outcome_count(&self) -> usize {
        self.balances.len() / 2
    }

    /// Returns the dense vector.
    pub fn as_slice(&self) -> &[u64] {
        &self.balances
    }

    /// Consumes the ledger, returning the dense vector.
    pub fn into_inner(self) -> Vec<u64> {
        self.balances
    }

    fn slot(&self, outcome: u8, leg: Leg) -> Result<usize, WrapperError> {
        if outcome as usize >= self.outcome_count() {
            return Err(WrapperError::OutcomeOutOfBounds {
                outcome,
                outcome_count: self.outcome_count(),
            });
        }
        Ok(outcome as usize * 2 + leg.offset())
    }

    /// Returns the amount held for `(outcome, leg)`.
    pub fn get(&self, outcome: u8, leg: Leg) -> Result<u64, WrapperError> {
        Ok(self.balances[self.slot(outcome, leg)?])
    }

    /// Adds `amount` to `(outcome, leg)`.
    pub fn credit(&mut self, outcome: u8, leg: Leg, amount: u64) -> Result<u64, WrapperError> {
        let slot = self.slot(outcome, leg)?;
        let updated = self.balances[slot]
            .checked_add(amount)
            .ok_or(WrapperError::Overflow { outcome, leg })?;
        self.balances[slot] = updated;
        Ok(updated)
    }

    /// Removes `amount` from `(outcome, leg)`.
    pub fn debit(&mut self, outcome: u8, leg: Leg, amount: u64) -> Result<u64, WrapperError> {
        let slot = self.slot(outcome, leg)?;
        let available = self.balances[slot];
        let updated = available.checked_sub(amount).ok_or(WrapperError::InsufficientBalance {
            outcome,
            leg,
            available,
            requested: amount,
        })?;
        self.balances[slot] = updated;
        Ok(updated)
    }

    /// Zeroes both legs of `outcome`, returning `(asset, stable)`.
    pub fn take_outcome(&mut self, outcome: u8) -> Result<(u64, u64), WrapperError> {
        let asset = self.slot(outcome, Leg::Asset)?;
        let taken = (self.balances[asset], self.balances[asset + 1]);
        self.balances[asset] = 0;
        self.balances[asset + 1] = 0;
        Ok(taken)
    }

    /// Adds every entry of `other` into `self`. Both must cover the same outcome count.
    pub fn add_all(&mut self, other: &Self) -> Result<(), WrapperError> {
        if other.balances.len() != self.balances.len() {
            return Err(WrapperError::MalformedWrapper {
                outcome_count: self.outcome_count() as u64,
                length: other.balances.len(),
            });
        }
        // Compute into a copy so a failed merge leaves `self` untouched.
        let mut merged = self.balances.clone();
        for (slot, (entry, add)) in merged.iter_mut().zip(&other.balances).enumerate() {
            let leg = if slot % 2 == 0 { Leg::Asset } else { Leg::Stable };
            *entry = entry
                .checked_add(*add)
                .ok_or(WrapperError::Overflow { outcome: (slot / 2) as u8, leg })?;
        }
        self.balances = merged;
        Ok(())
    }

    /// True iff every entry is zero.
    pub fn is_empty(&self) -> bool {
        self.balances.iter().all(|amount| *amount == 0)
    }

    /// Iterates `(outcome, asset, stable)` triples.
    pub fn iter_outcomes(&self) -> impl Iterator<Item = (u8, u64, u64)> + '_ {
        self.balances.chunks_exact(2).enumerate().map(|(idx, pair)| (idx as u8, pair[0], pair[1]))
    }
}

impl TryFrom<Vec<u64>> for OutcomeBalances {
    type Error = WrapperError;

    fn try_from(balances: Vec<u64>) -> Result<Self, Self::Error> {
        if balances.len() % 2 != 0 {
            return Err(WrapperError::MalformedWrapper {
                outcome_count: balances.len() as u64 / 2,
                length: balances.len(),
            });
        }
        Self::from_dense(balances.len() as u64 / 2, balances)
    }
}

impl From<OutcomeBalances> for Vec<u64> {
    fn from(balances: OutcomeBalances) -> Self {
        balances.balances
    }
}

/// A conditional balance for one outcome, produced by the splitter and referenced in the
/// transaction under construction.
///
/// Not `Clone`: each balance is spent exactly once, by depositing it into a swap
/// batch.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a split balance must be deposited into a swap batch"]
pub struct ConditionalBalance {
    pub(crate) market_id: ObjectId,
    pub(crate) outcome: u8,
    pub(crate) leg: Leg,
    pub(crate) amount: u64,
    pub(crate) argument: Argument,
}

impl ConditionalBalance {
    /// The market this balance belongs to.
    pub const fn market_id(&self) -> ObjectId {
        self.market_id
    }

    /// The outcome index.
    pub const fn outcome(&self) -> u8 {
        self.outcome
    }

    /// The conditional leg.
    pub const fn leg(&self) -> Leg {
        self.leg
    }

    /// The amount allocated to this outcome.
    pub const fn amount(&self) -> u64 {
        self.amount
    }

    /// The transaction argument holding the balance.
    pub const fn argument(&self) -> Argument {
        self.argument
    }
}
