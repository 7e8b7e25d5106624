//! Balance wrapper (incomplete set) codec.
//!
//! A wrapper holds per-outcome leftovers that could not be recombined into spot tokens. It uses a
//! dense fixed layout so repeated trades merge into one object per market instead of leaving one
//! dust object per trade.
//!
//! Wire format (BCS):
//!
//! ```text
//! { market_id: [u8; 32], outcome_count: u64, version: u64, balances: vector<u64> }
//! ```
//!
//! with `balances.len() == 2 * outcome_count`.

use super::{Leg, ObjectId, OutcomeBalances};
use crate::{
    constants::{BALANCE_WRAPPER_VERSION, MAX_OUTCOMES},
    error::WrapperError,
};
use serde::{Deserialize, Serialize};

/// Field layout shared by the BCS wire format and the serde form of [`BalanceWrapper`].
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBalanceWrapper {
    market_id: ObjectId,
    outcome_count: u64,
    version: u64,
    balances: Vec<u64>,
}

impl RawBalanceWrapper {
    fn check_layout(&self) -> Result<(), WrapperError> {
        let consistent = self.outcome_count <= MAX_OUTCOMES as u64
            && self.outcome_count.checked_mul(2) == Some(self.balances.len() as u64);
        if !consistent {
            return Err(WrapperError::MalformedWrapper {
                outcome_count: self.outcome_count,
                length: self.balances.len(),
            });
        }
        Ok(())
    }
}

impl From<BalanceWrapper> for RawBalanceWrapper {
    fn from(wrapper: BalanceWrapper) -> Self {
        Self {
            market_id: wrapper.market_id,
            outcome_count: wrapper.balances.outcome_count() as u64,
            version: wrapper.version,
            balances: wrapper.balances.into_inner(),
        }
    }
}

impl TryFrom<RawBalanceWrapper> for BalanceWrapper {
    type Error = WrapperError;

    fn try_from(raw: RawBalanceWrapper) -> Result<Self, Self::Error> {
        let RawBalanceWrapper { market_id, outcome_count, version, balances } = raw;
        Self::from_parts(market_id, outcome_count, version, balances)
    }
}

/// Per-outcome leftovers owned by a user.
///
/// Deserializing goes through the same layout and version checks as [`BalanceWrapper::decode`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawBalanceWrapper", into = "RawBalanceWrapper")]
pub struct BalanceWrapper {
    market_id: ObjectId,
    version: u64,
    balances: OutcomeBalances,
}

impl BalanceWrapper {
    /// Creates an empty wrapper for `market_id`.
    pub fn new(market_id: ObjectId, outcome_count: u16) -> Self {
        Self::from_balances(market_id, OutcomeBalances::zeroed(outcome_count))
    }

    /// Wraps a dense ledger.
    pub fn from_balances(market_id: ObjectId, balances: OutcomeBalances) -> Self {
        Self { market_id, version: BALANCE_WRAPPER_VERSION, balances }
    }

    /// Builds a wrapper from decoded fields, validating the layout.
    pub fn from_parts(
        market_id: ObjectId,
        outcome_count: u64,
        version: u64,
        balances: Vec<u64>,
    ) -> Result<Self, WrapperError> {
        let balances = OutcomeBalances::from_dense(outcome_count, balances)?;
        if version == 0 || version > BALANCE_WRAPPER_VERSION {
            return Err(WrapperError::UnsupportedVersion { version });
        }
        Ok(Self { market_id, version, balances })
    }

    /// Decodes a BCS-encoded wrapper.
    ///
    /// The vector length is validated against the outcome count before anything else looks at
    /// the entries.
    pub fn decode(raw: &[u8]) -> Result<Self, WrapperError> {
        bcs::from_bytes::<RawBalanceWrapper>(raw)?.try_into()
    }

    /// Encodes the wrapper with BCS. Refuses to emit a vector whose length is not
    /// `2 * outcome_count`.
    pub fn encode(&self) -> Result<Vec<u8>, WrapperError> {
        let raw = RawBalanceWrapper::from(self.clone());
        raw.check_layout()?;
        Ok(bcs::to_bytes(&raw)?)
    }

    /// The market this wrapper belongs to.
    pub const fn market_id(&self) -> ObjectId {
        self.market_id
    }

    /// Number of outcomes covered.
    pub fn outcome_count(&self) -> usize {
        self.balances.outcome_count()
    }

    /// Format version.
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// The dense ledger.
    pub const fn balances(&self) -> &OutcomeBalances {
        &self.balances
    }

    /// True iff every entry is zero.
    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }

    /// Amount held for `(outcome, leg)`.
    pub fn sum_for_outcome(&self, outcome: u8, leg: Leg) -> Result<u64, WrapperError> {
        self.balances.get(outcome, leg)
    }

    fn ensure_market(&self, market_id: ObjectId) -> Result<(), WrapperError> {
        if self.market_id != market_id {
            return Err(WrapperError::MarketMismatch { expected: self.market_id, got: market_id });
        }
        Ok(())
    }

    /// Adds every entry of `other` into `self`. Both must belong to the same market.
    pub fn merge(&mut self, other: &Self) -> Result<(), WrapperError> {
        self.ensure_market(other.market_id)?;
        self.balances.add_all(&other.balances)
    }

    /// Adds a ledger produced by trading the same market into `self`.
    pub fn merge_balances(
        &mut self,
        market_id: ObjectId,
        balances: &OutcomeBalances,
    ) -> Result<(), WrapperError> {
        self.ensure_market(market_id)?;
        self.balances.add_all(balances)
    }

    /// Removes `amount` from `(outcome, leg)`, returning what is left in that entry.
    pub fn withdraw(&mut self, outcome: u8, leg: Leg, amount: u64) -> Result<u64, WrapperError> {
        self.balances.debit(outcome, leg, amount)
    }

    /// Destroys the wrapper. Fails unless every entry is zero.
    pub fn destroy_empty(self) -> Result<(), WrapperError> {
        if !self.is_empty() {
            return Err(WrapperError::NotEmpty { market_id: self.market_id });
        }
        Ok(())
    }
}

/// Per-outcome totals summed across several wrappers of one market.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutcomeTotals {
    /// The market.
    pub market_id: ObjectId,
    /// Summed balances.
    pub balances: OutcomeBalances,
}

impl OutcomeTotals {
    /// Total for `(outcome, leg)`.
    pub fn get(&self, outcome: u8, leg: Leg) -> Result<u64, WrapperError> {
        self.balances.get(outcome, leg)
    }
}

/// Sums same-index entries across `wrappers`.
///
/// All wrappers must belong to the same market and cover the same outcome count.
pub fn merge_across_wrappers(
    wrappers: &[BalanceWrapper],
) -> Result<OutcomeTotals, WrapperError> {
    let (first, rest) = wrappers.split_first().ok_or(WrapperError::NoWrappers)?;
    let mut totals = first.clone();
    for wrapper in rest {
        totals.merge(wrapper)?;
    }
    Ok(OutcomeTotals { market_id: totals.market_id, balances: totals.balances })
}
