//! Proposals and references to their conditional markets.

use super::ObjectId;
use crate::{
    constants::REJECT_OUTCOME,
    error::TransactionError,
    transaction::{Argument, ProgrammableTransactionBuilder, TypeTag},
};
use serde::{Deserialize, Serialize};

/// Lifecycle of a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProposalState {
    /// Waiting for trading to open.
    Reviewing,
    /// Conditional markets are open.
    Trading,
    /// A winning outcome has been fixed.
    Finalized,
}

impl ProposalState {
    /// Decodes the on-chain `u8` state tag.
    pub const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::Reviewing),
            1 => Some(Self::Trading),
            2 => Some(Self::Finalized),
            _ => None,
        }
    }
}

/// A governance proposal, as read from the ledger.
///
/// Outcome `0` is the reject baseline; `1..outcome_count` are accept variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proposal {
    /// The proposal object id.
    pub id: ObjectId,
    /// Id of the market escrow holding this proposal's conditional balances.
    pub market_id: ObjectId,
    /// Number of outcomes, at most [`MAX_OUTCOMES`](crate::constants::MAX_OUTCOMES).
    pub outcome_count: u16,
    /// Lifecycle state.
    pub state: ProposalState,
    /// Winning outcome, set once finalized.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winning_outcome: Option<u8>,
    /// Human-readable outcome labels, if published.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outcome_labels: Vec<String>,
}

impl Proposal {
    /// Whether the proposal reached its final state.
    pub fn is_finalized(&self) -> bool {
        self.state == ProposalState::Finalized
    }

    /// The winning outcome. `None` until finalized.
    pub fn winner(&self) -> Option<u8> {
        self.winning_outcome.filter(|_| self.is_finalized())
    }

    /// Whether the proposal finalized on the reject baseline.
    pub fn is_rejected(&self) -> bool {
        self.winner() == Some(REJECT_OUTCOME)
    }

    /// Whether `outcome` is a valid index for this proposal.
    pub const fn has_outcome(&self, outcome: u8) -> bool {
        (outcome as u16) < self.outcome_count
    }

    /// Label of `outcome`, if published.
    pub fn outcome_label(&self, outcome: u8) -> Option<&str> {
        self.outcome_labels.get(outcome as usize).map(String::as_str)
    }
}

/// A shared object with the version at which it became shared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedObject {
    /// The object id.
    pub id: ObjectId,
    /// Initial shared version.
    pub initial_shared_version: u64,
}

impl SharedObject {
    /// Adds this object to `tx` as a shared input.
    pub fn input(
        &self,
        tx: &mut ProgrammableTransactionBuilder,
        mutable: bool,
    ) -> Result<Argument, TransactionError> {
        tx.shared_object(self.id, self.initial_shared_version, mutable)
    }
}

/// Everything needed to call into one proposal's conditional markets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketRef {
    /// Package exposing the futarchy modules.
    pub package: ObjectId,
    /// The proposal.
    pub proposal: SharedObject,
    /// The market escrow. Its id is the market id.
    pub escrow: SharedObject,
    /// Number of outcomes.
    pub outcome_count: u16,
    /// Fully qualified spot asset type.
    pub asset_type: String,
    /// Fully qualified spot stable type.
    pub stable_type: String,
}

impl MarketRef {
    /// The market id.
    pub const fn market_id(&self) -> ObjectId {
        self.escrow.id
    }

    /// Type arguments of every market call: `<Asset, Stable>`.
    pub fn type_arguments(&self) -> Result<Vec<TypeTag>, TransactionError> {
        Ok(vec![self.asset_type.parse()?, self.stable_type.parse()?])
    }

    /// Whether `outcome` is a valid index for this market.
    pub const fn has_outcome(&self, outcome: u8) -> bool {
        (outcome as u16) < self.outcome_count
    }

    /// Outcome indices in order.
    pub fn outcomes(&self) -> impl Iterator<Item = u8> {
        (0..=u8::MAX).take(self.outcome_count as usize)
    }
}

/// A per-outcome conditional market, as read from the ledger.
///
/// The reserves are reported for display only; pricing happens on-chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionalMarket {
    /// The pool object id.
    pub id: ObjectId,
    /// The market escrow it belongs to.
    pub market_id: ObjectId,
    /// The outcome it trades.
    pub outcome: u8,
    /// Conditional asset reserve.
    pub asset_reserve: u64,
    /// Conditional stable reserve.
    pub stable_reserve: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proposal(state: ProposalState, winning_outcome: Option<u8>) -> Proposal {
        Proposal {
            id: ObjectId::with_last_byte(1),
            market_id: ObjectId::with_last_byte(2),
            outcome_count: 2,
            state,
            winning_outcome,
            outcome_labels: vec!["Reject".into(), "Accept".into()],
        }
    }

    #[test]
    fn winner_requires_finalized_state() {
        assert_eq!(proposal(ProposalState::Trading, Some(1)).winner(), None);
        assert_eq!(proposal(ProposalState::Finalized, Some(1)).winner(), Some(1));
        assert_eq!(proposal(ProposalState::Finalized, None).winner(), None);
        assert!(proposal(ProposalState::Finalized, Some(0)).is_rejected());
        assert!(!proposal(ProposalState::Trading, Some(0)).is_rejected());
    }

    #[test]
    fn labels() {
        let p = proposal(ProposalState::Reviewing, None);
        assert_eq!(p.outcome_label(0), Some("Reject"));
        assert_eq!(p.outcome_label(5), None);
        assert!(p.has_outcome(1));
        assert!(!p.has_outcome(2));
    }

    #[test]
    fn state_tags() {
        assert_eq!(ProposalState::from_tag(2), Some(ProposalState::Finalized));
        assert_eq!(ProposalState::from_tag(3), None);
    }
}
