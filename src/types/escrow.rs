//! Outcome escrow types.
//!
//! An escrow holds coins or objects for one `(proposal, outcome)` pair. The depositor gets an
//! [`EscrowReceipt`] and can redeem through it only once the proposal is finalized with that
//! outcome as the winner. If another outcome wins the escrow stays locked.

use super::{Address, ObjectId, ObjectRef, Proposal};
use crate::{
    error::EscrowError,
    transaction::{Argument, ObjectHandle},
};
use serde::{Deserialize, Serialize};

/// Lifecycle of an escrow relative to its proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EscrowStatus {
    /// The proposal is not finalized yet.
    Active,
    /// The escrowed outcome won and funds remain.
    Redeemable,
    /// The escrowed outcome won and everything was withdrawn.
    Drained,
    /// Another outcome won. Nothing can be withdrawn through a receipt.
    Locked,
    /// The escrow object was destroyed.
    Destroyed,
}

/// What is placed into an escrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deposit {
    /// A coin of the escrow's type.
    Coin {
        /// The coin value.
        amount: u64,
        /// The coin argument.
        coin: Argument,
    },
    /// An arbitrary object.
    Object {
        /// The object id.
        id: ObjectId,
        /// The object argument.
        object: Argument,
    },
}

/// Client-side view of an outcome escrow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Escrow {
    pub(crate) handle: ObjectHandle,
    pub(crate) proposal_id: ObjectId,
    pub(crate) outcome: u8,
    pub(crate) balance: u64,
    pub(crate) objects: Vec<ObjectId>,
    pub(crate) destroyed: bool,
}

impl Escrow {
    /// Builds the view of an escrow that already exists on the ledger.
    pub const fn from_snapshot(
        handle: ObjectHandle,
        proposal_id: ObjectId,
        outcome: u8,
        balance: u64,
        objects: Vec<ObjectId>,
    ) -> Self {
        Self { handle, proposal_id, outcome, balance, objects, destroyed: false }
    }

    /// How the escrow is referenced in transactions.
    pub const fn handle(&self) -> ObjectHandle {
        self.handle
    }

    /// The proposal.
    pub const fn proposal_id(&self) -> ObjectId {
        self.proposal_id
    }

    /// The escrowed outcome.
    pub const fn outcome(&self) -> u8 {
        self.outcome
    }

    /// Coin balance held.
    pub const fn balance(&self) -> u64 {
        self.balance
    }

    /// Objects held.
    pub fn objects(&self) -> &[ObjectId] {
        &self.objects
    }

    /// True when no coins or objects remain.
    pub fn is_empty(&self) -> bool {
        self.balance == 0 && self.objects.is_empty()
    }

    /// True once a destroy call for this escrow was appended.
    pub const fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Status of the escrow given the current state of its proposal.
    pub fn status(&self, proposal: &Proposal) -> EscrowStatus {
        if self.destroyed {
            return EscrowStatus::Destroyed;
        }
        if !proposal.is_finalized() {
            return EscrowStatus::Active;
        }
        match proposal.winner() {
            Some(winner) if winner == self.outcome && self.is_empty() => EscrowStatus::Drained,
            Some(winner) if winner == self.outcome => EscrowStatus::Redeemable,
            _ => EscrowStatus::Locked,
        }
    }
}

/// Capability to withdraw from one escrow. Not `Clone`; withdrawing everything consumes it.
#[derive(Debug, PartialEq, Eq)]
pub struct EscrowReceipt {
    pub(crate) handle: ObjectHandle,
    pub(crate) escrow: ObjectHandle,
    pub(crate) proposal_id: ObjectId,
    pub(crate) outcome: u8,
    pub(crate) depositor: Address,
}

impl EscrowReceipt {
    /// Builds the view of a receipt that already exists on the ledger.
    pub const fn from_snapshot(
        handle: ObjectHandle,
        escrow: ObjectHandle,
        proposal_id: ObjectId,
        outcome: u8,
        depositor: Address,
    ) -> Self {
        Self { handle, escrow, proposal_id, outcome, depositor }
    }

    /// How the receipt is referenced in transactions.
    pub const fn handle(&self) -> ObjectHandle {
        self.handle
    }

    /// The escrow it redeems from.
    pub const fn escrow(&self) -> ObjectHandle {
        self.escrow
    }

    /// The proposal.
    pub const fn proposal_id(&self) -> ObjectId {
        self.proposal_id
    }

    /// The outcome the deposit is bound to.
    pub const fn outcome(&self) -> u8 {
        self.outcome
    }

    /// The depositor.
    pub const fn depositor(&self) -> Address {
        self.depositor
    }

    /// Lookup key: at most one live receipt exists per `(proposal, outcome)`.
    pub const fn key(&self) -> (ObjectId, u8) {
        (self.proposal_id, self.outcome)
    }
}

/// An escrow receipt as stored on the ledger or in the local index.
///
/// Records are plain data and can be cloned and persisted. [`bind`](Self::bind) turns one into
/// the [`EscrowReceipt`] capability for a specific escrow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EscrowReceiptRecord {
    /// The owned receipt object.
    pub object: ObjectRef,
    /// The escrow it redeems from.
    pub escrow_id: ObjectId,
    /// The proposal.
    pub proposal_id: ObjectId,
    /// The outcome the deposit is bound to.
    pub outcome: u8,
    /// The depositor.
    pub depositor: Address,
}

impl EscrowReceiptRecord {
    /// Lookup key.
    pub const fn key(&self) -> (ObjectId, u8) {
        (self.proposal_id, self.outcome)
    }

    /// Binds the record to `escrow`, failing with [`EscrowError::ReceiptMismatch`] if the record
    /// was issued by another escrow.
    pub fn bind(self, escrow: &Escrow) -> Result<EscrowReceipt, EscrowError> {
        if escrow.handle.id() != Some(self.escrow_id) {
            return Err(EscrowError::ReceiptMismatch {
                escrow: escrow.handle.to_string(),
                receipt_escrow: self.escrow_id.to_string(),
            });
        }
        Ok(EscrowReceipt {
            handle: ObjectHandle::Owned(self.object),
            escrow: escrow.handle,
            proposal_id: self.proposal_id,
            outcome: self.outcome,
            depositor: self.depositor,
        })
    }
}

/// What a withdrawal pays out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscrowPayout {
    /// Coin amount withdrawn.
    pub amount: u64,
    /// Objects withdrawn.
    pub objects: Vec<ObjectId>,
    /// The transaction result holding the payout.
    pub argument: Argument,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProposalState;

    fn escrow(balance: u64) -> Escrow {
        Escrow::from_snapshot(
            ObjectHandle::Pending(Argument::Result(0)),
            ObjectId::with_last_byte(1),
            1,
            balance,
            vec![],
        )
    }

    fn proposal(state: ProposalState, winner: Option<u8>) -> Proposal {
        Proposal {
            id: ObjectId::with_last_byte(1),
            market_id: ObjectId::with_last_byte(2),
            outcome_count: 3,
            state,
            winning_outcome: winner,
            outcome_labels: vec![],
        }
    }

    #[test]
    fn status_transitions() {
        assert_eq!(escrow(5).status(&proposal(ProposalState::Trading, None)), EscrowStatus::Active);
        assert_eq!(
            escrow(5).status(&proposal(ProposalState::Finalized, Some(1))),
            EscrowStatus::Redeemable
        );
        assert_eq!(
            escrow(0).status(&proposal(ProposalState::Finalized, Some(1))),
            EscrowStatus::Drained
        );
        assert_eq!(
            escrow(5).status(&proposal(ProposalState::Finalized, Some(2))),
            EscrowStatus::Locked
        );

        let mut destroyed = escrow(0);
        destroyed.destroyed = true;
        let won = proposal(ProposalState::Finalized, Some(1));
        assert_eq!(destroyed.status(&won), EscrowStatus::Destroyed);
    }

    #[test]
    fn records_bind_only_to_their_escrow() {
        let shared = |byte| ObjectHandle::Shared {
            id: ObjectId::with_last_byte(byte),
            initial_shared_version: 1,
        };
        let escrow = Escrow::from_snapshot(shared(9), ObjectId::with_last_byte(1), 1, 10, vec![]);
        let record = EscrowReceiptRecord {
            object: ObjectRef {
                id: ObjectId::with_last_byte(4),
                version: 2,
                digest: Default::default(),
            },
            escrow_id: ObjectId::with_last_byte(9),
            proposal_id: ObjectId::with_last_byte(1),
            outcome: 1,
            depositor: Address::with_last_byte(5),
        };
        let receipt = record.clone().bind(&escrow).unwrap();
        assert_eq!(receipt.escrow(), shared(9));
        assert_eq!(receipt.key(), record.key());

        let other = Escrow::from_snapshot(shared(8), ObjectId::with_last_byte(1), 1, 10, vec![]);
        assert!(matches!(record.bind(&other), Err(EscrowError::ReceiptMismatch { .. })));
    }
}
