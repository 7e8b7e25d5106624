use super::{FailureKind, Operation, TransactionError};
use crate::{transaction::ObjectHandle, types::ObjectId};
use thiserror::Error;

/// Errors related to outcome escrows.
#[derive(Debug, Error)]
pub enum EscrowError {
    /// Escrows cannot be created for outcomes the proposal does not have.
    #[error("escrow.create: outcome {outcome} is out of bounds for {outcome_count} outcomes")]
    OutcomeOutOfBounds {
        /// The requested outcome.
        outcome: u8,
        /// Number of outcomes in the proposal.
        outcome_count: u16,
    },
    /// A coin deposit of zero.
    #[error("escrow.create: deposit must be greater than zero")]
    ZeroAmount,
    /// A withdrawal of zero.
    #[error("escrow.withdraw: withdrawal must be greater than zero")]
    ZeroWithdrawal,
    /// The escrow was destroyed earlier in the transaction.
    #[error("{operation}: escrow {escrow} was already destroyed")]
    Destroyed {
        /// The escrow.
        escrow: ObjectHandle,
        /// The operation attempted on it.
        operation: Operation,
    },
    /// The proposal passed in is not the one the escrow was created for.
    #[error("escrow: escrow belongs to proposal {expected}, got {got}")]
    ProposalMismatch {
        /// The escrow's proposal.
        expected: ObjectId,
        /// The proposal passed in.
        got: ObjectId,
    },
    /// The receipt was issued by a different escrow.
    #[error("escrow.withdraw: receipt for escrow {receipt_escrow} presented to escrow {escrow}")]
    ReceiptMismatch {
        /// The escrow being withdrawn from.
        escrow: String,
        /// The escrow named by the receipt.
        receipt_escrow: String,
    },
    /// The proposal has not been finalized yet.
    #[error("escrow.withdraw: proposal {proposal_id} is not finalized")]
    NotFinalized {
        /// The proposal.
        proposal_id: ObjectId,
    },
    /// The escrowed outcome lost.
    #[error(
        "escrow.withdraw: outcome {outcome} of proposal {proposal_id} did not win (winner {winner})"
    )]
    OutcomeDidNotWin {
        /// The proposal.
        proposal_id: ObjectId,
        /// The receipt's outcome.
        outcome: u8,
        /// The finalized winner.
        winner: u8,
    },
    /// A partial withdrawal asked for more than the escrow holds.
    #[error("escrow.withdraw: escrow {escrow} holds {available}, requested {requested}")]
    InsufficientBalance {
        /// The escrow.
        escrow: ObjectHandle,
        /// The amount held.
        available: u64,
        /// The amount requested.
        requested: u64,
    },
    /// The escrow still holds coins or objects.
    #[error("escrow.destroy: escrow {escrow} still holds {balance} and {objects} objects")]
    NotEmpty {
        /// The escrow.
        escrow: ObjectHandle,
        /// Remaining coin balance.
        balance: u64,
        /// Remaining object count.
        objects: usize,
    },
    /// Transaction assembly failed.
    #[error(transparent)]
    Transaction(#[from] TransactionError),
}

impl EscrowError {
    /// The operation that failed.
    pub const fn operation(&self) -> Operation {
        match self {
            Self::OutcomeOutOfBounds { .. } | Self::ZeroAmount => Operation::EscrowCreate,
            Self::NotEmpty { .. } => Operation::EscrowDestroy,
            Self::Destroyed { operation, .. } => *operation,
            Self::Transaction(_) => Operation::Assemble,
            _ => Operation::EscrowWithdraw,
        }
    }

    /// The taxonomy label.
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::OutcomeOutOfBounds { .. } => FailureKind::OutcomeOutOfBounds,
            Self::ZeroAmount | Self::ZeroWithdrawal => FailureKind::ZeroAmount,
            Self::Destroyed { .. } => FailureKind::Destroyed,
            Self::ProposalMismatch { .. } => FailureKind::MarketMismatch,
            Self::ReceiptMismatch { .. } => FailureKind::ReceiptMismatch,
            Self::NotFinalized { .. } => FailureKind::NotFinalized,
            Self::OutcomeDidNotWin { .. } => FailureKind::OutcomeDidNotWin,
            Self::InsufficientBalance { .. } => FailureKind::InsufficientBalance,
            Self::NotEmpty { .. } => FailureKind::NotEmpty,
            Self::Transaction(err) => err.kind(),
        }
    }
}
