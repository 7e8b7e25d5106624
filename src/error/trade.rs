use super::{FailureKind, Operation, TransactionError, WrapperError};
use crate::types::{Leg, ObjectId};
use thiserror::Error;

/// Errors raised by the outcome balance splitter.
#[derive(Debug, Error)]
pub enum SplitError {
    /// The deposit was zero.
    #[error("split.begin: deposit into market {market_id} must be greater than zero")]
    ZeroAmount {
        /// The market being split into.
        market_id: ObjectId,
    },
    /// The outcome index is past the proposal's outcome count.
    #[error("split.step: outcome {outcome} is out of bounds for {outcome_count} outcomes")]
    OutcomeOutOfBounds {
        /// The requested outcome.
        outcome: u8,
        /// Number of outcomes in the proposal.
        outcome_count: u16,
    },
    /// Steps must visit outcomes in strictly increasing order without gaps.
    #[error("split.step: expected outcome {expected}, got {got}")]
    OutOfOrderOutcome {
        /// The next outcome the split expects.
        expected: u16,
        /// The outcome that was requested.
        got: u8,
    },
    /// The share quoted for an outcome exceeds what is left of the deposit.
    #[error("split.step: share {share} for outcome {outcome} exceeds remaining {remaining}")]
    AllocationExceedsRemaining {
        /// The outcome being allocated.
        outcome: u8,
        /// The share that was requested.
        share: u64,
        /// The amount still unallocated.
        remaining: u64,
    },
    /// The external market layer could not provide a share.
    #[error("split.step: no share for outcome {outcome}: {reason}")]
    QuoteUnavailable {
        /// The outcome being allocated.
        outcome: u8,
        /// Why the quote failed.
        reason: String,
    },
    /// The split was closed before the whole deposit was allocated.
    #[error(
        "split.finish: {remaining} left unallocated after {stepped} of {outcome_count} outcomes"
    )]
    IncompleteSplit {
        /// The amount still unallocated.
        remaining: u64,
        /// Number of outcomes already allocated.
        stepped: u16,
        /// Number of outcomes in the proposal.
        outcome_count: u16,
    },
    /// Transaction assembly failed.
    #[error(transparent)]
    Transaction(#[from] TransactionError),
}

impl SplitError {
    /// The operation that failed.
    pub const fn operation(&self) -> Operation {
        match self {
            Self::ZeroAmount { .. } => Operation::SplitBegin,
            Self::OutcomeOutOfBounds { .. }
            | Self::OutOfOrderOutcome { .. }
            | Self::AllocationExceedsRemaining { .. }
            | Self::QuoteUnavailable { .. } => Operation::SplitStep,
            Self::IncompleteSplit { .. } => Operation::SplitFinish,
            Self::Transaction(_) => Operation::Assemble,
        }
    }

    /// The taxonomy label.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::ZeroAmount { .. } => FailureKind::ZeroAmount,
            Self::OutcomeOutOfBounds { .. } => FailureKind::OutcomeOutOfBounds,
            Self::OutOfOrderOutcome { .. } => FailureKind::OutOfOrderOutcome,
            Self::AllocationExceedsRemaining { .. } => FailureKind::AllocationExceedsRemaining,
            Self::QuoteUnavailable { .. } => FailureKind::Internal,
            Self::IncompleteSplit { .. } => FailureKind::IncompleteSplit,
            Self::Transaction(err) => err.kind(),
        }
    }
}

/// Errors raised by the batch swap sequencer.
#[derive(Debug, Error)]
pub enum SwapError {
    /// A swap input of zero.
    #[error("batch.swap: input for outcome {outcome} must be greater than zero")]
    ZeroAmount {
        /// The outcome being swapped in.
        outcome: u8,
    },
    /// The outcome index is past the batch's outcome count.
    #[error("batch.swap: outcome {outcome} is out of bounds for {outcome_count} outcomes")]
    OutcomeOutOfBounds {
        /// The requested outcome.
        outcome: u8,
        /// Number of outcomes covered by the batch.
        outcome_count: u16,
    },
    /// A balance from another market was deposited into the batch.
    #[error("batch.deposit: balance belongs to market {got}, batch trades market {expected}")]
    MarketMismatch {
        /// The batch's market.
        expected: ObjectId,
        /// The balance's market.
        got: ObjectId,
    },
    /// The batch does not hold enough of the input leg.
    #[error(
        "batch.swap: outcome {outcome} holds {available} {leg:?}, swap needs {requested}"
    )]
    InsufficientBalance {
        /// The outcome being swapped in.
        outcome: u8,
        /// The input leg.
        leg: Leg,
        /// The amount held by the batch.
        available: u64,
        /// The amount the swap needs.
        requested: u64,
    },
    /// Slippage guard: the realized output is below the caller's minimum.
    #[error(
        "batch.swap: outcome {outcome} would return {quoted}, below the minimum of {minimum}"
    )]
    InsufficientOutput {
        /// The outcome being swapped in.
        outcome: u8,
        /// The output quoted by the market.
        quoted: u64,
        /// The minimum the caller accepts.
        minimum: u64,
    },
    /// The external market layer could not quote the swap.
    #[error("batch.swap: no quote for outcome {outcome}: {reason}")]
    QuoteUnavailable {
        /// The outcome being swapped in.
        outcome: u8,
        /// Why the quote failed.
        reason: String,
    },
    /// A ledger update failed.
    #[error("batch: {0}")]
    Ledger(#[from] WrapperError),
    /// Transaction assembly failed.
    #[error(transparent)]
    Transaction(#[from] TransactionError),
}

impl SwapError {
    /// The operation that failed.
    pub const fn operation(&self) -> Operation {
        match self {
            Self::MarketMismatch { .. } => Operation::BatchDeposit,
            Self::Transaction(_) => Operation::Assemble,
            _ => Operation::Swap,
        }
    }

    /// The taxonomy label.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::ZeroAmount { .. } => FailureKind::ZeroAmount,
            Self::OutcomeOutOfBounds { .. } => FailureKind::OutcomeOutOfBounds,
            Self::MarketMismatch { .. } => FailureKind::MarketMismatch,
            Self::InsufficientBalance { .. } => FailureKind::InsufficientBalance,
            Self::InsufficientOutput { .. } => FailureKind::InsufficientOutput,
            Self::QuoteUnavailable { .. } => FailureKind::Internal,
            Self::Ledger(err) => err.kind(),
            Self::Transaction(err) => err.kind(),
        }
    }
}

/// Errors raised by the settlement finalizer.
#[derive(Debug, Error)]
pub enum SettlementError {
    /// The batch was begun against a different market than the one it is settled against.
    #[error("batch.finalize: batch trades market {batch}, settlement targets {market}")]
    MarketMismatch {
        /// The batch's market.
        batch: ObjectId,
        /// The market passed to finalize.
        market: ObjectId,
    },
    /// The recombined payout does not fit `u64`.
    #[error("batch.finalize: spot payout overflows u64")]
    PayoutOverflow,
    /// Merging the remainder into an existing wrapper failed.
    #[error("batch.finalize: {0}")]
    Wrapper(#[from] WrapperError),
    /// Transaction assembly failed.
    #[error(transparent)]
    Transaction(#[from] TransactionError),
}

impl SettlementError {
    /// The taxonomy label.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::MarketMismatch { .. } => FailureKind::MarketMismatch,
            Self::PayoutOverflow => FailureKind::Overflow,
            Self::Wrapper(err) => err.kind(),
            Self::Transaction(err) => err.kind(),
        }
    }
}
