use super::{FailureKind, Operation};
use crate::types::{Leg, ObjectId};
use thiserror::Error;

/// Errors related to balance wrappers and the dense outcome ledger.
#[derive(Debug, Error)]
pub enum WrapperError {
    /// The balance vector does not hold exactly two entries per outcome.
    #[error("malformed balance wrapper: {length} entries for {outcome_count} outcomes")]
    MalformedWrapper {
        /// The declared outcome count.
        outcome_count: u64,
        /// The actual vector length.
        length: usize,
    },
    /// The wrapper was written by a newer format.
    #[error("unsupported balance wrapper version {version}")]
    UnsupportedVersion {
        /// The version found.
        version: u64,
    },
    /// The outcome index is past the wrapper's outcome count.
    #[error("outcome {outcome} is out of bounds for {outcome_count} outcomes")]
    OutcomeOutOfBounds {
        /// The requested outcome.
        outcome: u8,
        /// Number of outcomes covered.
        outcome_count: usize,
    },
    /// Wrappers of different markets cannot be combined.
    #[error("wrapper belongs to market {got}, expected {expected}")]
    MarketMismatch {
        /// The market expected.
        expected: ObjectId,
        /// The wrapper's market.
        got: ObjectId,
    },
    /// A withdrawal asked for more than the entry holds.
    #[error("outcome {outcome} holds {available} {leg:?}, requested {requested}")]
    InsufficientBalance {
        /// The outcome.
        outcome: u8,
        /// The leg.
        leg: Leg,
        /// The amount held.
        available: u64,
        /// The amount requested.
        requested: u64,
    },
    /// An entry would overflow.
    #[error("balance overflow for outcome {outcome} {leg:?}")]
    Overflow {
        /// The outcome.
        outcome: u8,
        /// The leg.
        leg: Leg,
    },
    /// A wrapper that still holds balances cannot be destroyed.
    #[error("balance wrapper for market {market_id} is not empty")]
    NotEmpty {
        /// The wrapper's market.
        market_id: ObjectId,
    },
    /// An empty wrapper list was given where at least one is needed.
    #[error("no balance wrappers to merge")]
    NoWrappers,
    /// BCS decoding failed.
    #[error("wrapper encoding: {0}")]
    Encoding(#[from] bcs::Error),
}

impl WrapperError {
    /// The operation that failed.
    pub const fn operation(&self) -> Operation {
        match self {
            Self::MalformedWrapper { .. } | Self::UnsupportedVersion { .. } | Self::Encoding(_) => {
                Operation::WrapperCodec
            }
            _ => Operation::Wrapper,
        }
    }

    /// The taxonomy label.
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::MalformedWrapper { .. } | Self::UnsupportedVersion { .. } => {
                FailureKind::MalformedWrapper
            }
            Self::OutcomeOutOfBounds { .. } => FailureKind::OutcomeOutOfBounds,
            Self::MarketMismatch { .. } | Self::NoWrappers => FailureKind::MarketMismatch,
            Self::InsufficientBalance { .. } => FailureKind::InsufficientBalance,
            Self::Overflow { .. } => FailureKind::Overflow,
            Self::NotEmpty { .. } => FailureKind::NotEmpty,
            Self::Encoding(_) => FailureKind::Encoding,
        }
    }
}
