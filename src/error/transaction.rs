use super::FailureKind;
use crate::transaction::LinearKind;
use thiserror::Error;

/// Errors raised while assembling a transaction.
#[derive(Debug, Error)]
pub enum TransactionError {
    /// A pure argument could not be BCS-encoded.
    #[error("failed to encode argument: {0}")]
    Encoding(#[from] bcs::Error),
    /// A linear resource was begun and never closed.
    #[error("{kind} opened by command {opened_at} was never consumed")]
    UnconsumedResource {
        /// The kind of resource.
        kind: LinearKind,
        /// Index of the command that created it.
        opened_at: u16,
    },
    /// A type argument is not a valid Move type.
    #[error("invalid type argument {type_tag:?}: {reason}")]
    InvalidTypeTag {
        /// The type as written.
        type_tag: String,
        /// Why it was rejected.
        reason: String,
    },
    /// The transaction has too many inputs or commands.
    #[error("transaction exceeds {limit} {what}")]
    LimitExceeded {
        /// What overflowed.
        what: &'static str,
        /// The limit.
        limit: usize,
    },
}

impl TransactionError {
    /// The taxonomy label.
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::Encoding(_) | Self::InvalidTypeTag { .. } | Self::LimitExceeded { .. } => {
                FailureKind::Encoding
            }
            Self::UnconsumedResource { .. } => FailureKind::UnconsumedResource,
        }
    }
}
