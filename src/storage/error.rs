use crate::{
    error::{FailureKind, WrapperError},
    types::ObjectId,
};

/// Errors returned by [`StorageApi`](super::StorageApi).
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A live receipt is already indexed for the key.
    #[error("a receipt for outcome {outcome} of proposal {proposal_id} already exists")]
    ReceiptExists {
        /// The proposal.
        proposal_id: ObjectId,
        /// The outcome.
        outcome: u8,
    },
    /// Two wrappers for the same key could not be merged.
    #[error(transparent)]
    Wrapper(#[from] WrapperError),
}

impl StorageError {
    /// The taxonomy label.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::ReceiptExists { .. } => FailureKind::Conflict,
            Self::Wrapper(err) => err.kind(),
        }
    }
}
