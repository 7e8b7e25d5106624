use super::{FailureKind, MoveAbort, TransactionError};
use jsonrpsee::core::ClientError;
use std::time::Duration;
use thiserror::Error;

/// Errors returned when submitting a transaction or querying the ledger.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// The ledger could not be reached.
    #[error("transport error: {0}")]
    Transport(ClientError),
    /// The request did not complete in time.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    /// The node answered with a JSON-RPC error, e.g. a failed signature or input check.
    #[error("request rejected with code {code}: {message}")]
    Rejected {
        /// The JSON-RPC error code.
        code: i32,
        /// The error message.
        message: String,
    },
    /// The node's response could not be parsed.
    #[error("invalid response: {0}")]
    InvalidResponse(#[source] serde_json::Error),
    /// The RPC client failed for a reason unrelated to the network.
    #[error("rpc client error: {0}")]
    Client(ClientError),
    /// The transaction executed and aborted. Nothing was committed.
    #[error("transaction {digest} aborted: {abort}")]
    Aborted {
        /// The transaction digest.
        digest: String,
        /// The decoded abort.
        abort: MoveAbort,
    },
    /// The transaction failed for a reason other than a Move abort (e.g. out of gas).
    #[error("transaction {digest} failed: {reason}")]
    Failed {
        /// The transaction digest.
        digest: String,
        /// The status reported by the ledger.
        reason: String,
    },
    /// The transaction could not be encoded.
    #[error(transparent)]
    Transaction(#[from] TransactionError),
}

impl From<ClientError> for SubmitError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Call(call) => {
                Self::Rejected { code: call.code(), message: call.message().to_string() }
            }
            ClientError::ParseError(source) => Self::InvalidResponse(source),
            err @ (ClientError::Transport(_)
            | ClientError::RestartNeeded(_)
            | ClientError::RequestTimeout) => Self::Transport(err),
            other => Self::Client(other),
        }
    }
}

impl SubmitError {
    /// The taxonomy label.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Transport(_) => FailureKind::Transport,
            Self::Timeout(_) => FailureKind::Timeout,
            Self::Rejected { .. } => FailureKind::Rejected,
            Self::InvalidResponse(_) => FailureKind::Encoding,
            Self::Client(_) | Self::Failed { .. } => FailureKind::Internal,
            Self::Aborted { abort, .. } => abort.kind().unwrap_or(FailureKind::UnknownAbort),
            Self::Transaction(err) => err.kind(),
        }
    }

    /// Whether resubmitting the whole transaction may succeed.
    ///
    /// Only transport failures and timeouts qualify. An aborted or rejected transaction left no
    /// state behind, but resubmitting it unchanged fails again.
    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }
}
