//! SDK error types.
//!
//! Errors come in two tiers. Validation errors are raised while a transaction is being assembled
//! and never reach the ledger. Execution errors are Move aborts reported after submission, mapped
//! back onto the same [`FailureKind`] labels by [`abort::lookup`]. Transport failures are kept
//! apart from both, since they are the only ones worth retrying.
use core::fmt;
use thiserror::Error;

pub mod abort;
pub use abort::MoveAbort;

mod escrow;
pub use escrow::EscrowError;

mod object;
pub use object::ObjectDecodeError;

mod submit;
pub use submit::SubmitError;

mod trade;
pub use trade::{SettlementError, SplitError, SwapError};

mod transaction;
pub use transaction::TransactionError;

mod wrapper;
pub use wrapper::WrapperError;

pub use crate::storage::StorageError;

/// The operation an error was raised by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Starting a split.
    SplitBegin,
    /// Allocating one outcome of a split.
    SplitStep,
    /// Closing a split.
    SplitFinish,
    /// Moving a balance into a swap batch.
    BatchDeposit,
    /// Swapping inside a batch.
    Swap,
    /// Settling a batch.
    Finalize,
    /// Decoding or encoding a balance wrapper.
    WrapperCodec,
    /// Reading or mutating a balance wrapper.
    Wrapper,
    /// Creating an escrow.
    EscrowCreate,
    /// Withdrawing from an escrow.
    EscrowWithdraw,
    /// Destroying an escrow.
    EscrowDestroy,
    /// Building the transaction.
    Assemble,
    /// Decoding a ledger object.
    ObjectDecode,
    /// Submitting the transaction.
    Submit,
    /// Reading or writing the local object index.
    Storage,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SplitBegin => "split.begin",
            Self::SplitStep => "split.step",
            Self::SplitFinish => "split.finish",
            Self::BatchDeposit => "batch.deposit",
            Self::Swap => "batch.swap",
            Self::Finalize => "batch.finalize",
            Self::WrapperCodec => "wrapper.codec",
            Self::Wrapper => "wrapper",
            Self::EscrowCreate => "escrow.create",
            Self::EscrowWithdraw => "escrow.withdraw",
            Self::EscrowDestroy => "escrow.destroy",
            Self::Assemble => "transaction.assemble",
            Self::ObjectDecode => "object.decode",
            Self::Submit => "submit",
            Self::Storage => "storage",
        };
        f.write_str(name)
    }
}

/// Taxonomy label shared by client-side validation and decoded on-chain aborts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// An amount that must be positive was zero.
    ZeroAmount,
    /// Split steps were not strictly increasing and gap-free.
    OutOfOrderOutcome,
    /// An outcome index was past the outcome count.
    OutcomeOutOfBounds,
    /// A split was closed with value left unallocated.
    IncompleteSplit,
    /// A split step asked for more than what remains.
    AllocationExceedsRemaining,
    /// A swap would return less than its minimum.
    InsufficientOutput,
    /// A balance was too small for the requested debit.
    InsufficientBalance,
    /// Two objects refer to different markets.
    MarketMismatch,
    /// A balance wrapper had an inconsistent layout.
    MalformedWrapper,
    /// A balance would overflow `u64`.
    Overflow,
    /// The proposal is not finalized yet.
    NotFinalized,
    /// The escrowed outcome did not win.
    OutcomeDidNotWin,
    /// An object still holds value and cannot be destroyed.
    NotEmpty,
    /// An object was used after it was destroyed.
    Destroyed,
    /// A receipt does not belong to the escrow it was presented to.
    ReceiptMismatch,
    /// A linear resource was left open in the transaction.
    UnconsumedResource,
    /// A value could not be encoded or decoded.
    Encoding,
    /// A ledger object did not have the expected shape.
    ObjectShape,
    /// A local index constraint was violated.
    Conflict,
    /// The node refused the request before executing it.
    Rejected,
    /// The ledger could not be reached.
    Transport,
    /// The ledger did not answer in time.
    Timeout,
    /// The transaction aborted with a code this SDK does not know.
    UnknownAbort,
    /// Anything else.
    Internal,
}

impl FailureKind {
    /// Whether resubmitting the entire transaction may succeed.
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::Transport | Self::Timeout)
    }
}

/// The overarching error type.
#[derive(Debug, Error)]
pub enum FutarchyError {
    /// Splitter errors.
    #[error(transparent)]
    Split(#[from] SplitError),
    /// Sequencer errors.
    #[error(transparent)]
    Swap(#[from] SwapError),
    /// Finalizer errors.
    #[error(transparent)]
    Settlement(#[from] SettlementError),
    /// Balance wrapper errors.
    #[error(transparent)]
    Wrapper(#[from] WrapperError),
    /// Escrow errors.
    #[error(transparent)]
    Escrow(#[from] EscrowError),
    /// Transaction assembly errors.
    #[error(transparent)]
    Transaction(#[from] TransactionError),
    /// Ledger object decoding errors.
    #[error(transparent)]
    Object(#[from] ObjectDecodeError),
    /// Submission errors.
    #[error(transparent)]
    Submit(#[from] SubmitError),
    /// Local object index errors.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl FutarchyError {
    /// The operation that failed.
    pub fn operation(&self) -> Operation {
        match self {
            Self::Split(err) => err.operation(),
            Self::Swap(err) => err.operation(),
            Self::Settlement(_) => Operation::Finalize,
            Self::Wrapper(err) => err.operation(),
            Self::Escrow(err) => err.operation(),
            Self::Transaction(_) => Operation::Assemble,
            Self::Object(_) => Operation::ObjectDecode,
            Self::Submit(_) => Operation::Submit,
            Self::Storage(_) => Operation::Storage,
        }
    }

    /// The taxonomy label.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Split(err) => err.kind(),
            Self::Swap(err) => err.kind(),
            Self::Settlement(err) => err.kind(),
            Self::Wrapper(err) => err.kind(),
            Self::Escrow(err) => err.kind(),
            Self::Transaction(err) => err.kind(),
            Self::Object(err) => err.kind(),
            Self::Submit(err) => err.kind(),
            Self::Storage(err) => err.kind(),
        }
    }

    /// Whether resubmitting the entire transaction may succeed.
    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }
}

/// Type alias for `Result<T, FutarchyError>`.
pub type Result<T, E = FutarchyError> = core::result::Result<T, E>;
