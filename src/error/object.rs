use super::{FailureKind, WrapperError};
use crate::types::ObjectId;
use thiserror::Error;

/// Errors raised while decoding ledger query results into typed objects.
#[derive(Debug, Error)]
pub enum ObjectDecodeError {
    /// The ledger returned no object for the id.
    #[error("object {object_id} not found")]
    NotFound {
        /// The requested object.
        object_id: ObjectId,
    },
    /// The object has no Move content (e.g. a package).
    #[error("object {object_id} has no move content")]
    MissingContent {
        /// The object.
        object_id: ObjectId,
    },
    /// The Move type is not the one the caller asked for.
    #[error("object {object_id} has type {got}, expected {expected}")]
    UnexpectedType {
        /// The object.
        object_id: ObjectId,
        /// The expected type.
        expected: &'static str,
        /// The type found.
        got: String,
    },
    /// A required field is absent.
    #[error("object {object_id} is missing field `{field}`")]
    MissingField {
        /// The object.
        object_id: ObjectId,
        /// The field name.
        field: &'static str,
    },
    /// A field has the wrong shape.
    #[error("object {object_id} field `{field}` is invalid: {reason}")]
    InvalidField {
        /// The object.
        object_id: ObjectId,
        /// The field name.
        field: &'static str,
        /// What was wrong.
        reason: String,
    },
    /// A balance wrapper object failed layout validation.
    #[error("object {object_id}: {source}")]
    Wrapper {
        /// The object.
        object_id: ObjectId,
        /// The validation failure.
        source: WrapperError,
    },
}

impl ObjectDecodeError {
    /// The taxonomy label.
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::Wrapper { source, .. } => source.kind(),
            _ => FailureKind::ObjectShape,
        }
    }
}
