//! Object index api.

use super::StorageError;
use crate::types::{
    Address, EscrowReceiptRecord, ObjectId, OutcomeTotals, WrapperObject, merge_across_wrappers,
};
use async_trait::async_trait;
use std::fmt::Debug;

/// Type alias for `Result<T, StorageError>`
pub type Result<T> = core::result::Result<T, StorageError>;

/// Storage API.
#[async_trait]
pub trait StorageApi: Debug + Send + Sync {
    /// Indexes an escrow receipt under `(proposal, outcome)`.
    ///
    /// Fails with [`StorageError::ReceiptExists`] if another receipt is live for the key.
    /// Writing the same receipt object again replaces it.
    async fn write_receipt(&self, record: &EscrowReceiptRecord) -> Result<()>;

    /// Reads the live receipt for `(proposal, outcome)`.
    async fn read_receipt(
        &self,
        proposal_id: ObjectId,
        outcome: u8,
    ) -> Result<Option<EscrowReceiptRecord>>;

    /// Reads every live receipt for a proposal, ordered by outcome.
    async fn read_receipts(&self, proposal_id: ObjectId) -> Result<Vec<EscrowReceiptRecord>>;

    /// Removes the receipt for `(proposal, outcome)`, e.g. after a full withdrawal.
    async fn remove_receipt(
        &self,
        proposal_id: ObjectId,
        outcome: u8,
    ) -> Result<Option<EscrowReceiptRecord>>;

    /// Indexes a balance wrapper owned by `owner`.
    ///
    /// Every wrapper object of a `(owner, market)` pair stays indexed under its own id. Writing an
    /// indexed object again replaces it. Fails with [`StorageError::Wrapper`] if the wrapper does
    /// not share the layout of those already indexed for the market.
    async fn write_wrapper(&self, owner: Address, wrapper: WrapperObject) -> Result<()>;

    /// Reads every wrapper `owner` holds for `market_id`, ordered by object id.
    async fn read_wrappers(&self, owner: Address, market_id: ObjectId)
    -> Result<Vec<WrapperObject>>;

    /// Removes one wrapper object `owner` holds for `market_id`.
    async fn remove_wrapper(
        &self,
        owner: Address,
        market_id: ObjectId,
        object_id: ObjectId,
    ) -> Result<Option<WrapperObject>>;

    /// Per-outcome totals across every wrapper `owner` holds for `market_id`.
    async fn wrapper_totals(
        &self,
        owner: Address,
        market_id: ObjectId,
    ) -> Result<Option<OutcomeTotals>> {
        let wrappers: Vec<_> = self
            .read_wrappers(owner, market_id)
            .await?
            .into_iter()
            .map(|object| object.wrapper)
            .collect();
        if wrappers.is_empty() {
            return Ok(None);
        }
        Ok(Some(merge_across_wrappers(&wrappers)?))
    }
}
