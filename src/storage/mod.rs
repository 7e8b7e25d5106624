//! Client-side index of escrow receipts and balance wrappers.

mod api;
pub use api::StorageApi;
mod error;
pub use error::StorageError;
mod memory;

use crate::types::{Address, EscrowReceiptRecord, ObjectId, OutcomeTotals, WrapperObject};
use async_trait::async_trait;
use std::sync::Arc;

/// Object index handle.
#[derive(Debug, Clone)]
pub struct Storage {
    inner: Arc<dyn StorageApi>,
}

impl Storage {
    /// Create [`Storage`] with an in-memory backend.
    pub fn in_memory() -> Self {
        Self { inner: Arc::new(memory::InMemoryStorage::default()) }
    }

    /// Create [`Storage`] over a custom backend.
    pub fn new(inner: Arc<dyn StorageApi>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl StorageApi for Storage {
    async fn write_receipt(&self, record: &EscrowReceiptRecord) -> api::Result<()> {
        self.inner.write_receipt(record).await
    }

    async fn read_receipt(
        &self,
        proposal_id: ObjectId,
        outcome: u8,
    ) -> api::Result<Option<EscrowReceiptRecord>> {
        self.inner.read_receipt(proposal_id, outcome).await
    }

    async fn read_receipts(&self, proposal_id: ObjectId) -> api::Result<Vec<EscrowReceiptRecord>> {
        self.inner.read_receipts(proposal_id).await
    }

    async fn remove_receipt(
        &self,
        proposal_id: ObjectId,
        outcome: u8,
    ) -> api::Result<Option<EscrowReceiptRecord>> {
        self.inner.remove_receipt(proposal_id, outcome).await
    }

    async fn write_wrapper(&self, owner: Address, wrapper: WrapperObject) -> api::Result<()> {
        self.inner.write_wrapper(owner, wrapper).await
    }

    async fn read_wrappers(
        &self,
        owner: Address,
        market_id: ObjectId,
    ) -> api::Result<Vec<WrapperObject>> {
        self.inner.read_wrappers(owner, market_id).await
    }

    async fn remove_wrapper(
        &self,
        owner: Address,
        market_id: ObjectId,
        object_id: ObjectId,
    ) -> api::Result<Option<WrapperObject>> {
        self.inner.remove_wrapper(owner, market_id, object_id).await
    }

    async fn wrapper_totals(
        &self,
        owner: Address,
        market_id: ObjectId,
    ) -> api::Result<Option<OutcomeTotals>> {
        self.inner.wrapper_totals(owner, market_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::FailureKind,
        types::{BalanceWrapper, ObjectDigest, ObjectRef, OutcomeBalances},
    };

    fn object(byte: u8) -> ObjectRef {
        ObjectRef {
            id: ObjectId::with_last_byte(byte),
            version: 1,
            digest: ObjectDigest::default(),
        }
    }

    fn receipt(byte: u8, outcome: u8) -> EscrowReceiptRecord {
        EscrowReceiptRecord {
            object: object(byte),
            escrow_id: ObjectId::with_last_byte(0x20),
            proposal_id: ObjectId::with_last_byte(1),
            outcome,
            depositor: Address::with_last_byte(7),
        }
    }

    fn wrapper(byte: u8, balances: Vec<u64>) -> WrapperObject {
        let balances = OutcomeBalances::from_dense(balances.len() as u64 / 2, balances).unwrap();
        WrapperObject {
            object: object(byte),
            wrapper: BalanceWrapper::from_balances(ObjectId::with_last_byte(2), balances),
        }
    }

    #[tokio::test]
    async fn one_live_receipt_per_outcome() {
        let storage = Storage::in_memory();
        storage.write_receipt(&receipt(0x10, 1)).await.unwrap();
        storage.write_receipt(&receipt(0x11, 0)).await.unwrap();
        // Rewriting the same receipt object is an update.
        storage.write_receipt(&receipt(0x10, 1)).await.unwrap();

        let err = storage.write_receipt(&receipt(0x12, 1)).await.unwrap_err();
        assert!(matches!(err, StorageError::ReceiptExists { outcome: 1, .. }));
        assert_eq!(err.kind(), FailureKind::Conflict);

        let proposal_id = ObjectId::with_last_byte(1);
        let all = storage.read_receipts(proposal_id).await.unwrap();
        assert_eq!(all.iter().map(|r| r.outcome).collect::<Vec<_>>(), vec![0, 1]);

        let removed = storage.remove_receipt(proposal_id, 1).await.unwrap().unwrap();
        assert_eq!(removed.object.id, ObjectId::with_last_byte(0x10));
        storage.write_receipt(&receipt(0x12, 1)).await.unwrap();
        let live = storage.read_receipt(proposal_id, 1).await.unwrap().unwrap();
        assert_eq!(live.object.id, ObjectId::with_last_byte(0x12));
    }

    #[tokio::test]
    async fn every_wrapper_object_stays_indexed() {
        let storage = Storage::in_memory();
        let owner = Address::with_last_byte(7);
        let market_id = ObjectId::with_last_byte(2);
        storage.write_wrapper(owner, wrapper(0x31, vec![50, 0, 1, 0])).await.unwrap();
        storage.write_wrapper(owner, wrapper(0x30, vec![100, 0, 0, 5])).await.unwrap();

        let indexed = storage.read_wrappers(owner, market_id).await.unwrap();
        assert_eq!(
            indexed.iter().map(|w| w.object.id).collect::<Vec<_>>(),
            vec![ObjectId::with_last_byte(0x30), ObjectId::with_last_byte(0x31)]
        );
        assert_eq!(indexed[1].wrapper.balances().as_slice(), &[50, 0, 1, 0]);

        let totals = storage.wrapper_totals(owner, market_id).await.unwrap().unwrap();
        assert_eq!(totals.balances.as_slice(), &[150, 0, 1, 5]);

        // Writing an indexed object again replaces rather than double counts.
        storage.write_wrapper(owner, wrapper(0x30, vec![1, 1, 1, 1])).await.unwrap();
        let totals = storage.wrapper_totals(owner, market_id).await.unwrap().unwrap();
        assert_eq!(totals.balances.as_slice(), &[51, 1, 2, 1]);

        assert!(storage.read_wrappers(Address::ZERO, market_id).await.unwrap().is_empty());
        assert!(storage.wrapper_totals(Address::ZERO, market_id).await.unwrap().is_none());

        let removed = storage
            .remove_wrapper(owner, market_id, ObjectId::with_last_byte(0x31))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(removed.object.id, ObjectId::with_last_byte(0x31));
        let totals = storage.wrapper_totals(owner, market_id).await.unwrap().unwrap();
        assert_eq!(totals.balances.as_slice(), &[1, 1, 1, 1]);

        let missing = ObjectId::with_last_byte(0x31);
        assert!(storage.remove_wrapper(owner, market_id, missing).await.unwrap().is_none());
        let last = ObjectId::with_last_byte(0x30);
        assert!(storage.remove_wrapper(owner, market_id, last).await.unwrap().is_some());
        assert!(storage.read_wrappers(owner, market_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn mismatched_layouts_are_not_indexed() {
        let storage = Storage::in_memory();
        let owner = Address::with_last_byte(7);
        storage.write_wrapper(owner, wrapper(0x30, vec![1, 0, 0, 0])).await.unwrap();
        let err =
            storage.write_wrapper(owner, wrapper(0x31, vec![1, 0, 0, 0, 0, 0])).await.unwrap_err();
        assert!(matches!(err, StorageError::Wrapper(_)));

        let market_id = ObjectId::with_last_byte(2);
        let indexed = storage.read_wrappers(owner, market_id).await.unwrap();
        assert_eq!(indexed.len(), 1);
        assert_eq!(indexed[0].wrapper.balances().as_slice(), &[1, 0, 0, 0]);
    }
}
