//! Object index implementation in-memory.

use super::{StorageApi, StorageError, api::Result};
use crate::types::{Address, EscrowReceiptRecord, ObjectId, WrapperObject};
use async_trait::async_trait;
use dashmap::{DashMap, mapref::entry::Entry};
use tracing::debug;

/// [`StorageApi`] implementation in-memory.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    receipts: DashMap<(ObjectId, u8), EscrowReceiptRecord>,
    wrappers: DashMap<(Address, ObjectId), Vec<WrapperObject>>,
}

#[async_trait]
impl StorageApi for InMemoryStorage {
    async fn write_receipt(&self, record: &EscrowReceiptRecord) -> Result<()> {
        match self.receipts.entry(record.key()) {
            Entry::Occupied(entry) if entry.get().object.id != record.object.id => {
                Err(StorageError::ReceiptExists {
                    proposal_id: record.proposal_id,
                    outcome: record.outcome,
                })
            }
            Entry::Occupied(mut entry) => {
                entry.insert(record.clone());
                Ok(())
            }
            Entry::Vacant(entry) => {
                entry.insert(record.clone());
                Ok(())
            }
        }
    }

    async fn read_receipt(
        &self,
        proposal_id: ObjectId,
        outcome: u8,
    ) -> Result<Option<EscrowReceiptRecord>> {
        Ok(self.receipts.get(&(proposal_id, outcome)).map(|r| r.value().clone()))
    }

    async fn read_receipts(&self, proposal_id: ObjectId) -> Result<Vec<EscrowReceiptRecord>> {
        let mut receipts: Vec<_> = self
            .receipts
            .iter()
            .filter(|entry| entry.key().0 == proposal_id)
            .map(|entry| entry.value().clone())
            .collect();
        receipts.sort_by_key(|record| record.outcome);
        Ok(receipts)
    }

    async fn remove_receipt(
        &self,
        proposal_id: ObjectId,
        outcome: u8,
    ) -> Result<Option<EscrowReceiptRecord>> {
        Ok(self.receipts.remove(&(proposal_id, outcome)).map(|(_, record)| record))
    }

    async fn write_wrapper(&self, owner: Address, wrapper: WrapperObject) -> Result<()> {
        let mut indexed = self.wrappers.entry((owner, wrapper.wrapper.market_id())).or_default();
        if let Some(other) = indexed.iter().find(|other| other.object.id != wrapper.object.id) {
            // Layout check only, the merged value is not stored.
            other.wrapper.clone().merge(&wrapper.wrapper)?;
        }
        match indexed.iter_mut().find(|other| other.object.id == wrapper.object.id) {
            Some(stored) => *stored = wrapper,
            None => {
                debug!(%owner, object = %wrapper.object.id, "indexed balance wrapper");
                indexed.push(wrapper);
                indexed.sort_by_key(|object| object.object.id);
            }
        }
        Ok(())
    }

    async fn read_wrappers(
        &self,
        owner: Address,
        market_id: ObjectId,
    ) -> Result<Vec<WrapperObject>> {
        Ok(self.wrappers.get(&(owner, market_id)).map(|w| w.value().clone()).unwrap_or_default())
    }

    async fn remove_wrapper(
        &self,
        owner: Address,
        market_id: ObjectId,
        object_id: ObjectId,
    ) -> Result<Option<WrapperObject>> {
        let Entry::Occupied(mut entry) = self.wrappers.entry((owner, market_id)) else {
            return Ok(None);
        };
        let position = entry.get().iter().position(|object| object.object.id == object_id);
        let removed = position.map(|index| entry.get_mut().remove(index));
        if entry.get().is_empty() {
            entry.remove();
        }
        Ok(removed)
    }
}
