//! # Ledger RPC
//!
//! Client side of the ledger's `sui_` JSON-RPC namespace, restricted to what the SDK uses:
//!
//! - `sui_getObject` to read proposals, markets, wrappers and escrows.
//! - `sui_dryRunTransactionBlock` to check an assembled transaction without committing it.
//! - `sui_executeTransactionBlock` to submit a signed transaction.

use crate::types::{ObjectDataOptions, ObjectId, ObjectResponse};
use jsonrpsee::{core::RpcResult, proc_macros::rpc};
use serde::{Deserialize, Serialize};

/// The `sui_` RPC namespace.
#[rpc(client, namespace = "sui")]
pub trait LedgerApi {
    /// Returns one object.
    #[method(name = "getObject")]
    async fn get_object(
        &self,
        object_id: ObjectId,
        options: ObjectDataOptions,
    ) -> RpcResult<ObjectResponse>;

    /// Executes a transaction without committing it.
    #[method(name = "dryRunTransactionBlock")]
    async fn dry_run_transaction_block(
        &self,
        tx_bytes: String,
    ) -> RpcResult<DryRunTransactionBlockResponse>;

    /// Submits a signed transaction.
    #[method(name = "executeTransactionBlock")]
    async fn execute_transaction_block(
        &self,
        tx_bytes: String,
        signatures: Vec<String>,
        options: TransactionBlockResponseOptions,
        request_type: Option<ExecuteRequestType>,
    ) -> RpcResult<TransactionBlockResponse>;
}

/// What to include in a transaction response.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionBlockResponseOptions {
    /// Include the execution effects.
    pub show_effects: bool,
    /// Include emitted events.
    pub show_events: bool,
    /// Include object changes.
    pub show_object_changes: bool,
}

impl TransactionBlockResponseOptions {
    /// Effects only.
    pub const fn effects() -> Self {
        Self { show_effects: true, show_events: false, show_object_changes: false }
    }
}

/// When `executeTransactionBlock` returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecuteRequestType {
    /// Once the transaction is certified and effects are final.
    WaitForEffectsCert,
    /// Once the node executed the transaction locally.
    WaitForLocalExecution,
}

/// Response of `executeTransactionBlock`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionBlockResponse {
    /// The transaction digest.
    pub digest: String,
    /// Execution effects, if requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effects: Option<TransactionEffects>,
}

/// Response of `dryRunTransactionBlock`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DryRunTransactionBlockResponse {
    /// Execution effects.
    pub effects: TransactionEffects,
}

/// The subset of transaction effects the SDK reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionEffects {
    /// Whether execution succeeded.
    pub status: ExecutionStatus,
    /// The transaction digest.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_digest: Option<String>,
}

/// Execution status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ExecutionStatus {
    /// The transaction executed and committed.
    Success,
    /// The transaction failed. Nothing was committed apart from gas.
    Failure {
        /// Error string, e.g. a `MoveAbort(...)` description.
        error: String,
    },
}
