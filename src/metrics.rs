//! Metrics recorded by the SDK.
//!
//! The SDK only records. Installing a recorder (e.g. a Prometheus exporter) is up to the
//! application.

use crate::{error::FailureKind, orchestrator::Remainder};
use metrics::{Counter, Histogram};
use metrics_derive::Metrics;
use std::time::Duration;

/// Counters for assembled trades.
#[derive(Metrics, Clone)]
#[metrics(scope = "futarchy")]
pub struct OrchestratorMetrics {
    /// Number of splits assembled.
    pub splits: Counter,
    /// Number of swaps accepted into a batch.
    pub swaps: Counter,
    /// Number of swaps rejected before reaching the ledger.
    pub rejected_swaps: Counter,
    /// Number of batches settled.
    pub settlements: Counter,
    /// Number of settlements that minted a new balance wrapper.
    pub wrappers_created: Counter,
    /// Number of settlements that merged into an existing balance wrapper.
    pub wrappers_merged: Counter,
}

impl OrchestratorMetrics {
    /// Records a settlement and what happened to its remainder.
    pub fn record_settlement(&self, remainder: &Remainder) {
        self.settlements.increment(1);
        match remainder {
            Remainder::Created(_) => self.wrappers_created.increment(1),
            Remainder::Merged(_) => self.wrappers_merged.increment(1),
            Remainder::Empty => {}
        }
    }
}

/// Counters for transaction submission.
#[derive(Metrics, Clone)]
#[metrics(scope = "futarchy.submit")]
pub struct SubmissionMetrics {
    /// Number of submitted transactions.
    pub submitted: Counter,
    /// Number of transactions that executed successfully.
    pub succeeded: Counter,
    /// Number of transactions that aborted on the ledger.
    pub aborted: Counter,
    /// Number of submissions that failed in transport or timed out.
    pub retryable: Counter,
}

/// Per-method metrics for ledger RPC calls.
#[derive(Metrics, Clone)]
#[metrics(scope = "futarchy.rpc")]
struct LedgerMethodMetrics {
    /// The number of calls to the method.
    count: Counter,
    /// Time spent in the call, in milliseconds.
    latency: Histogram,
}

/// Records one ledger RPC call, labelled by method and outcome.
pub(crate) fn record_rpc_call(
    method: &'static str,
    elapsed: Duration,
    failure: Option<FailureKind>,
) {
    let outcome = failure.map(|kind| format!("{kind:?}")).unwrap_or_else(|| "ok".to_string());
    let metrics = LedgerMethodMetrics::new_with_labels(&[
        ("method", method.to_string()),
        ("outcome", outcome),
    ]);
    metrics.count.increment(1);
    metrics.latency.record(elapsed.as_secs_f64() * 1000.0);
}
