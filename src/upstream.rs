//! Ledger access: typed object loading and transaction submission.

use crate::{
    config::SdkConfig,
    error::{FutarchyError, MoveAbort, SubmitError},
    metrics::{SubmissionMetrics, record_rpc_call},
    rpc::{
        DryRunTransactionBlockResponse, ExecuteRequestType, ExecutionStatus, LedgerApiClient,
        TransactionBlockResponse, TransactionBlockResponseOptions,
    },
    transaction::{SignedTransaction, TransactionData},
    types::{
        Escrow, EscrowReceiptRecord, LedgerObject, MarketRef, ObjectData, ObjectDataOptions,
        ObjectId, ObjectResponse, ProposalObject, WrapperObject,
    },
};
use async_trait::async_trait;
use jsonrpsee::{
    core::ClientError,
    http_client::{HttpClient, HttpClientBuilder},
};
use std::{
    future::Future,
    time::{Duration, Instant},
};
use tracing::{debug, info, instrument, warn};

/// The ledger calls [`Upstream`] depends on.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Returns one object.
    async fn get_object(
        &self,
        object_id: ObjectId,
        options: ObjectDataOptions,
    ) -> Result<ObjectResponse, ClientError>;

    /// Executes a transaction without committing it.
    async fn dry_run(&self, tx_bytes: String)
    -> Result<DryRunTransactionBlockResponse, ClientError>;

    /// Submits a signed transaction and waits for its effects.
    async fn execute(
        &self,
        transaction: SignedTransaction,
    ) -> Result<TransactionBlockResponse, ClientError>;
}

#[async_trait]
impl LedgerClient for HttpClient {
    async fn get_object(
        &self,
        object_id: ObjectId,
        options: ObjectDataOptions,
    ) -> Result<ObjectResponse, ClientError> {
        LedgerApiClient::get_object(self, object_id, options).await
    }

    async fn dry_run(
        &self,
        tx_bytes: String,
    ) -> Result<DryRunTransactionBlockResponse, ClientError> {
        LedgerApiClient::dry_run_transaction_block(self, tx_bytes).await
    }

    async fn execute(
        &self,
        transaction: SignedTransaction,
    ) -> Result<TransactionBlockResponse, ClientError> {
        LedgerApiClient::execute_transaction_block(
            self,
            transaction.tx_bytes,
            transaction.signatures,
            TransactionBlockResponseOptions::effects(),
            Some(ExecuteRequestType::WaitForLocalExecution),
        )
        .await
    }
}

/// A wrapper around a [`LedgerClient`] that decodes objects and classifies submission failures.
#[derive(Debug, Clone)]
pub struct Upstream<C> {
    client: C,
    timeout: Duration,
    metrics: SubmissionMetrics,
}

impl<C> Upstream<C> {
    /// Create a new [`Upstream`]
    pub fn new(client: C, timeout: Duration) -> Self {
        Self { client, timeout, metrics: SubmissionMetrics::default() }
    }

    /// The underlying client.
    pub const fn client(&self) -> &C {
        &self.client
    }
}

impl Upstream<HttpClient> {
    /// Connects to the endpoint in `config`.
    pub fn connect(config: &SdkConfig) -> eyre::Result<Self> {
        let client = HttpClientBuilder::default()
            .request_timeout(config.rpc.request_timeout)
            .build(config.rpc.url.as_str())?;
        Ok(Self::new(client, config.rpc.request_timeout))
    }
}

impl<C: LedgerClient> Upstream<C> {
    async fn call<T>(
        &self,
        method: &'static str,
        request: impl Future<Output = Result<T, ClientError>>,
    ) -> Result<T, SubmitError> {
        let started = Instant::now();
        let result = match tokio::time::timeout(self.timeout, request).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(err.into()),
            Err(_) => Err(SubmitError::Timeout(self.timeout)),
        };
        record_rpc_call(method, started.elapsed(), result.as_ref().err().map(SubmitError::kind));
        result
    }

    /// Loads the raw data of one object.
    #[instrument(skip(self))]
    pub async fn load_object(&self, object_id: ObjectId) -> Result<ObjectData, FutarchyError> {
        let response = self
            .call("sui_getObject", self.client.get_object(object_id, ObjectDataOptions::default()))
            .await?;
        Ok(response.into_data(object_id)?)
    }

    /// Loads and decodes one object, whatever its type.
    pub async fn load(&self, object_id: ObjectId) -> Result<LedgerObject, FutarchyError> {
        Ok(LedgerObject::decode(&self.load_object(object_id).await?)?)
    }

    /// Loads a proposal.
    pub async fn load_proposal(
        &self,
        object_id: ObjectId,
    ) -> Result<ProposalObject, FutarchyError> {
        Ok(ProposalObject::decode(&self.load_object(object_id).await?)?)
    }

    /// Loads a proposal and its market escrow, and returns the reference trades run against.
    #[instrument(skip(self))]
    pub async fn load_market(
        &self,
        package: ObjectId,
        proposal_id: ObjectId,
    ) -> Result<MarketRef, FutarchyError> {
        let proposal = self.load_proposal(proposal_id).await?;
        let escrow = self.load_object(proposal.proposal.market_id).await?.market_escrow()?;
        debug!(
            market_id = %escrow.id,
            outcome_count = proposal.proposal.outcome_count,
            "loaded market"
        );
        Ok(MarketRef {
            package,
            proposal: proposal.object,
            escrow,
            outcome_count: proposal.proposal.outcome_count,
            asset_type: proposal.asset_type,
            stable_type: proposal.stable_type,
        })
    }

    /// Loads a balance wrapper.
    pub async fn load_wrapper(
        &self,
        object_id: ObjectId,
    ) -> Result<WrapperObject, FutarchyError> {
        Ok(WrapperObject::decode(&self.load_object(object_id).await?)?)
    }

    /// Loads an outcome escrow.
    pub async fn load_escrow(&self, object_id: ObjectId) -> Result<Escrow, FutarchyError> {
        Ok(Escrow::decode(&self.load_object(object_id).await?)?)
    }

    /// Loads an escrow receipt.
    pub async fn load_receipt(
        &self,
        object_id: ObjectId,
    ) -> Result<EscrowReceiptRecord, FutarchyError> {
        Ok(EscrowReceiptRecord::decode(&self.load_object(object_id).await?)?)
    }

    /// Executes `transaction` without committing it. Fails the same way [`Self::submit`] would.
    #[instrument(skip_all)]
    pub async fn dry_run(&self, transaction: &TransactionData) -> Result<(), SubmitError> {
        let response = self
            .call("sui_dryRunTransactionBlock", self.client.dry_run(transaction.to_base64()?))
            .await?;
        let effects = response.effects;
        check_status(effects.transaction_digest.unwrap_or_default(), effects.status)
    }

    /// Submits a signed transaction and returns its digest once executed.
    ///
    /// The whole transaction commits or none of it does. On [`SubmitError::Aborted`] nothing
    /// changed and resubmitting the same transaction aborts again.
    #[instrument(skip_all)]
    pub async fn submit(&self, transaction: SignedTransaction) -> Result<String, SubmitError> {
        self.metrics.submitted.increment(1);
        let result = self
            .call("sui_executeTransactionBlock", self.client.execute(transaction))
            .await
            .and_then(|response| {
                let digest = response.digest;
                match response.effects {
                    Some(effects) => check_status(digest.clone(), effects.status).map(|()| digest),
                    None => Ok(digest),
                }
            });

        match &result {
            Ok(digest) => {
                self.metrics.succeeded.increment(1);
                info!(%digest, "transaction executed");
            }
            Err(err) if err.is_retryable() => {
                self.metrics.retryable.increment(1);
                warn!(%err, "submission failed before execution");
            }
            Err(err) => {
                self.metrics.aborted.increment(1);
                warn!(%err, kind = ?err.kind(), "transaction failed");
            }
        }
        result
    }
}

fn check_status(digest: String, status: ExecutionStatus) -> Result<(), SubmitError> {
    match status {
        ExecutionStatus::Success => Ok(()),
        ExecutionStatus::Failure { error } => match MoveAbort::parse(&error) {
            Some(abort) => Err(SubmitError::Aborted { digest, abort }),
            None => Err(SubmitError::Failed { digest, reason: error }),
        },
    }
}
