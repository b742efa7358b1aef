//! Ethereum RPC client.

use std::{future::IntoFuture, sync::Arc, time::Duration};

use alloy::{
    network::{Ethereum, ReceiptResponse},
    primitives::{Address, Bytes, TxHash, U256},
    providers::{Provider, ProviderBuilder, RootProvider},
    rpc::types::{Filter, Log, TransactionRequest},
};
use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::time::MissedTickBehavior;

use super::node::{LogStream, NodeRpc};
use crate::{
    error::{AppError, Result},
    types::MinedReceipt,
};

/// Ethereum RPC client wrapper.
///
/// Transactions are sent unsigned; the node signs them with accounts that
/// were unlocked beforehand.
#[derive(Clone)]
pub struct EthereumClient {
    /// The underlying provider.
    provider: Arc<RootProvider<Ethereum>>,
    /// RPC URL for logging.
    rpc_url: String,
    /// Upper bound for each request.
    timeout: Duration,
    /// Interval between log filter polls.
    poll_interval: Duration,
}

impl EthereumClient {
    /// Create a new Ethereum client.
    ///
    /// Note: This does NOT make any network calls. The connection is
    /// established lazily when the first operation is performed.
    pub fn new(rpc_url: &str, timeout: Duration) -> Result<Self> {
        let url = rpc_url
            .parse()
            .map_err(|_| AppError::Config(format!("Invalid RPC URL: {}", rpc_url)))?;

        #[allow(deprecated)]
        let provider = ProviderBuilder::new().connect_http(url).root().clone();

        tracing::info!(rpc_url = %rpc_url, "Ethereum client created (lazy initialization)");

        Ok(Self {
            provider: Arc::new(provider),
            rpc_url: rpc_url.to_string(),
            timeout,
            poll_interval: Duration::from_secs(1),
        })
    }

    /// Use `interval` between log filter polls.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Bound `fut` by the configured request timeout.
    async fn timed<F: IntoFuture>(&self, method: &str, fut: F) -> Result<F::Output> {
        tokio::time::timeout(self.timeout, fut).await.map_err(|_| {
            tracing::warn!(method = %method, timeout = ?self.timeout, "RPC request timed out");
            AppError::Timeout(format!("{} after {:?}", method, self.timeout))
        })
    }

    /// Logs that matched filter `id` since the previous poll.
    async fn filter_changes(&self, id: U256) -> Result<Vec<Log>> {
        self.timed(
            "eth_getFilterChanges",
            self.provider.raw_request::<_, Vec<Log>>("eth_getFilterChanges".into(), (id,)),
        )
        .await?
        .map_err(|e| {
            tracing::warn!(filter_id = %id, error = %e, "Log filter poll failed");
            AppError::Rpc(e.to_string())
        })
    }
}

#[async_trait]
impl NodeRpc for EthereumClient {
    async fn unlock_account(
        &self,
        account: Address,
        password: &str,
        duration: Duration,
    ) -> Result<bool> {
        let params = (account, password.to_string(), duration.as_secs());
        self.timed(
            "personal_unlockAccount",
            self.provider.raw_request::<_, bool>("personal_unlockAccount".into(), params),
        )
        .await?
        .map_err(|e| AppError::AccountUnlock { account, reason: e.to_string() })
    }

    async fn estimate_gas(&self, tx: &TransactionRequest) -> Result<u64> {
        self.timed("eth_estimateGas", self.provider.estimate_gas(tx.clone()))
            .await?
            .map_err(|e| AppError::Estimation(e.to_string()))
    }

    async fn call(&self, tx: &TransactionRequest) -> Result<Bytes> {
        let result = self.timed("eth_call", self.provider.call(tx.clone())).await??;
        Ok(result)
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash> {
        let pending = self
            .timed("eth_sendTransaction", self.provider.send_transaction(tx))
            .await?
            .map_err(|e| AppError::TransactionRejected(e.to_string()))?;
        Ok(*pending.tx_hash())
    }

    async fn transaction_receipt(&self, hash: TxHash) -> Result<Option<MinedReceipt>> {
        let receipt = self
            .timed("eth_getTransactionReceipt", self.provider.get_transaction_receipt(hash))
            .await??;

        Ok(receipt.map(|receipt| MinedReceipt {
            transaction_hash: receipt.transaction_hash(),
            contract_address: receipt.contract_address(),
            block_number: receipt.block_number(),
            success: receipt.status(),
        }))
    }

    async fn watch_logs(&self, filter: &Filter) -> Result<LogStream> {
        let filter_id = self.timed("eth_newFilter", self.provider.new_filter(filter)).await??;
        tracing::debug!(filter_id = %filter_id, rpc_url = %self.rpc_url, "Log filter installed");

        let mut ticks = tokio::time::interval(self.poll_interval);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

        // Every failed poll is yielded as an error; polling carries on.
        let polls = futures_util::stream::unfold(
            (self.clone(), ticks),
            move |(client, mut ticks)| async move {
                ticks.tick().await;
                let batch = client.filter_changes(filter_id).await;
                Some((batch, (client, ticks)))
            },
        );

        let stream = polls
            .flat_map(|batch| {
                let items: Vec<Result<Log>> = match batch {
                    Ok(logs) => logs.into_iter().map(Ok).collect(),
                    Err(e) => vec![Err(e)],
                };
                futures_util::stream::iter(items)
            })
            .boxed();

        Ok(stream)
    }
}

impl std::fmt::Debug for EthereumClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EthereumClient")
            .field("rpc_url", &self.rpc_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}
