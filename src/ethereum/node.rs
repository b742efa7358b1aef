//! Node RPC boundary.
//!
//! Everything this client needs from the node, behind one trait so the
//! account, binding, deployment and event layers can run against any node
//! implementation (or a test double).

use std::time::Duration;

use alloy::{
    primitives::{Address, Bytes, TxHash},
    rpc::types::{Filter, Log, TransactionRequest},
};
use async_trait::async_trait;
use futures_util::stream::BoxStream;

use crate::{error::Result, types::MinedReceipt};

/// Stream of logs matching a watched filter.
pub type LogStream = BoxStream<'static, Result<Log>>;

/// Operations consumed from the node's JSON-RPC interface.
#[async_trait]
pub trait NodeRpc: Send + Sync {
    /// Unlock `account` for `duration`. Returns the node's verdict.
    async fn unlock_account(
        &self,
        account: Address,
        password: &str,
        duration: Duration,
    ) -> Result<bool>;

    /// Estimate gas for a transaction.
    async fn estimate_gas(&self, tx: &TransactionRequest) -> Result<u64>;

    /// Execute a call without broadcasting.
    async fn call(&self, tx: &TransactionRequest) -> Result<Bytes>;

    /// Submit a transaction signed by the node; returns once it is pooled.
    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash>;

    /// Receipt of a transaction, `None` while it is pending.
    async fn transaction_receipt(&self, hash: TxHash) -> Result<Option<MinedReceipt>>;

    /// Watch logs matching `filter` from now on.
    async fn watch_logs(&self, filter: &Filter) -> Result<LogStream>;
}
