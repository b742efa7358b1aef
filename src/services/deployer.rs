//! Loan contract deployment.

use std::{sync::Arc, time::Duration};

use alloy::{
    dyn_abi::JsonAbiExt,
    network::TransactionBuilder,
    primitives::{Address, Bytes, TxHash},
    rpc::types::TransactionRequest,
};
use tokio::{sync::mpsc, task::JoinHandle};

use crate::{
    config::{ContractStore, LoanTerms, Settings},
    error::{AppError, Result},
    ethereum::{contracts::loan, AccountManager, NodeRpc},
    types::{DeploymentEvent, MinedReceipt},
};

/// Tuning of the deployment lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeployOptions {
    /// Gas limit as a multiple of the estimate.
    pub gas_multiplier: u64,
    /// Interval between receipt polls.
    pub poll_interval: Duration,
    /// Give up waiting for the receipt after this long.
    pub receipt_timeout: Duration,
}

impl Default for DeployOptions {
    fn default() -> Self {
        Self {
            gas_multiplier: 2,
            poll_interval: Duration::from_secs(1),
            receipt_timeout: Duration::from_secs(600),
        }
    }
}

impl DeployOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            gas_multiplier: settings.deploy_gas_multiplier,
            poll_interval: settings.receipt_poll_interval(),
            receipt_timeout: settings.receipt_timeout(),
        }
    }
}

/// A submitted creation transaction that is still being tracked.
///
/// The first event is always [`DeploymentEvent::Pending`]; it is followed by
/// exactly one `Mined` or `Failed`.
#[derive(Debug)]
pub struct PendingDeployment {
    /// Hash of the creation transaction.
    pub tx_hash: TxHash,
    /// Node's gas estimate for the bytecode.
    pub gas_estimate: u64,
    /// Gas limit the transaction was sent with.
    pub gas_limit: u64,
    events: mpsc::UnboundedReceiver<DeploymentEvent>,
    tracker: JoinHandle<Result<Address>>,
}

impl PendingDeployment {
    /// Next lifecycle event, `None` once tracking is over.
    pub async fn next_event(&mut self) -> Option<DeploymentEvent> {
        self.events.recv().await
    }

    /// Wait until the contract is mined and return its address.
    pub async fn wait(self) -> Result<Address> {
        self.tracker.await.map_err(|e| AppError::Deployment(e.to_string()))?
    }
}

/// Deploys the loan contract with the configured terms.
#[derive(Clone)]
pub struct ContractDeployer {
    node: Arc<dyn NodeRpc>,
    accounts: AccountManager,
    store: Arc<ContractStore>,
    terms: LoanTerms,
    borrower: Address,
    seller: Address,
    options: DeployOptions,
}

impl ContractDeployer {
    /// Create a deployer.
    pub fn new(
        node: Arc<dyn NodeRpc>,
        accounts: AccountManager,
        store: Arc<ContractStore>,
        terms: LoanTerms,
        borrower: Address,
        seller: Address,
        options: DeployOptions,
    ) -> Self {
        Self { node, accounts, store, terms, borrower, seller, options }
    }

    /// Submit a creation transaction for `contract` and track it under `id`.
    ///
    /// Returns as soon as the node accepts the transaction. Once mined, the
    /// address is recorded against `id` in the contract store.
    pub async fn deploy(
        &self,
        contract: &str,
        id: &str,
        from: Option<Address>,
        password: Option<&str>,
    ) -> Result<PendingDeployment> {
        tracing::info!(contract = %contract, id = %id, "Deploying contract");

        let result = self.submit(contract, id, from, password).await;
        if let Err(e) = &result {
            tracing::error!(contract = %contract, id = %id, error = %e, "Deployment failed");
        }
        result
    }

    async fn submit(
        &self,
        contract: &str,
        id: &str,
        from: Option<Address>,
        password: Option<&str>,
    ) -> Result<PendingDeployment> {
        let owner = self.accounts.resolve_account(from, password).await?;

        let artifact = self
            .store
            .artifact(contract)
            .await
            .ok_or_else(|| AppError::ContractNotConfigured(contract.to_string()))?;
        if artifact.bytecode.is_empty() {
            return Err(AppError::Deployment(format!("{} has no bytecode", contract)));
        }

        let estimate_tx = TransactionRequest::default().with_deploy_code(artifact.bytecode.clone());
        let gas_estimate = self.node.estimate_gas(&estimate_tx).await?;
        let gas_limit = gas_estimate.checked_mul(self.options.gas_multiplier).ok_or_else(|| {
            AppError::NumericOverflow(format!(
                "gas estimate {} x {}",
                gas_estimate, self.options.gas_multiplier
            ))
        })?;

        let constructor = artifact.interface.constructor().ok_or_else(|| {
            AppError::Abi(format!("{} interface declares no constructor", contract))
        })?;
        let args = loan::constructor_args(&self.terms, self.borrower, self.seller);
        let encoded_args = constructor.abi_encode_input(&args)?;

        let mut code = artifact.bytecode.to_vec();
        code.extend_from_slice(&encoded_args);

        let tx = TransactionRequest::default()
            .with_from(owner)
            .with_deploy_code(Bytes::from(code))
            .with_gas_limit(gas_limit);

        let tx_hash = self.node.send_transaction(tx).await?;

        tracing::info!(
            contract = %contract,
            tx_hash = %tx_hash,
            gas_estimate = gas_estimate,
            gas_limit = gas_limit,
            "Contract transaction sent, waiting to be mined"
        );

        let (events_tx, events) = mpsc::unbounded_channel();
        let _ = events_tx.send(DeploymentEvent::Pending { tx_hash });

        let tracker = tokio::spawn(track_deployment(
            self.node.clone(),
            self.store.clone(),
            contract.to_string(),
            id.to_string(),
            tx_hash,
            events_tx,
            self.options,
        ));

        Ok(PendingDeployment { tx_hash, gas_estimate, gas_limit, events, tracker })
    }
}

async fn track_deployment(
    node: Arc<dyn NodeRpc>,
    store: Arc<ContractStore>,
    contract: String,
    id: String,
    tx_hash: TxHash,
    events: mpsc::UnboundedSender<DeploymentEvent>,
    options: DeployOptions,
) -> Result<Address> {
    let outcome = async {
        let receipt = tokio::time::timeout(
            options.receipt_timeout,
            wait_for_receipt(node.as_ref(), tx_hash, options.poll_interval),
        )
        .await
        .map_err(|_| {
            AppError::Timeout(format!("{} not mined after {:?}", tx_hash, options.receipt_timeout))
        })??;

        if !receipt.success {
            return Err(AppError::Deployment(format!("creation transaction {} reverted", tx_hash)));
        }
        let address = receipt.contract_address.ok_or_else(|| {
            AppError::Deployment(format!("receipt of {} has no contract address", tx_hash))
        })?;

        store.record_deployment(&contract, &id, address).await?;
        Ok(address)
    }
    .await;

    match outcome {
        Ok(address) => {
            tracing::info!(contract = %contract, id = %id, address = %address, "Contract mined");
            let _ = events.send(DeploymentEvent::Mined { tx_hash, address });
            Ok(address)
        }
        Err(e) => {
            tracing::error!(contract = %contract, id = %id, tx_hash = %tx_hash, error = %e, "Deployment failed");
            let _ = events.send(DeploymentEvent::Failed { tx_hash, reason: e.to_string() });
            Err(e)
        }
    }
}

async fn wait_for_receipt(
    node: &dyn NodeRpc,
    tx_hash: TxHash,
    poll_interval: Duration,
) -> Result<MinedReceipt> {
    loop {
        if let Some(receipt) = node.transaction_receipt(tx_hash).await? {
            return Ok(receipt);
        }
        tokio::time::sleep(poll_interval).await;
    }
}
