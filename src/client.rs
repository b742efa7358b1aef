//! Client wiring.

use std::sync::Arc;

use crate::{
    config::{Config, ContractStore, Settings},
    error::Result,
    ethereum::{AccountManager, ContractBinder, ContractHandle, EthereumClient, NodeRpc},
    services::{ContractDeployer, DeployOptions, EventRegistrar, EventSubscription, LoanService},
};

/// Loan contract client.
///
/// Owns one node connection and the contract store, and exposes the
/// account, binding, deployment, loan and event layers built on them.
#[derive(Clone)]
pub struct LoanClient {
    settings: Arc<Settings>,
    store: Arc<ContractStore>,
    accounts: AccountManager,
    binder: Arc<ContractBinder>,
    deployer: ContractDeployer,
    loan: LoanService,
    events: EventRegistrar,
}

impl LoanClient {
    /// Create a client talking to the node at `config.rpc_url`.
    ///
    /// Note: no network calls are made here.
    pub fn new(config: &Config, settings: Settings) -> Result<Self> {
        let client = EthereumClient::new(&config.rpc_url, config.rpc_timeout)?
            .with_poll_interval(settings.event_poll_interval());
        Ok(Self::with_node(settings, Arc::new(client)))
    }

    /// Create a client over any node implementation.
    pub fn with_node(settings: Settings, node: Arc<dyn NodeRpc>) -> Self {
        tracing::info!(
            fueling_account = %settings.fueling_account,
            asset_loan = %settings.asset_loan,
            "Initializing loan client"
        );

        let store = Arc::new(ContractStore::new(settings.contracts.clone()));

        let accounts = AccountManager::new(
            node.clone(),
            settings.fueling_account,
            settings.default_password.clone(),
            settings.unlock_duration(),
        );
        let binder = Arc::new(ContractBinder::new(store.clone(), node.clone()));
        let deployer = ContractDeployer::new(
            node.clone(),
            accounts.clone(),
            store.clone(),
            settings.terms.clone(),
            settings.borrower,
            settings.seller,
            DeployOptions::from_settings(&settings),
        );
        let loan = LoanService::new(
            binder.clone(),
            accounts.clone(),
            settings.asset_loan.clone(),
            settings.borrower,
            settings.default_gas,
        );
        let events = EventRegistrar::new(node);

        Self { settings: Arc::new(settings), store, accounts, binder, deployer, loan, events }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> &Arc<ContractStore> {
        &self.store
    }

    pub fn accounts(&self) -> &AccountManager {
        &self.accounts
    }

    pub fn binder(&self) -> &Arc<ContractBinder> {
        &self.binder
    }

    pub fn deployer(&self) -> &ContractDeployer {
        &self.deployer
    }

    pub fn loan(&self) -> &LoanService {
        &self.loan
    }

    pub fn events(&self) -> &EventRegistrar {
        &self.events
    }

    /// Bind the loan contract, or `None` while it is not deployed.
    pub async fn loan_contract(&self) -> Option<ContractHandle> {
        self.binder.load_contract(&self.settings.asset_loan).await
    }

    /// Attach the default listener to every configured loan event.
    pub async fn listen(&self) -> Result<Vec<EventSubscription>> {
        let contract = self.binder.bind(&self.settings.asset_loan).await?;
        self.events.register_all(&contract, &self.settings.events).await
    }
}
