//! Contract bindings.
//!
//! Contracts are bound at runtime from the JSON interface in the settings
//! rather than generated with `sol!`, since their addresses and interfaces
//! are only known once the settings file is read.

pub mod loan;

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use alloy::{
    dyn_abi::{DynSolValue, FunctionExt, JsonAbiExt},
    json_abi::{Event, Function, JsonAbi},
    primitives::{Address, Bytes, TxHash},
    rpc::types::TransactionRequest,
};
use tokio::sync::RwLock;

use super::node::NodeRpc;
use crate::{
    config::ContractStore,
    error::{AppError, Result},
    types::TxOptions,
};

/// A contract interface bound to a deployed address and a node.
#[derive(Clone)]
pub struct ContractHandle {
    name: String,
    address: Address,
    abi: Arc<JsonAbi>,
    node: Arc<dyn NodeRpc>,
}

impl ContractHandle {
    /// Bind `abi` at `address`.
    pub fn new(
        name: impl Into<String>,
        address: Address,
        abi: Arc<JsonAbi>,
        node: Arc<dyn NodeRpc>,
    ) -> Self {
        Self { name: name.into(), address, abi, node }
    }

    /// Contract name from the settings.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Deployed address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Contract interface.
    pub fn abi(&self) -> &JsonAbi {
        &self.abi
    }

    /// Look up `method`, preferring the overload taking `arity` arguments.
    pub fn function(&self, method: &str, arity: usize) -> Result<&Function> {
        let overloads = self.abi.function(method).ok_or_else(|| AppError::UnknownMethod {
            contract: self.name.clone(),
            method: method.to_string(),
        })?;

        overloads
            .iter()
            .find(|f| f.inputs.len() == arity)
            .or_else(|| overloads.first())
            .ok_or_else(|| AppError::UnknownMethod {
                contract: self.name.clone(),
                method: method.to_string(),
            })
    }

    /// Look up an event by name.
    pub fn event(&self, name: &str) -> Result<&Event> {
        self.abi.event(name).and_then(|events| events.first()).ok_or_else(|| {
            AppError::UnknownEvent { contract: self.name.clone(), event: name.to_string() }
        })
    }

    /// Calldata for `method(args)`.
    pub fn encode_call(&self, method: &str, args: &[DynSolValue]) -> Result<Bytes> {
        let function = self.function(method, args.len())?;
        let data = function.abi_encode_input(args)?;
        Ok(data.into())
    }

    /// Execute `method` locally without broadcasting and decode its outputs.
    pub async fn call(
        &self,
        method: &str,
        args: &[DynSolValue],
        from: Option<Address>,
    ) -> Result<Vec<DynSolValue>> {
        let function = self.function(method, args.len())?;
        let data: Bytes = function.abi_encode_input(args)?.into();

        let mut tx = TransactionRequest::default().to(self.address).input(data.into());
        if let Some(from) = from {
            tx = tx.from(from);
        }

        let output = self.node.call(&tx).await?;
        let decoded = function.abi_decode_output(&output)?;
        Ok(decoded)
    }

    /// Submit a state-changing call of `method`. Returns the transaction hash
    /// as soon as the node accepts it.
    pub async fn send_transaction(
        &self,
        method: &str,
        args: &[DynSolValue],
        opts: TxOptions,
    ) -> Result<TxHash> {
        let data = self.encode_call(method, args)?;

        let mut tx =
            TransactionRequest::default().from(opts.from).to(self.address).input(data.into());
        if let Some(value) = opts.value {
            tx = tx.value(value);
        }
        if let Some(gas) = opts.gas {
            tx = tx.gas_limit(gas);
        }

        let tx_hash = self.node.send_transaction(tx).await?;

        tracing::info!(
            contract = %self.name,
            method = %method,
            from = %opts.from,
            tx_hash = %tx_hash,
            "Transaction submitted"
        );

        Ok(tx_hash)
    }
}

impl std::fmt::Debug for ContractHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContractHandle")
            .field("name", &self.name)
            .field("address", &self.address)
            .finish()
    }
}

/// Binder lookup counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BinderStats {
    /// Calls to `load_contract` / `bind`.
    pub lookups: u64,
    /// Lookups served from the cache.
    pub cache_hits: u64,
}

/// Produces contract handles from the contract store.
///
/// Handles are cached per name and rebound whenever the store records a
/// different address for that name.
pub struct ContractBinder {
    store: Arc<ContractStore>,
    node: Arc<dyn NodeRpc>,
    cache: RwLock<HashMap<String, ContractHandle>>,
    lookups: AtomicU64,
    cache_hits: AtomicU64,
}

impl ContractBinder {
    /// Create a binder over `store`.
    pub fn new(store: Arc<ContractStore>, node: Arc<dyn NodeRpc>) -> Self {
        Self {
            store,
            node,
            cache: RwLock::new(HashMap::new()),
            lookups: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
        }
    }

    /// The store this binder reads.
    pub fn store(&self) -> &Arc<ContractStore> {
        &self.store
    }

    /// Bind `name`, or `None` when it is unknown or not deployed yet.
    pub async fn load_contract(&self, name: &str) -> Option<ContractHandle> {
        self.bind(name).await.ok()
    }

    /// Bind `name`, telling apart unknown and undeployed contracts.
    pub async fn bind(&self, name: &str) -> Result<ContractHandle> {
        self.lookups.fetch_add(1, Ordering::Relaxed);

        let artifact = self
            .store
            .artifact(name)
            .await
            .ok_or_else(|| AppError::ContractNotConfigured(name.to_string()))?;
        let address =
            artifact.address.ok_or_else(|| AppError::ContractUnbound(name.to_string()))?;

        if let Some(handle) = self.cache.read().await.get(name) {
            if handle.address == address {
                self.cache_hits.fetch_add(1, Ordering::Relaxed);
                return Ok(handle.clone());
            }
        }

        let handle = ContractHandle::new(name, address, artifact.interface, self.node.clone());
        self.cache.write().await.insert(name.to_string(), handle.clone());

        tracing::debug!(contract = %name, address = %address, "Contract bound");
        Ok(handle)
    }

    /// Lookup counters since creation.
    pub fn stats(&self) -> BinderStats {
        BinderStats {
            lookups: self.lookups.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
        }
    }
}
