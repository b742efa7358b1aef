//! Transaction, receipt and event types.

use alloy::{
    dyn_abi::DynSolValue,
    primitives::{Address, TxHash, U256},
};

/// Per-transaction options for a state-changing contract call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOptions {
    /// Signing (unlocked) account.
    pub from: Address,
    /// Native currency sent along, in wei.
    pub value: Option<U256>,
    /// Gas limit. Left to the node when absent.
    pub gas: Option<u64>,
}

impl TxOptions {
    /// Options sending from `from` with no value and no explicit gas.
    pub fn new(from: Address) -> Self {
        Self { from, value: None, gas: None }
    }

    /// Attach a value in wei.
    pub fn with_value(mut self, value: U256) -> Self {
        self.value = Some(value);
        self
    }

    /// Attach a gas limit.
    pub fn with_gas(mut self, gas: u64) -> Self {
        self.gas = Some(gas);
        self
    }
}

/// The subset of a mined transaction receipt this client reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinedReceipt {
    /// Hash of the mined transaction.
    pub transaction_hash: TxHash,
    /// Address of the created contract, for creation transactions.
    pub contract_address: Option<Address>,
    /// Block the transaction was included in.
    pub block_number: Option<u64>,
    /// Whether execution succeeded.
    pub success: bool,
}

/// Lifecycle notifications of a contract deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeploymentEvent {
    /// Creation transaction accepted by the node; no address yet.
    Pending { tx_hash: TxHash },
    /// Creation transaction mined and an address assigned.
    Mined { tx_hash: TxHash, address: Address },
    /// Deployment did not produce a contract.
    Failed { tx_hash: TxHash, reason: String },
}

impl DeploymentEvent {
    /// Hash of the creation transaction.
    pub fn tx_hash(&self) -> TxHash {
        match self {
            DeploymentEvent::Pending { tx_hash }
            | DeploymentEvent::Mined { tx_hash, .. }
            | DeploymentEvent::Failed { tx_hash, .. } => *tx_hash,
        }
    }
}

/// A decoded occurrence of a contract event.
#[derive(Debug, Clone, PartialEq)]
pub struct ContractEvent {
    /// Event name from the interface.
    pub event: String,
    /// Emitting contract.
    pub address: Address,
    /// Transaction that emitted the event.
    pub transaction_hash: Option<TxHash>,
    /// Block that contains the event.
    pub block_number: Option<u64>,
    /// Decoded indexed parameters.
    pub indexed: Vec<DynSolValue>,
    /// Decoded non-indexed parameters.
    pub body: Vec<DynSolValue>,
}
