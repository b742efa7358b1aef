//! Common utilities for integration tests.
#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use alloy::{
    dyn_abi::DynSolValue,
    primitives::{address, keccak256, Address, Bytes, LogData, TxHash, TxKind, U256},
    rpc::types::{Filter, Log, TransactionRequest},
};
use async_trait::async_trait;
use futures_util::StreamExt;
use loan_contract_client::{
    ethereum::{LogStream, NodeRpc},
    types::MinedReceipt,
    AppError, LoanClient, Result, Settings,
};
use tokio::sync::mpsc;

pub const FUELING: Address = address!("00000000000000000000000000000000000000f0");
pub const BORROWER: Address = address!("00000000000000000000000000000000000000b0");
pub const SELLER: Address = address!("00000000000000000000000000000000000000c0");
pub const INVESTOR_A: Address = address!("00000000000000000000000000000000000000a1");
pub const LOAN_ADDRESS: Address = address!("0000000000000000000000000000000000001234");
pub const DEPLOYED_ADDRESS: Address = address!("0000000000000000000000000000000000005678");

pub const PASSWORD: &str = "fuel-pass";
pub const DEFAULT_GAS: u64 = 4_000_000;
pub const BYTECODE: [u8; 4] = [0x60, 0x80, 0x60, 0x40];

/// Asset loan interface used by the fixtures.
pub fn loan_abi() -> serde_json::Value {
    let event = |name: &str| {
        serde_json::json!({
            "type": "event",
            "name": name,
            "inputs": [
                {"name": "account", "type": "address", "indexed": false},
                {"name": "amount", "type": "uint256", "indexed": false}
            ],
            "anonymous": false
        })
    };

    let mut abi = vec![
        serde_json::json!({
            "type": "constructor",
            "inputs": [
                {"name": "_assetValue", "type": "uint256"},
                {"name": "_fundingTarget", "type": "uint256"},
                {"name": "_interestRate", "type": "uint256"},
                {"name": "_minInvestment", "type": "uint256"},
                {"name": "_paymentSize", "type": "uint256"},
                {"name": "_borrower", "type": "address"},
                {"name": "_seller", "type": "address"}
            ],
            "stateMutability": "nonpayable"
        }),
        serde_json::json!({
            "type": "function", "name": "fundsAdd",
            "inputs": [], "outputs": [], "stateMutability": "payable"
        }),
        serde_json::json!({
            "type": "function", "name": "investmentProposalAdd",
            "inputs": [], "outputs": [], "stateMutability": "payable"
        }),
        serde_json::json!({
            "type": "function", "name": "investmentProposalApprove",
            "inputs": [{"name": "_investor", "type": "address"}],
            "outputs": [], "stateMutability": "nonpayable"
        }),
        serde_json::json!({
            "type": "function", "name": "paymentExecute",
            "inputs": [], "outputs": [{"name": "", "type": "bool"}],
            "stateMutability": "nonpayable"
        }),
    ];
    for name in loan_contract_client::config::LOAN_EVENTS {
        abi.push(event(name));
    }
    serde_json::Value::Array(abi)
}

/// Settings with the loan contract deployed at `loan_address`, if given.
pub fn settings(loan_address: Option<Address>) -> Settings {
    let document = serde_json::json!({
        "fueling_account": FUELING.to_string(),
        "default_password": PASSWORD,
        "default_gas": DEFAULT_GAS,
        "borrower": BORROWER.to_string(),
        "seller": SELLER.to_string(),
        "investors": [INVESTOR_A.to_string()],
        "asset_value": 100000,
        "funding_target": 90000,
        "interest_rate": 5,
        "min_investment": 1000,
        "payment_size": 10000,
        "asset_loan": "AssetLoan",
        "receipt_poll_interval_ms": 10,
        "receipt_timeout_secs": 5,
        "contracts": {
            "AssetLoan": {
                "interface": loan_abi(),
                "bytecode": format!("0x{}", alloy::hex::encode(BYTECODE)),
                "address": loan_address.map(|a| a.to_string())
            }
        }
    });

    Settings::from_json(&document.to_string()).expect("fixture settings parse")
}

/// A client over a fresh mock node.
pub fn client(loan_address: Option<Address>) -> (LoanClient, Arc<MockNode>) {
    let node = Arc::new(MockNode::new());
    let client = LoanClient::with_node(settings(loan_address), node.clone());
    (client, node)
}

/// A log the loan contract would emit for `event(account, amount)`.
pub fn loan_log(contract: Address, event: &str, account: Address, amount: U256) -> Log {
    let topic = keccak256(format!("{}(address,uint256)", event));
    let data = DynSolValue::Tuple(vec![
        DynSolValue::Address(account),
        DynSolValue::Uint(amount, 256),
    ])
    .abi_encode_params();

    Log {
        inner: alloy::primitives::Log {
            address: contract,
            data: LogData::new_unchecked(vec![topic], Bytes::from(data)),
        },
        transaction_hash: Some(TxHash::with_last_byte(0xee)),
        block_number: Some(42),
        ..Default::default()
    }
}

/// Wait for `rx` to yield, failing the test after a second.
pub async fn recv<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> T {
    tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("timed out waiting for delivery")
        .expect("channel closed")
}

#[derive(Default)]
struct MockState {
    unlocks: Vec<(Address, String, Duration)>,
    estimates: Vec<TransactionRequest>,
    calls: Vec<TransactionRequest>,
    sent: Vec<TransactionRequest>,
    receipts: HashMap<TxHash, MinedReceipt>,
    filters: Vec<Filter>,
    watchers: Vec<mpsc::UnboundedSender<Result<Log>>>,
}

/// In-memory node recording every request it receives.
pub struct MockNode {
    state: Mutex<MockState>,
    unlock_result: AtomicBool,
    unlock_timeout: AtomicBool,
    auto_mine: AtomicBool,
    fail_estimate: AtomicBool,
    reject_sends: AtomicBool,
    gas_estimate: AtomicU64,
    created_address: Mutex<Address>,
    call_output: Mutex<Bytes>,
}

impl MockNode {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState::default()),
            unlock_result: AtomicBool::new(true),
            unlock_timeout: AtomicBool::new(false),
            auto_mine: AtomicBool::new(true),
            fail_estimate: AtomicBool::new(false),
            reject_sends: AtomicBool::new(false),
            gas_estimate: AtomicU64::new(500_000),
            created_address: Mutex::new(DEPLOYED_ADDRESS),
            call_output: Mutex::new(Bytes::from(
                DynSolValue::Tuple(vec![DynSolValue::Bool(true)]).abi_encode_params(),
            )),
        }
    }

    pub fn set_unlock_result(&self, unlocked: bool) {
        self.unlock_result.store(unlocked, Ordering::SeqCst);
    }

    /// Make unlock requests time out instead of answering.
    pub fn set_unlock_timeout(&self, timeout: bool) {
        self.unlock_timeout.store(timeout, Ordering::SeqCst);
    }

    pub fn set_auto_mine(&self, auto_mine: bool) {
        self.auto_mine.store(auto_mine, Ordering::SeqCst);
    }

    pub fn set_fail_estimate(&self, fail: bool) {
        self.fail_estimate.store(fail, Ordering::SeqCst);
    }

    pub fn set_reject_sends(&self, reject: bool) {
        self.reject_sends.store(reject, Ordering::SeqCst);
    }

    pub fn set_gas_estimate(&self, gas: u64) {
        self.gas_estimate.store(gas, Ordering::SeqCst);
    }

    pub fn set_call_output(&self, output: Bytes) {
        *self.call_output.lock().unwrap() = output;
    }

    /// Record a receipt for `tx_hash`.
    pub fn mine(&self, tx_hash: TxHash, contract_address: Option<Address>, success: bool) {
        self.state.lock().unwrap().receipts.insert(
            tx_hash,
            MinedReceipt { transaction_hash: tx_hash, contract_address, block_number: Some(1), success },
        );
    }

    /// Deliver `log` to every watcher.
    pub fn emit(&self, log: Log) {
        let state = self.state.lock().unwrap();
        for watcher in &state.watchers {
            let _ = watcher.send(Ok(log.clone()));
        }
    }

    /// Deliver a node error to every watcher.
    pub fn emit_error(&self, message: &str) {
        let state = self.state.lock().unwrap();
        for watcher in &state.watchers {
            let _ = watcher.send(Err(AppError::Rpc(message.to_string())));
        }
    }

    pub fn unlocks(&self) -> Vec<(Address, String, Duration)> {
        self.state.lock().unwrap().unlocks.clone()
    }

    pub fn estimates(&self) -> Vec<TransactionRequest> {
        self.state.lock().unwrap().estimates.clone()
    }

    pub fn calls(&self) -> Vec<TransactionRequest> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn sent(&self) -> Vec<TransactionRequest> {
        self.state.lock().unwrap().sent.clone()
    }

    pub fn filters(&self) -> Vec<Filter> {
        self.state.lock().unwrap().filters.clone()
    }
}

#[async_trait]
impl NodeRpc for MockNode {
    async fn unlock_account(
        &self,
        account: Address,
        password: &str,
        duration: Duration,
    ) -> Result<bool> {
        self.state.lock().unwrap().unlocks.push((account, password.to_string(), duration));
        if self.unlock_timeout.load(Ordering::SeqCst) {
            return Err(AppError::Timeout("personal_unlockAccount after 200ms".into()));
        }
        Ok(self.unlock_result.load(Ordering::SeqCst))
    }

    async fn estimate_gas(&self, tx: &TransactionRequest) -> Result<u64> {
        self.state.lock().unwrap().estimates.push(tx.clone());
        if self.fail_estimate.load(Ordering::SeqCst) {
            return Err(AppError::Estimation("execution reverted".into()));
        }
        Ok(self.gas_estimate.load(Ordering::SeqCst))
    }

    async fn call(&self, tx: &TransactionRequest) -> Result<Bytes> {
        self.state.lock().unwrap().calls.push(tx.clone());
        Ok(self.call_output.lock().unwrap().clone())
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash> {
        if self.reject_sends.load(Ordering::SeqCst) {
            return Err(AppError::TransactionRejected("insufficient funds".into()));
        }

        let is_create = matches!(tx.to, Some(TxKind::Create));
        let tx_hash = {
            let mut state = self.state.lock().unwrap();
            state.sent.push(tx);
            TxHash::with_last_byte(state.sent.len() as u8)
        };

        if self.auto_mine.load(Ordering::SeqCst) {
            let address = is_create.then(|| *self.created_address.lock().unwrap());
            self.mine(tx_hash, address, true);
        }
        Ok(tx_hash)
    }

    async fn transaction_receipt(&self, hash: TxHash) -> Result<Option<MinedReceipt>> {
        Ok(self.state.lock().unwrap().receipts.get(&hash).cloned())
    }

    async fn watch_logs(&self, filter: &Filter) -> Result<LogStream> {
        let (tx, rx) = mpsc::unbounded_channel();
        {
            let mut state = self.state.lock().unwrap();
            state.filters.push(filter.clone());
            state.watchers.push(tx);
        }

        let stream = futures_util::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        });
        Ok(stream.boxed())
    }
}
