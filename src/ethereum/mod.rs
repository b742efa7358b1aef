//! Ethereum interaction module.
//!
//! Contains the node boundary, the RPC client, account resolution and
//! contract bindings.

pub mod accounts;
pub mod client;
pub mod contracts;
pub mod node;

pub use accounts::AccountManager;
pub use client::EthereumClient;
pub use contracts::{BinderStats, ContractBinder, ContractHandle};
pub use node::{LogStream, NodeRpc};
