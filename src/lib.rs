//! Peer-to-peer Loan Contract Client
//!
//! Deploys an asset loan contract through an Ethereum node's JSON-RPC
//! interface, drives it with the borrower, investor and fueling accounts the
//! node holds, and listens to the events it emits.
//!
//! # Features
//!
//! - **Deployment**: create the loan contract with the configured terms and
//!   follow it from pending to mined
//! - **Loan operations**: add funds, propose and approve investments, execute payments
//! - **Event listeners**: watch contract events and hand them to callbacks
//!
//! # Example
//!
//! ```rust,ignore
//! use alloy::primitives::U256;
//! use loan_contract_client::{Config, LoanClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let client = LoanClient::new(&config, config.load_settings()?)?;
//!     let tx_hash = client.loan().add_funds(U256::from(100_000u64)).await?;
//!     println!("{tx_hash}");
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod ethereum;
pub mod services;
pub mod types;

pub use client::LoanClient;
pub use config::{Config, ContractStore, Settings};
pub use error::{AppError, Result};
