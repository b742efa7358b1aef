//! Error types and handling module.
//!
//! Defines all client error types and conversions.

use alloy::primitives::Address;
use thiserror::Error;

/// Application-wide error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The node answered a request with an error.
    #[error("Ethereum RPC error: {0}")]
    Rpc(String),

    /// Transport errors.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Invalid Ethereum address.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Contract name missing from the settings.
    #[error("Contract not configured: {0}")]
    ContractNotConfigured(String),

    /// Contract known but without a deployed address yet.
    #[error("Contract not deployed: {0}")]
    ContractUnbound(String),

    /// The node refused (or failed) to unlock an account.
    #[error("Failed to unlock account {account}: {reason}")]
    AccountUnlock { account: Address, reason: String },

    /// The node rejected a submitted transaction.
    #[error("Transaction rejected: {0}")]
    TransactionRejected(String),

    /// Gas estimation failed.
    #[error("Gas estimation failed: {0}")]
    Estimation(String),

    /// Contract deployment failed after submission.
    #[error("Deployment failed: {0}")]
    Deployment(String),

    /// Method not present in the contract interface.
    #[error("Unknown method {method} on contract {contract}")]
    UnknownMethod { contract: String, method: String },

    /// Event not present in the contract interface.
    #[error("Unknown event {event} on contract {contract}")]
    UnknownEvent { contract: String, event: String },

    /// ABI encoding or decoding errors.
    #[error("ABI error: {0}")]
    Abi(String),

    /// Parse error.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Numeric overflow during conversion.
    #[error("Numeric overflow: {0}")]
    NumericOverflow(String),

    /// An RPC request did not complete in time.
    #[error("Timed out: {0}")]
    Timeout(String),
}

impl From<alloy::transports::TransportError> for AppError {
    fn from(err: alloy::transports::TransportError) -> Self {
        AppError::Transport(err.to_string())
    }
}

impl From<alloy::dyn_abi::Error> for AppError {
    fn from(err: alloy::dyn_abi::Error) -> Self {
        AppError::Abi(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

/// Result type alias using AppError.
pub type Result<T> = std::result::Result<T, AppError>;
