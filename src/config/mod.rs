//! Configuration management module.
//!
//! Connection parameters come from environment variables; account roles,
//! loan terms and contract artifacts come from a JSON settings file that is
//! read once at startup.

pub mod store;

use std::{collections::HashMap, env, path::PathBuf, sync::Arc, time::Duration};

use alloy::{
    json_abi::JsonAbi,
    primitives::{Address, Bytes, U256},
};
use serde::{Deserialize, Deserializer};

use crate::{error::AppError, types::deserialize_amount};

pub use store::ContractStore;

/// Default settings file location.
pub const DEFAULT_SETTINGS_PATH: &str = "settings.json";

/// Default per-request RPC timeout in seconds.
pub const DEFAULT_RPC_TIMEOUT_SECS: u64 = 30;

/// Events the loan contract emits, in the order listeners are attached.
pub const LOAN_EVENTS: [&str; 7] = [
    "InvestmentProposalAddedEvent",
    "InvestmentProposalApprovedEvent",
    "FundingTargetReachedEvent",
    "InvestmentProposalDeclinedEvent",
    "InvestorPaymentMadeEvent",
    "LoanPaidOff",
    "PaymentMadeEvent",
];

/// Process configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Ethereum JSON-RPC endpoint URL.
    pub rpc_url: String,
    /// Path of the JSON settings file.
    pub settings_path: PathBuf,
    /// Logging level (default: info).
    pub log_level: String,
    /// Upper bound for a single RPC request.
    pub rpc_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required environment variables:
    /// - `ETHEREUM_RPC_URL`: Ethereum JSON-RPC endpoint
    ///
    /// Optional environment variables:
    /// - `LOAN_SETTINGS_PATH`: settings file (default: settings.json)
    /// - `LOG_LEVEL`: Logging level (default: info)
    /// - `RPC_TIMEOUT_SECS`: per-request timeout (default: 30)
    pub fn from_env() -> Result<Self, AppError> {
        // Load .env file if present
        let _ = dotenvy::dotenv();

        let rpc_url = env::var("ETHEREUM_RPC_URL").map_err(|_| {
            AppError::Config("ETHEREUM_RPC_URL environment variable not set".into())
        })?;

        let settings_path = env::var("LOAN_SETTINGS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_SETTINGS_PATH));

        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let rpc_timeout_secs = match env::var("RPC_TIMEOUT_SECS") {
            Ok(raw) => raw.parse::<u64>().map_err(|e| {
                AppError::Config(format!("RPC_TIMEOUT_SECS is not a number: {}", e))
            })?,
            Err(_) => DEFAULT_RPC_TIMEOUT_SECS,
        };

        Ok(Self {
            rpc_url,
            settings_path,
            log_level,
            rpc_timeout: Duration::from_secs(rpc_timeout_secs),
        })
    }

    /// Read the settings file this configuration points at.
    pub fn load_settings(&self) -> Result<Settings, AppError> {
        Settings::from_file(&self.settings_path)
    }
}

/// Compiled artifact and deployment state of one contract.
#[derive(Debug, Clone, Deserialize)]
pub struct ContractArtifact {
    /// Contract interface. Accepts an ABI array or its JSON-encoded string.
    #[serde(deserialize_with = "deserialize_interface")]
    pub interface: Arc<JsonAbi>,
    /// Creation bytecode.
    #[serde(alias = "data", default)]
    pub bytecode: Bytes,
    /// Deployed address, once known.
    #[serde(default, deserialize_with = "deserialize_optional_address")]
    pub address: Option<Address>,
}

impl ContractArtifact {
    /// Copy of this artifact bound to another address.
    pub fn at(&self, address: Address) -> Self {
        Self { address: Some(address), ..self.clone() }
    }
}

/// Constructor arguments of the loan contract.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoanTerms {
    /// Value of the financed asset.
    #[serde(deserialize_with = "deserialize_amount")]
    pub asset_value: U256,
    /// Amount investors must commit before the loan is funded.
    #[serde(deserialize_with = "deserialize_amount")]
    pub funding_target: U256,
    /// Interest rate as understood by the contract.
    #[serde(deserialize_with = "deserialize_amount")]
    pub interest_rate: U256,
    /// Smallest accepted investment proposal.
    #[serde(deserialize_with = "deserialize_amount")]
    pub min_investment: U256,
    /// Size of each borrower payment.
    #[serde(deserialize_with = "deserialize_amount")]
    pub payment_size: U256,
}

/// Settings file contents.
#[derive(Clone, Deserialize)]
pub struct Settings {
    /// Account that signs when no account is given.
    pub fueling_account: Address,
    /// Password used to unlock accounts when none is given.
    pub default_password: String,
    /// Gas limit for loan operations.
    pub default_gas: u64,
    /// Borrower account.
    pub borrower: Address,
    /// Seller of the financed asset.
    pub seller: Address,
    /// Known investor accounts.
    #[serde(default)]
    pub investors: Vec<Address>,
    #[serde(flatten)]
    pub terms: LoanTerms,
    /// Name of the contract entry the loan operations bind.
    #[serde(default = "default_asset_loan")]
    pub asset_loan: String,
    /// Contract artifacts by name.
    #[serde(default)]
    pub contracts: HashMap<String, ContractArtifact>,
    /// Deployment gas limit as a multiple of the estimate.
    #[serde(default = "default_gas_multiplier")]
    pub deploy_gas_multiplier: u64,
    /// How long an unlocked account stays unlocked.
    #[serde(default = "default_unlock_duration_secs")]
    pub unlock_duration_secs: u64,
    /// Interval between receipt polls while a deployment is pending.
    #[serde(default = "default_poll_interval_ms")]
    pub receipt_poll_interval_ms: u64,
    /// Give up on a pending deployment after this long.
    #[serde(default = "default_receipt_timeout_secs")]
    pub receipt_timeout_secs: u64,
    /// Interval between log filter polls.
    #[serde(default = "default_poll_interval_ms")]
    pub event_poll_interval_ms: u64,
    /// Events `listen` subscribes to.
    #[serde(default = "default_events")]
    pub events: Vec<String>,
}

fn default_asset_loan() -> String {
    "AssetLoan".to_string()
}

fn default_gas_multiplier() -> u64 {
    2
}

fn default_unlock_duration_secs() -> u64 {
    300
}

fn default_poll_interval_ms() -> u64 {
    1_000
}

fn default_receipt_timeout_secs() -> u64 {
    600
}

fn default_events() -> Vec<String> {
    LOAN_EVENTS.iter().map(|e| e.to_string()).collect()
}

impl Settings {
    /// Parse settings from a JSON document.
    pub fn from_json(json: &str) -> Result<Self, AppError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Read and parse a settings file.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Cannot read settings file {}: {}", path.display(), e))
        })?;

        let settings = Self::from_json(&json)?;
        tracing::info!(
            path = %path.display(),
            contracts = settings.contracts.len(),
            "Settings loaded"
        );
        Ok(settings)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.deploy_gas_multiplier == 0 {
            return Err(AppError::Config("deploy_gas_multiplier must be at least 1".into()));
        }
        if self.default_gas == 0 {
            return Err(AppError::Config("default_gas must be positive".into()));
        }
        if self.event_poll_interval_ms == 0 || self.receipt_poll_interval_ms == 0 {
            return Err(AppError::Config("poll intervals must be positive".into()));
        }
        Ok(())
    }

    pub fn unlock_duration(&self) -> Duration {
        Duration::from_secs(self.unlock_duration_secs)
    }

    pub fn receipt_poll_interval(&self) -> Duration {
        Duration::from_millis(self.receipt_poll_interval_ms)
    }

    pub fn receipt_timeout(&self) -> Duration {
        Duration::from_secs(self.receipt_timeout_secs)
    }

    pub fn event_poll_interval(&self) -> Duration {
        Duration::from_millis(self.event_poll_interval_ms)
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("fueling_account", &self.fueling_account)
            .field("default_gas", &self.default_gas)
            .field("borrower", &self.borrower)
            .field("seller", &self.seller)
            .field("investors", &self.investors)
            .field("terms", &self.terms)
            .field("asset_loan", &self.asset_loan)
            .field("contracts", &self.contracts.keys().collect::<Vec<_>>())
            .field("deploy_gas_multiplier", &self.deploy_gas_multiplier)
            .finish_non_exhaustive()
    }
}

fn deserialize_interface<'de, D>(deserializer: D) -> Result<Arc<JsonAbi>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let abi = match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(encoded) => serde_json::from_str::<JsonAbi>(&encoded),
        value => serde_json::from_value::<JsonAbi>(value),
    }
    .map_err(D::Error::custom)?;

    Ok(Arc::new(abi))
}

fn deserialize_optional_address<'de, D>(deserializer: D) -> Result<Option<Address>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw.trim().parse::<Address>().map(Some).map_err(D::Error::custom),
    }
}
