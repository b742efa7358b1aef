//! Contract address table.
//!
//! The only state that changes after startup: deployments record new
//! addresses here while the binder reads them.

use std::collections::HashMap;

use alloy::primitives::Address;
use tokio::sync::RwLock;

use super::ContractArtifact;
use crate::error::{AppError, Result};

/// Shared, injectable table of contract artifacts keyed by name.
#[derive(Debug, Default)]
pub struct ContractStore {
    contracts: RwLock<HashMap<String, ContractArtifact>>,
}

impl ContractStore {
    /// Create a store seeded with the configured contracts.
    pub fn new(contracts: HashMap<String, ContractArtifact>) -> Self {
        Self { contracts: RwLock::new(contracts) }
    }

    /// Artifact registered under `name`.
    pub async fn artifact(&self, name: &str) -> Option<ContractArtifact> {
        self.contracts.read().await.get(name).cloned()
    }

    /// Deployed address of `name`, if any.
    pub async fn address(&self, name: &str) -> Option<Address> {
        self.contracts.read().await.get(name).and_then(|artifact| artifact.address)
    }

    /// All registered contract names, sorted.
    pub async fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.contracts.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    /// Record that `source` was deployed at `address` under `id`.
    ///
    /// An existing `id` entry only has its address replaced; otherwise a new
    /// entry is created from `source`'s artifact.
    pub async fn record_deployment(&self, source: &str, id: &str, address: Address) -> Result<()> {
        let mut contracts = self.contracts.write().await;

        if let Some(existing) = contracts.get_mut(id) {
            existing.address = Some(address);
        } else {
            let artifact = contracts
                .get(source)
                .ok_or_else(|| AppError::ContractNotConfigured(source.to_string()))?
                .at(address);
            contracts.insert(id.to_string(), artifact);
        }

        tracing::debug!(contract = %source, id = %id, address = %address, "Recorded deployment");
        Ok(())
    }
}
