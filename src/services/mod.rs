//! Business logic services module.

pub mod deployer;
pub mod events;
pub mod loan;

pub use deployer::{ContractDeployer, DeployOptions, PendingDeployment};
pub use events::{EventCallback, EventRegistrar, EventSubscription};
pub use loan::LoanService;
