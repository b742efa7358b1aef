//! Loan transaction operations.

use std::sync::Arc;

use alloy::{
    dyn_abi::DynSolValue,
    primitives::{Address, TxHash, U256},
};

use crate::{
    error::Result,
    ethereum::{contracts::loan, AccountManager, ContractBinder, ContractHandle},
    types::{format_units, TxOptions, ETHER_DECIMALS},
};

/// Named operations on the deployed loan contract.
///
/// Each operation binds the contract first, so nothing is unlocked or sent
/// while the contract is not deployed, then resolves its signer and submits
/// one transaction. Failures are returned, never retried.
#[derive(Clone)]
pub struct LoanService {
    binder: Arc<ContractBinder>,
    accounts: AccountManager,
    /// Contract entry the operations bind.
    contract: String,
    borrower: Address,
    default_gas: u64,
}

impl LoanService {
    /// Create a loan service bound to the `contract` entry.
    pub fn new(
        binder: Arc<ContractBinder>,
        accounts: AccountManager,
        contract: impl Into<String>,
        borrower: Address,
        default_gas: u64,
    ) -> Self {
        Self { binder, accounts, contract: contract.into(), borrower, default_gas }
    }

    /// Contract entry name.
    pub fn contract(&self) -> &str {
        &self.contract
    }

    /// Borrower adds `amount` wei of funds.
    pub async fn add_funds(&self, amount: U256) -> Result<TxHash> {
        tracing::info!(amount = %amount, ether = %format_units(amount, ETHER_DECIMALS), "Adding funds");

        let contract = self.bind().await?;
        let owner = self.accounts.resolve_account(Some(self.borrower), None).await?;

        contract.send_transaction(loan::FUNDS_ADD, &[], self.options(owner).with_value(amount)).await
    }

    /// `investor` proposes to invest `amount` wei.
    pub async fn propose_investment(&self, investor: Address, amount: U256) -> Result<TxHash> {
        tracing::info!(investor = %investor, amount = %amount, "Adding investment proposal");

        let contract = self.bind().await?;
        let owner = self.accounts.resolve_account(Some(investor), None).await?;

        contract
            .send_transaction(
                loan::INVESTMENT_PROPOSAL_ADD,
                &[],
                self.options(owner).with_value(amount),
            )
            .await
    }

    /// The fueling account approves `investor`'s proposal.
    pub async fn approve_investment(&self, investor: Address) -> Result<TxHash> {
        tracing::info!(investor = %investor, "Approving investment proposal");

        let contract = self.bind().await?;
        let owner = self.accounts.resolve_account(None, None).await?;

        contract
            .send_transaction(
                loan::INVESTMENT_PROPOSAL_APPROVE,
                &[DynSolValue::Address(investor)],
                self.options(owner),
            )
            .await
    }

    /// Borrower executes the next payment.
    ///
    /// The payment is dry-run with a local call first; its outcome is only
    /// logged.
    pub async fn execute_payment(&self) -> Result<TxHash> {
        tracing::info!("Executing payment");

        let contract = self.bind().await?;
        let owner = self.accounts.resolve_account(Some(self.borrower), None).await?;

        match contract.call(loan::PAYMENT_EXECUTE, &[], Some(owner)).await {
            Ok(output) => tracing::info!(output = ?output, "Payment dry run"),
            Err(e) => tracing::warn!(error = %e, "Payment dry run failed"),
        }

        contract.send_transaction(loan::PAYMENT_EXECUTE, &[], self.options(owner)).await
    }

    async fn bind(&self) -> Result<ContractHandle> {
        self.binder.bind(&self.contract).await
    }

    fn options(&self, from: Address) -> TxOptions {
        TxOptions::new(from).with_gas(self.default_gas)
    }
}
