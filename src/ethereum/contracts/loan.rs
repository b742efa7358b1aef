//! Asset loan contract surface.

use alloy::{dyn_abi::DynSolValue, primitives::Address};

use crate::config::LoanTerms;

/// Borrower deposits funds.
pub const FUNDS_ADD: &str = "fundsAdd";

/// Investor proposes an investment.
pub const INVESTMENT_PROPOSAL_ADD: &str = "investmentProposalAdd";

/// Fueling account approves an investor's proposal.
pub const INVESTMENT_PROPOSAL_APPROVE: &str = "investmentProposalApprove";

/// Borrower executes the next payment.
pub const PAYMENT_EXECUTE: &str = "paymentExecute";

/// Constructor arguments in declaration order:
/// `(assetValue, fundingTarget, interestRate, minInvestment, paymentSize, borrower, seller)`.
pub fn constructor_args(terms: &LoanTerms, borrower: Address, seller: Address) -> Vec<DynSolValue> {
    vec![
        DynSolValue::Uint(terms.asset_value, 256),
        DynSolValue::Uint(terms.funding_target, 256),
        DynSolValue::Uint(terms.interest_rate, 256),
        DynSolValue::Uint(terms.min_investment, 256),
        DynSolValue::Uint(terms.payment_size, 256),
        DynSolValue::Address(borrower),
        DynSolValue::Address(seller),
    ]
}
