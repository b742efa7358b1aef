//! Integration tests for contract binding.
//!
//! Run with: `cargo test --test test_binder`

mod common;

use alloy::{
    dyn_abi::DynSolValue,
    primitives::{address, Address, TxKind, U256},
};
use common::{client, BORROWER, LOAN_ADDRESS};
use loan_contract_client::{types::TxOptions, AppError};

/// Scenario: a contract without an address binds to nothing.
#[tokio::test]
async fn test_load_contract_without_address_is_none() {
    let (client, node) = client(None);

    assert!(client.binder().load_contract("AssetLoan").await.is_none());
    assert!(node.unlocks().is_empty());
}

/// An unknown name binds to nothing rather than failing.
#[tokio::test]
async fn test_load_contract_unknown_name_is_none() {
    let (client, _) = client(Some(LOAN_ADDRESS));

    assert!(client.binder().load_contract("Registry").await.is_none());
}

#[tokio::test]
async fn test_bind_distinguishes_missing_and_undeployed() {
    let (client, _) = client(None);

    let missing = client.binder().bind("Registry").await;
    assert!(matches!(missing, Err(AppError::ContractNotConfigured(name)) if name == "Registry"));

    let undeployed = client.binder().bind("AssetLoan").await;
    assert!(matches!(undeployed, Err(AppError::ContractUnbound(name)) if name == "AssetLoan"));
}

#[tokio::test]
async fn test_load_contract_with_address() {
    let (client, _) = client(Some(LOAN_ADDRESS));

    let handle = client.binder().load_contract("AssetLoan").await.unwrap();

    assert_eq!(handle.address(), LOAN_ADDRESS);
    assert_eq!(handle.name(), "AssetLoan");
    assert!(handle.abi().function("fundsAdd").is_some());
}

/// Repeated lookups reuse the binding until the address changes.
#[tokio::test]
async fn test_binding_cache_invalidated_on_new_address() {
    let (client, _) = client(Some(LOAN_ADDRESS));
    let binder = client.binder();

    binder.bind("AssetLoan").await.unwrap();
    binder.bind("AssetLoan").await.unwrap();
    assert_eq!(binder.stats().lookups, 2);
    assert_eq!(binder.stats().cache_hits, 1);

    let redeployed = address!("0000000000000000000000000000000000009999");
    client.store().record_deployment("AssetLoan", "AssetLoan", redeployed).await.unwrap();

    let handle = binder.bind("AssetLoan").await.unwrap();
    assert_eq!(handle.address(), redeployed);
    assert_eq!(binder.stats().cache_hits, 1);
}

#[tokio::test]
async fn test_call_decodes_outputs() {
    let (client, node) = client(Some(LOAN_ADDRESS));
    let handle = client.binder().bind("AssetLoan").await.unwrap();

    let output = handle.call("paymentExecute", &[], Some(BORROWER)).await.unwrap();

    assert_eq!(output, vec![DynSolValue::Bool(true)]);
    let calls = node.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].from, Some(BORROWER));
    assert_eq!(calls[0].to, Some(TxKind::Call(LOAN_ADDRESS)));
    assert!(node.sent().is_empty());
}

#[tokio::test]
async fn test_send_transaction_builds_request() {
    let (client, node) = client(Some(LOAN_ADDRESS));
    let handle = client.binder().bind("AssetLoan").await.unwrap();
    let investor = address!("00000000000000000000000000000000000000a9");

    let args = [DynSolValue::Address(investor)];
    let opts = TxOptions::new(BORROWER).with_gas(90_000).with_value(U256::from(7u64));
    handle.send_transaction("investmentProposalApprove", &args, opts).await.unwrap();

    let sent = node.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].gas, Some(90_000));
    assert_eq!(sent[0].value, Some(U256::from(7u64)));

    let expected = handle.encode_call("investmentProposalApprove", &args).unwrap();
    assert_eq!(sent[0].input.input(), Some(&expected));
    // selector followed by one address word
    assert_eq!(expected.len(), 4 + 32);
}

#[tokio::test]
async fn test_unknown_method_is_rejected_before_sending() {
    let (client, node) = client(Some(LOAN_ADDRESS));
    let handle = client.binder().bind("AssetLoan").await.unwrap();

    let result = handle.send_transaction("withdraw", &[], TxOptions::new(Address::ZERO)).await;

    assert!(matches!(result, Err(AppError::UnknownMethod { method, .. }) if method == "withdraw"));
    assert!(node.sent().is_empty());
}

#[tokio::test]
async fn test_wrong_argument_type_is_abi_error() {
    let (client, _) = client(Some(LOAN_ADDRESS));
    let handle = client.binder().bind("AssetLoan").await.unwrap();

    let result =
        handle.encode_call("investmentProposalApprove", &[DynSolValue::Bool(true)]);

    assert!(matches!(result, Err(AppError::Abi(_))));
}
