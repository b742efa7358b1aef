//! Contract event listeners.

use std::sync::Arc;

use alloy::{
    dyn_abi::EventExt,
    json_abi::Event,
    primitives::Address,
    rpc::types::{Filter, Log},
};
use futures_util::StreamExt;
use tokio::task::JoinHandle;

use crate::{
    error::Result,
    ethereum::{ContractHandle, NodeRpc},
    types::ContractEvent,
};

/// Receives every occurrence of a watched event, or the error that
/// prevented delivering it.
pub type EventCallback = Arc<dyn Fn(Result<ContractEvent>) + Send + Sync>;

/// A registered listener. It keeps running for the life of the node
/// connection whether or not this value is kept.
#[derive(Debug)]
pub struct EventSubscription {
    contract: Address,
    event: String,
    task: JoinHandle<()>,
}

impl EventSubscription {
    /// Watched contract.
    pub fn contract(&self) -> Address {
        self.contract
    }

    /// Watched event name.
    pub fn event(&self) -> &str {
        &self.event
    }

    /// Whether the node is still delivering logs to this listener.
    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }
}

/// Attaches listeners to contract events.
///
/// Registrations are independent: registering the same event twice yields
/// two deliveries per occurrence.
#[derive(Clone)]
pub struct EventRegistrar {
    node: Arc<dyn NodeRpc>,
}

impl EventRegistrar {
    pub fn new(node: Arc<dyn NodeRpc>) -> Self {
        Self { node }
    }

    /// Watch `event_name` on `contract`, delivering each occurrence to
    /// `callback`, or logging it when no callback is given.
    pub async fn register_listener(
        &self,
        contract: &ContractHandle,
        event_name: &str,
        callback: Option<EventCallback>,
    ) -> Result<EventSubscription> {
        let event = contract.event(event_name)?.clone();
        let filter = Filter::new().address(contract.address()).event_signature(event.selector());

        let mut logs = self.node.watch_logs(&filter).await?;
        let callback: EventCallback = match callback {
            Some(callback) => callback,
            None => Arc::new(log_event),
        };

        tracing::info!(
            contract = %contract.name(),
            address = %contract.address(),
            event = %event.name,
            "Listening for contract event"
        );

        let task = tokio::spawn(async move {
            while let Some(log) = logs.next().await {
                callback(log.and_then(|log| decode_event(&event, &log)));
            }
            tracing::debug!(event = %event.name, "Event stream ended");
        });

        Ok(EventSubscription {
            contract: contract.address(),
            event: event_name.to_string(),
            task,
        })
    }

    /// Register the default listener for each of `events`.
    pub async fn register_all<S: AsRef<str>>(
        &self,
        contract: &ContractHandle,
        events: &[S],
    ) -> Result<Vec<EventSubscription>> {
        let mut subscriptions = Vec::with_capacity(events.len());
        for event in events {
            subscriptions.push(self.register_listener(contract, event.as_ref(), None).await?);
        }
        Ok(subscriptions)
    }
}

/// Decode `log` as an occurrence of `event`.
pub fn decode_event(event: &Event, log: &Log) -> Result<ContractEvent> {
    let decoded = event.decode_log(&log.inner.data)?;

    Ok(ContractEvent {
        event: event.name.clone(),
        address: log.address(),
        transaction_hash: log.transaction_hash,
        block_number: log.block_number,
        indexed: decoded.indexed,
        body: decoded.body,
    })
}

fn log_event(result: Result<ContractEvent>) {
    match result {
        Ok(event) => tracing::info!(
            event = %event.event,
            address = %event.address,
            tx_hash = ?event.transaction_hash,
            indexed = ?event.indexed,
            body = ?event.body,
            "Event fired"
        ),
        Err(e) => tracing::error!(error = %e, "Event delivery failed"),
    }
}
