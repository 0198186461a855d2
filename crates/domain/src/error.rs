//! Domain error types.

use event_bus::EventBusError;
use event_store::EventStoreError;
use thiserror::Error;

use crate::account::AccountError;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A business rule or validation failure on the account aggregate.
    #[error("Account error: {0}")]
    Account(#[from] AccountError),

    /// An error occurred in the event store.
    #[error("Event store error: {0}")]
    EventStore(#[from] EventStoreError),

    /// Publishing to the durable log failed. The triggering append already
    /// succeeded, so the caller must treat the command as durable but
    /// unpropagated.
    #[error("Event publish failed after append: {0}")]
    Publish(#[from] EventBusError),

    /// A stored event could not be decoded during replay. This signals
    /// store corruption or schema drift and is never ignored.
    #[error("Unknown or corrupt event '{event_type}' in stream: {source}")]
    UnknownEvent {
        event_type: String,
        #[source]
        source: serde_json::Error,
    },

    /// Serialization error while building envelopes.
    #[error("Serialization error: {0}")]
    Serialization(serde_json::Error),
}

impl DomainError {
    /// True if the error is an optimistic-concurrency conflict that survived
    /// the handler's bounded retry.
    pub fn is_concurrency_conflict(&self) -> bool {
        matches!(
            self,
            DomainError::EventStore(EventStoreError::ConcurrencyConflict { .. })
        )
    }
}
