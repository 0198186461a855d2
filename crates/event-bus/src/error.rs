use thiserror::Error;

/// Errors that can occur when interacting with the event bus.
#[derive(Debug, Error)]
pub enum EventBusError {
    /// The broker could not be reached or rejected the operation.
    #[error("Event bus unavailable: {0}")]
    Unavailable(String),

    /// The subscription has been closed; no further polls are possible.
    #[error("Subscription is closed")]
    Closed,

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for event bus operations.
pub type Result<T> = std::result::Result<T, EventBusError>;
