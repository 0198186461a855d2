//! Projection error types.

use thiserror::Error;

/// Errors that can occur on the read side.
#[derive(Debug, Error)]
pub enum ProjectionError {
    /// Failed to deserialize a record or event payload. The message is a
    /// poison pill: it goes to the dead-letter sink, never back on the log.
    #[error("Event deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),

    /// The read store rejected or failed a write. Treated as transient:
    /// the consumer retries before giving up.
    #[error("Read store error: {0}")]
    ReadStore(#[from] sqlx::Error),

    /// An error occurred on the event bus subscription.
    #[error("Event bus error: {0}")]
    Bus(#[from] event_bus::EventBusError),
}

impl ProjectionError {
    /// True for faults worth retrying in place (the read store may come
    /// back); false for faults that cannot succeed on retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, ProjectionError::ReadStore(_))
    }

    /// True for malformed payloads that must be dead-lettered.
    pub fn is_deserialization(&self) -> bool {
        matches!(self, ProjectionError::Deserialization(_))
    }
}

/// Result type for projection operations.
pub type Result<T> = std::result::Result<T, ProjectionError>;
