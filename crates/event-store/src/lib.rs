//! Durable event storage for the banking write side.
//!
//! The store keeps one append-only, strictly ordered stream of
//! [`EventEnvelope`]s per aggregate identifier. Appends carry an expected
//! version for optimistic concurrency: a mismatch is a
//! [`EventStoreError::ConcurrencyConflict`], never a silent overwrite.

pub mod error;
pub mod event;
pub mod memory;
pub mod postgres;
pub mod store;

pub use common::AggregateId;
pub use error::{EventStoreError, Result};
pub use event::{EventEnvelope, EventEnvelopeBuilder, EventId, Version};
pub use memory::InMemoryEventStore;
pub use postgres::PostgresEventStore;
pub use store::{AppendOptions, EventStore};
