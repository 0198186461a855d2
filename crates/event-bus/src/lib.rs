//! Durable event log abstraction connecting the write side to the read side.
//!
//! The write side publishes committed events through an [`EventPublisher`];
//! the projection consumer subscribes via [`EventBus::subscribe`] and polls a
//! [`Subscription`]. The log is partitioned by record key (the aggregate
//! identifier), so per-account ordering is preserved end to end. Delivery is
//! at-least-once: a record is redelivered to a group until its offset is
//! committed.

pub mod bus;
pub mod error;
pub mod memory;
pub mod publisher;

pub use bus::{EventBus, Record, Subscription};
pub use error::{EventBusError, Result};
pub use memory::InMemoryEventBus;
pub use publisher::{BusEventPublisher, EventPublisher};
