//! Read models and projections for the CQRS query side.
//!
//! This crate owns the query-side `bank_accounts` view and the machinery
//! that keeps it eventually consistent with the write-side event log:
//! - [`BankAccount`] row and the [`BankAccountRepository`] trait, with
//!   in-memory and PostgreSQL implementations whose mutations are idempotent
//!   by event identifier
//! - [`BankAccountProjection`], the per-event-type projection rules
//! - [`ProjectionConsumer`], the long-running cancellable subscriber that
//!   polls the durable log, projects each event, and commits its offset only
//!   after the read-store write succeeded
//! - [`DeadLetterSink`] for malformed payloads, preserved rather than dropped

pub mod account_view;
pub mod consumer;
pub mod dead_letter;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod read_model;

pub use account_view::BankAccountProjection;
pub use consumer::ProjectionConsumer;
pub use dead_letter::{DeadLetter, DeadLetterSink, InMemoryDeadLetterSink};
pub use error::{ProjectionError, Result};
pub use memory::InMemoryBankAccountRepository;
pub use postgres::PostgresBankAccountRepository;
pub use read_model::{BankAccount, BankAccountRepository};
