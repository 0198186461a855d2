//! The bank account read row and its repository trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::AggregateId;
use event_store::EventId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::Result;

/// A bank account as materialized for queries.
///
/// Owned exclusively by the projection consumer; eventually consistent with
/// the write-side event stream and may lag arbitrarily while the consumer is
/// down.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankAccount {
    /// The aggregate identifier of the account.
    pub identifier: AggregateId,

    /// Name of the account holder.
    pub account_holder: String,

    /// Kind of account (e.g. "Savings", "Current").
    pub account_type: String,

    /// Current balance.
    pub balance: Decimal,

    /// When the account was opened.
    pub creation_date: DateTime<Utc>,
}

/// Query-side store for bank account rows.
///
/// Delivery from the log is at-least-once, so every mutating operation
/// carries the event identifier that caused it and must be idempotent: a
/// repeated event id is silently skipped. Implementations make the
/// processed-id record and the row change atomic with respect to each other.
#[async_trait]
pub trait BankAccountRepository: Send + Sync {
    /// Inserts the row for a newly opened account.
    async fn insert_account(&self, account: BankAccount, event_id: &EventId) -> Result<()>;

    /// Applies a signed balance delta to an existing row.
    ///
    /// An unknown identifier is a no-op: the row may already have been
    /// deleted by a close event that overtook this one on another partition.
    async fn apply_balance_delta(
        &self,
        identifier: &AggregateId,
        delta: Decimal,
        event_id: &EventId,
    ) -> Result<()>;

    /// Deletes the row for a closed account.
    async fn delete_by_identifier(&self, identifier: &AggregateId, event_id: &EventId)
    -> Result<()>;

    /// Returns all account rows.
    async fn find_all(&self) -> Result<Vec<BankAccount>>;

    /// Returns the row for one account, or None if unknown.
    async fn find_by_identifier(&self, identifier: &AggregateId) -> Result<Option<BankAccount>>;
}
