//! Bank account domain events.

use chrono::{DateTime, Utc};
use common::AggregateId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;

/// Events that can occur on a bank account aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum AccountEvent {
    /// Account was opened.
    AccountOpened(AccountOpenedData),

    /// Funds were deposited into the account.
    FundsDeposited(FundsDepositedData),

    /// Funds were withdrawn from the account.
    FundsWithdrawn(FundsWithdrawnData),

    /// Account was closed.
    AccountClosed(AccountClosedData),
}

impl DomainEvent for AccountEvent {
    fn event_type(&self) -> &'static str {
        match self {
            AccountEvent::AccountOpened(_) => "AccountOpened",
            AccountEvent::FundsDeposited(_) => "FundsDeposited",
            AccountEvent::FundsWithdrawn(_) => "FundsWithdrawn",
            AccountEvent::AccountClosed(_) => "AccountClosed",
        }
    }
}

impl AccountEvent {
    /// The full set of account topics, one per event variant.
    ///
    /// This is the subscription list for the projection consumer.
    pub fn topics() -> [&'static str; 4] {
        [
            "AccountOpened",
            "AccountClosed",
            "FundsDeposited",
            "FundsWithdrawn",
        ]
    }
}

/// Data for AccountOpened event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountOpenedData {
    /// The identifier allocated to the new account.
    pub account_id: AggregateId,

    /// Name of the account holder.
    pub account_holder: String,

    /// Kind of account (e.g. "Savings", "Current").
    pub account_type: String,

    /// Balance the account starts with.
    pub opening_balance: Decimal,

    /// When the account was opened.
    pub created_at: DateTime<Utc>,
}

/// Data for FundsDeposited event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundsDepositedData {
    /// Amount deposited.
    pub amount: Decimal,
}

/// Data for FundsWithdrawn event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundsWithdrawnData {
    /// Amount withdrawn.
    pub amount: Decimal,
}

/// Data for AccountClosed event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountClosedData {
    /// When the account was closed.
    pub closed_at: DateTime<Utc>,
}

// Convenience constructors for events
impl AccountEvent {
    /// Creates an AccountOpened event.
    pub fn account_opened(
        account_id: AggregateId,
        account_holder: impl Into<String>,
        account_type: impl Into<String>,
        opening_balance: Decimal,
    ) -> Self {
        AccountEvent::AccountOpened(AccountOpenedData {
            account_id,
            account_holder: account_holder.into(),
            account_type: account_type.into(),
            opening_balance,
            created_at: Utc::now(),
        })
    }

    /// Creates a FundsDeposited event.
    pub fn funds_deposited(amount: Decimal) -> Self {
        AccountEvent::FundsDeposited(FundsDepositedData { amount })
    }

    /// Creates a FundsWithdrawn event.
    pub fn funds_withdrawn(amount: Decimal) -> Self {
        AccountEvent::FundsWithdrawn(FundsWithdrawnData { amount })
    }

    /// Creates an AccountClosed event.
    pub fn account_closed() -> Self {
        AccountEvent::AccountClosed(AccountClosedData {
            closed_at: Utc::now(),
        })
    }
}
