//! Bank account commands.

use common::AggregateId;
use rust_decimal::Decimal;

use crate::command::Command;

use super::Account;

/// Command to open a new bank account.
#[derive(Debug, Clone)]
pub struct OpenAccount {
    /// The identifier allocated for the new account.
    pub account_id: AggregateId,

    /// Name of the account holder.
    pub account_holder: String,

    /// Kind of account (e.g. "Savings", "Current").
    pub account_type: String,

    /// Balance the account starts with.
    pub opening_balance: Decimal,
}

impl OpenAccount {
    /// Creates an OpenAccount command with a freshly allocated identifier.
    pub fn new(
        account_holder: impl Into<String>,
        account_type: impl Into<String>,
        opening_balance: Decimal,
    ) -> Self {
        Self {
            account_id: AggregateId::new(),
            account_holder: account_holder.into(),
            account_type: account_type.into(),
            opening_balance,
        }
    }

    /// Creates an OpenAccount command for a caller-supplied identifier.
    pub fn with_id(
        account_id: AggregateId,
        account_holder: impl Into<String>,
        account_type: impl Into<String>,
        opening_balance: Decimal,
    ) -> Self {
        Self {
            account_id,
            account_holder: account_holder.into(),
            account_type: account_type.into(),
            opening_balance,
        }
    }
}

impl Command for OpenAccount {
    type Aggregate = Account;

    fn aggregate_id(&self) -> &AggregateId {
        &self.account_id
    }
}

/// Command to deposit funds into an account.
#[derive(Debug, Clone)]
pub struct DepositFunds {
    /// The account to deposit into.
    pub account_id: AggregateId,

    /// Amount to deposit.
    pub amount: Decimal,
}

impl DepositFunds {
    /// Creates a new DepositFunds command.
    pub fn new(account_id: AggregateId, amount: Decimal) -> Self {
        Self { account_id, amount }
    }
}

impl Command for DepositFunds {
    type Aggregate = Account;

    fn aggregate_id(&self) -> &AggregateId {
        &self.account_id
    }
}

/// Command to withdraw funds from an account.
#[derive(Debug, Clone)]
pub struct WithdrawFunds {
    /// The account to withdraw from.
    pub account_id: AggregateId,

    /// Amount to withdraw.
    pub amount: Decimal,
}

impl WithdrawFunds {
    /// Creates a new WithdrawFunds command.
    pub fn new(account_id: AggregateId, amount: Decimal) -> Self {
        Self { account_id, amount }
    }
}

impl Command for WithdrawFunds {
    type Aggregate = Account;

    fn aggregate_id(&self) -> &AggregateId {
        &self.account_id
    }
}

/// Command to close an account.
#[derive(Debug, Clone)]
pub struct CloseAccount {
    /// The account to close.
    pub account_id: AggregateId,
}

impl CloseAccount {
    /// Creates a new CloseAccount command.
    pub fn new(account_id: AggregateId) -> Self {
        Self { account_id }
    }
}

impl Command for CloseAccount {
    type Aggregate = Account;

    fn aggregate_id(&self) -> &AggregateId {
        &self.account_id
    }
}
