//! Bank account aggregate implementation.

use common::AggregateId;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::aggregate::{Aggregate, AggregateRoot};

use super::events::{AccountEvent, AccountOpenedData};

/// Errors that can occur during account operations.
#[derive(Debug, Error)]
pub enum AccountError {
    /// The aggregate already has an open-account event in its history.
    #[error("Account is already opened")]
    AlreadyOpened,

    /// The operation requires an open account.
    #[error("Cannot {operation}: account is not active")]
    AccountInactive { operation: &'static str },

    /// Deposit amounts must be non-negative.
    #[error("Deposit amount must not be negative: {amount}")]
    NegativeAmount { amount: Decimal },
}

/// Bank account aggregate state.
///
/// States: Uninitialized (default) → Open (`active`) → Closed. All fields
/// change only inside [`Aggregate::apply`]; command methods live on
/// [`AggregateRoot<Account>`] and only validate and raise.
#[derive(Debug, Clone, Default)]
pub struct Account {
    id: Option<AggregateId>,
    active: bool,
    balance: Decimal,
}

impl Aggregate for Account {
    type Event = AccountEvent;
    type Error = AccountError;

    fn aggregate_type() -> &'static str {
        "BankAccount"
    }

    fn id(&self) -> Option<&AggregateId> {
        self.id.as_ref()
    }

    fn apply(&mut self, event: Self::Event) {
        match event {
            AccountEvent::AccountOpened(data) => self.apply_account_opened(data),
            AccountEvent::FundsDeposited(data) => {
                self.balance += data.amount;
            }
            AccountEvent::FundsWithdrawn(data) => {
                self.balance -= data.amount;
            }
            AccountEvent::AccountClosed(_) => {
                self.active = false;
            }
        }
    }
}

// Query methods
impl Account {
    /// Returns true while the account is open.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Returns the current balance.
    pub fn balance(&self) -> Decimal {
        self.balance
    }
}

// Apply event helpers
impl Account {
    fn apply_account_opened(&mut self, data: AccountOpenedData) {
        self.id = Some(data.account_id);
        self.active = true;
        self.balance = data.opening_balance;
    }
}

// Command methods: validate preconditions, raise the event. Balance and
// activity changes happen only in the apply rules above.
impl AggregateRoot<Account> {
    /// Opens the account.
    pub fn open(
        &mut self,
        account_id: AggregateId,
        account_holder: impl Into<String>,
        account_type: impl Into<String>,
        opening_balance: Decimal,
    ) -> Result<(), AccountError> {
        if self.state().id.is_some() {
            return Err(AccountError::AlreadyOpened);
        }

        self.raise(AccountEvent::account_opened(
            account_id,
            account_holder,
            account_type,
            opening_balance,
        ));
        Ok(())
    }

    /// Deposits funds into an active account.
    pub fn deposit(&mut self, amount: Decimal) -> Result<(), AccountError> {
        if !self.state().active {
            return Err(AccountError::AccountInactive {
                operation: "deposit funds",
            });
        }

        if amount < Decimal::ZERO {
            return Err(AccountError::NegativeAmount { amount });
        }

        self.raise(AccountEvent::funds_deposited(amount));
        Ok(())
    }

    /// Withdraws funds from an active account.
    ///
    /// There is deliberately no sufficient-funds check: overdraft is
    /// permitted and the balance may go negative.
    pub fn withdraw(&mut self, amount: Decimal) -> Result<(), AccountError> {
        if !self.state().active {
            return Err(AccountError::AccountInactive {
                operation: "withdraw funds",
            });
        }

        self.raise(AccountEvent::funds_withdrawn(amount));
        Ok(())
    }

    /// Closes an active account.
    pub fn close(&mut self) -> Result<(), AccountError> {
        if !self.state().active {
            return Err(AccountError::AccountInactive {
                operation: "close account",
            });
        }

        self.raise(AccountEvent::account_closed());
        Ok(())
    }
}
