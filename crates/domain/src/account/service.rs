//! Account service providing a per-operation API over the command handler.

use common::AggregateId;
use event_bus::EventPublisher;
use event_store::EventStore;

use crate::command::{CommandHandler, CommandResult};
use crate::error::DomainError;

use super::{Account, CloseAccount, DepositFunds, OpenAccount, WithdrawFunds};

/// Service for managing bank accounts.
///
/// One method per write operation, each running a full
/// load → replay → mutate → persist → publish cycle through the handler.
/// The service holds no aggregate state between calls.
pub struct AccountService<S: EventStore, P: EventPublisher> {
    handler: CommandHandler<S, P, Account>,
}

impl<S: EventStore, P: EventPublisher> AccountService<S, P> {
    /// Creates a new account service over the given store and publisher.
    pub fn new(store: S, publisher: P) -> Self {
        Self {
            handler: CommandHandler::new(store, publisher),
        }
    }

    /// Returns a reference to the underlying command handler.
    pub fn handler(&self) -> &CommandHandler<S, P, Account> {
        &self.handler
    }

    /// Opens a new account and returns its identifier in the result.
    #[tracing::instrument(skip(self))]
    pub async fn open_account(
        &self,
        cmd: OpenAccount,
    ) -> Result<CommandResult<Account>, DomainError> {
        let account_id = cmd.account_id.clone();
        self.handler
            .execute(&account_id, |root| {
                root.open(
                    cmd.account_id.clone(),
                    cmd.account_holder.clone(),
                    cmd.account_type.clone(),
                    cmd.opening_balance,
                )
            })
            .await
    }

    /// Deposits funds into an account.
    #[tracing::instrument(skip(self))]
    pub async fn deposit_funds(
        &self,
        cmd: DepositFunds,
    ) -> Result<CommandResult<Account>, DomainError> {
        self.handler
            .execute(&cmd.account_id, |root| root.deposit(cmd.amount))
            .await
    }

    /// Withdraws funds from an account.
    #[tracing::instrument(skip(self))]
    pub async fn withdraw_funds(
        &self,
        cmd: WithdrawFunds,
    ) -> Result<CommandResult<Account>, DomainError> {
        self.handler
            .execute(&cmd.account_id, |root| root.withdraw(cmd.amount))
            .await
    }

    /// Closes an account.
    #[tracing::instrument(skip(self))]
    pub async fn close_account(
        &self,
        cmd: CloseAccount,
    ) -> Result<CommandResult<Account>, DomainError> {
        self.handler
            .execute(&cmd.account_id, |root| root.close())
            .await
    }

    /// Loads an account by replaying its stream.
    ///
    /// Returns None if the account doesn't exist. Diagnostic use only:
    /// queries are served from the read store, never from here.
    #[tracing::instrument(skip(self))]
    pub async fn get_account(
        &self,
        account_id: &AggregateId,
    ) -> Result<Option<Account>, DomainError> {
        self.handler.load_existing(account_id).await
    }
}
