//! Domain layer for the banking event-sourcing system.
//!
//! This crate provides the write side of the system:
//! - Aggregate and DomainEvent traits plus the generic AggregateRoot
//!   raise/replay discipline
//! - The BankAccount aggregate state machine and its events
//! - CommandHandler for the load → replay → mutate → persist → publish cycle,
//!   with bounded retry on optimistic-concurrency conflicts
//! - AccountService as the per-operation facade

pub mod account;
pub mod aggregate;
pub mod command;
pub mod error;

pub use account::{
    Account, AccountClosedData, AccountError, AccountEvent, AccountOpenedData, AccountService,
    CloseAccount, DepositFunds, FundsDepositedData, FundsWithdrawnData, OpenAccount, WithdrawFunds,
};
pub use aggregate::{Aggregate, AggregateRoot, DomainEvent};
pub use command::{Command, CommandHandler, CommandResult};
pub use error::DomainError;
