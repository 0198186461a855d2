//! Bank account aggregate and related types.

mod aggregate;
mod commands;
mod events;
mod service;

pub use aggregate::{Account, AccountError};
pub use commands::{CloseAccount, DepositFunds, OpenAccount, WithdrawFunds};
pub use events::{
    AccountClosedData, AccountEvent, AccountOpenedData, FundsDepositedData, FundsWithdrawnData,
};
pub use service::AccountService;
