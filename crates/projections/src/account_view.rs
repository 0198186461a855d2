//! Projection rules: one read-store mutation per account event variant.

use domain::AccountEvent;
use event_store::EventEnvelope;

use crate::Result;
use crate::read_model::{BankAccount, BankAccountRepository};

/// Applies account events to the bank account read model.
///
/// Dispatch is an explicit match over the decoded event variant:
/// - `AccountOpened` inserts the full row
/// - `FundsDeposited` / `FundsWithdrawn` apply a signed balance delta to the
///   existing row (never overwrite the balance with the raw event amount)
/// - `AccountClosed` deletes the row
///
/// The envelope's event id rides along on every call so the repository can
/// de-duplicate redeliveries.
pub struct BankAccountProjection<R: BankAccountRepository> {
    repository: R,
}

impl<R: BankAccountRepository> BankAccountProjection<R> {
    /// Creates projection rules over the given repository.
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    /// Returns a reference to the underlying repository.
    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Projects one envelope into the read store.
    pub async fn apply(&self, envelope: &EventEnvelope) -> Result<()> {
        let event: AccountEvent = serde_json::from_value(envelope.payload.clone())?;

        match event {
            AccountEvent::AccountOpened(data) => {
                let account = BankAccount {
                    identifier: envelope.aggregate_id.clone(),
                    account_holder: data.account_holder,
                    account_type: data.account_type,
                    balance: data.opening_balance,
                    creation_date: data.created_at,
                };
                self.repository
                    .insert_account(account, &envelope.event_id)
                    .await
            }
            AccountEvent::FundsDeposited(data) => {
                self.repository
                    .apply_balance_delta(&envelope.aggregate_id, data.amount, &envelope.event_id)
                    .await
            }
            AccountEvent::FundsWithdrawn(data) => {
                self.repository
                    .apply_balance_delta(&envelope.aggregate_id, -data.amount, &envelope.event_id)
                    .await
            }
            AccountEvent::AccountClosed(_) => {
                self.repository
                    .delete_by_identifier(&envelope.aggregate_id, &envelope.event_id)
                    .await
            }
        }
    }
}
