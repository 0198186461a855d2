use async_trait::async_trait;
use common::AggregateId;
use event_store::EventId;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};

use crate::Result;
use crate::read_model::{BankAccount, BankAccountRepository};

/// PostgreSQL-backed bank account repository.
///
/// Each mutation runs in one transaction together with an insert into
/// `projection_processed_events`; a conflict on that insert means the event
/// was already projected and the whole mutation is skipped.
#[derive(Debug, Clone)]
pub struct PostgresBankAccountRepository {
    pool: PgPool,
}

impl PostgresBankAccountRepository {
    /// Creates a new PostgreSQL repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Records the event id inside the transaction; false means the event
    /// was projected before and the caller must skip the mutation.
    async fn first_sighting(
        tx: &mut Transaction<'_, Postgres>,
        event_id: &EventId,
    ) -> Result<bool> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO projection_processed_events (event_id)
            VALUES ($1)
            ON CONFLICT (event_id) DO NOTHING
            "#,
        )
        .bind(event_id.as_uuid())
        .execute(&mut **tx)
        .await?
        .rows_affected();

        Ok(inserted > 0)
    }

    fn row_to_account(row: PgRow) -> Result<BankAccount> {
        Ok(BankAccount {
            identifier: AggregateId::from_string(row.try_get::<String, _>("identifier")?),
            account_holder: row.try_get("account_holder")?,
            account_type: row.try_get("account_type")?,
            balance: row.try_get("balance")?,
            creation_date: row.try_get("creation_date")?,
        })
    }
}

#[async_trait]
impl BankAccountRepository for PostgresBankAccountRepository {
    async fn insert_account(&self, account: BankAccount, event_id: &EventId) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        if !Self::first_sighting(&mut tx, event_id).await? {
            tx.commit().await?;
            return Ok(());
        }

        sqlx::query(
            r#"
            INSERT INTO bank_accounts (identifier, account_holder, account_type, balance, creation_date)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (identifier) DO UPDATE
            SET account_holder = EXCLUDED.account_holder,
                account_type = EXCLUDED.account_type,
                balance = EXCLUDED.balance,
                creation_date = EXCLUDED.creation_date
            "#,
        )
        .bind(account.identifier.as_str())
        .bind(&account.account_holder)
        .bind(&account.account_type)
        .bind(account.balance)
        .bind(account.creation_date)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn apply_balance_delta(
        &self,
        identifier: &AggregateId,
        delta: Decimal,
        event_id: &EventId,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        if !Self::first_sighting(&mut tx, event_id).await? {
            tx.commit().await?;
            return Ok(());
        }

        sqlx::query(
            r#"
            UPDATE bank_accounts
            SET balance = balance + $2
            WHERE identifier = $1
            "#,
        )
        .bind(identifier.as_str())
        .bind(delta)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn delete_by_identifier(
        &self,
        identifier: &AggregateId,
        event_id: &EventId,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        if !Self::first_sighting(&mut tx, event_id).await? {
            tx.commit().await?;
            return Ok(());
        }

        sqlx::query("DELETE FROM bank_accounts WHERE identifier = $1")
            .bind(identifier.as_str())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn find_all(&self) -> Result<Vec<BankAccount>> {
        let rows = sqlx::query(
            r#"
            SELECT identifier, account_holder, account_type, balance, creation_date
            FROM bank_accounts
            ORDER BY creation_date ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_account).collect()
    }

    async fn find_by_identifier(&self, identifier: &AggregateId) -> Result<Option<BankAccount>> {
        let row = sqlx::query(
            r#"
            SELECT identifier, account_holder, account_type, balance, creation_date
            FROM bank_accounts
            WHERE identifier = $1
            "#,
        )
        .bind(identifier.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_account).transpose()
    }
}
