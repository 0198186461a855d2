//! Bank account command and query endpoints.
//!
//! Commands go through the write-side [`AccountService`]; queries read the
//! read store only, so a row may lag a just-completed command.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::AggregateId;
use domain::{AccountService, CloseAccount, DepositFunds, OpenAccount, WithdrawFunds};
use event_bus::EventPublisher;
use event_store::EventStore;
use projections::{BankAccount, BankAccountRepository};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S, P, R>
where
    S: EventStore,
    P: EventPublisher,
    R: BankAccountRepository,
{
    pub account_service: AccountService<S, P>,
    pub repository: R,
}

// -- Request types --

#[derive(Deserialize)]
pub struct OpenAccountRequest {
    pub account_holder: String,
    pub account_type: String,
    pub opening_balance: Decimal,
}

#[derive(Deserialize)]
pub struct AmountRequest {
    pub amount: Decimal,
}

// -- Response types --

#[derive(Serialize)]
pub struct AccountOpenedResponse {
    pub account_id: String,
}

#[derive(Serialize)]
pub struct OperationResponse {
    pub account_id: String,
    pub new_version: i64,
}

#[derive(Serialize)]
pub struct BankAccountResponse {
    pub identifier: String,
    pub account_holder: String,
    pub account_type: String,
    pub balance: Decimal,
    pub creation_date: DateTime<Utc>,
}

impl From<BankAccount> for BankAccountResponse {
    fn from(account: BankAccount) -> Self {
        Self {
            identifier: account.identifier.to_string(),
            account_holder: account.account_holder,
            account_type: account.account_type,
            balance: account.balance,
            creation_date: account.creation_date,
        }
    }
}

// -- Handlers --

/// POST /api/v1/accounts — open a new account.
#[tracing::instrument(skip(state, req))]
pub async fn open<S, P, R>(
    State(state): State<Arc<AppState<S, P, R>>>,
    Json(req): Json<OpenAccountRequest>,
) -> Result<(StatusCode, Json<AccountOpenedResponse>), ApiError>
where
    S: EventStore + 'static,
    P: EventPublisher + 'static,
    R: BankAccountRepository + 'static,
{
    let cmd = OpenAccount::new(req.account_holder, req.account_type, req.opening_balance);
    let account_id = cmd.account_id.clone();
    state.account_service.open_account(cmd).await?;

    Ok((
        StatusCode::CREATED,
        Json(AccountOpenedResponse {
            account_id: account_id.to_string(),
        }),
    ))
}

/// PUT /api/v1/accounts/:id/deposit — deposit funds.
#[tracing::instrument(skip(state, req))]
pub async fn deposit<S, P, R>(
    State(state): State<Arc<AppState<S, P, R>>>,
    Path(id): Path<String>,
    Json(req): Json<AmountRequest>,
) -> Result<Json<OperationResponse>, ApiError>
where
    S: EventStore + 'static,
    P: EventPublisher + 'static,
    R: BankAccountRepository + 'static,
{
    let account_id = AggregateId::from_string(id);
    let result = state
        .account_service
        .deposit_funds(DepositFunds::new(account_id.clone(), req.amount))
        .await?;

    Ok(Json(OperationResponse {
        account_id: account_id.to_string(),
        new_version: result.new_version.as_i64(),
    }))
}

/// PUT /api/v1/accounts/:id/withdraw — withdraw funds.
#[tracing::instrument(skip(state, req))]
pub async fn withdraw<S, P, R>(
    State(state): State<Arc<AppState<S, P, R>>>,
    Path(id): Path<String>,
    Json(req): Json<AmountRequest>,
) -> Result<Json<OperationResponse>, ApiError>
where
    S: EventStore + 'static,
    P: EventPublisher + 'static,
    R: BankAccountRepository + 'static,
{
    let account_id = AggregateId::from_string(id);
    let result = state
        .account_service
        .withdraw_funds(WithdrawFunds::new(account_id.clone(), req.amount))
        .await?;

    Ok(Json(OperationResponse {
        account_id: account_id.to_string(),
        new_version: result.new_version.as_i64(),
    }))
}

/// DELETE /api/v1/accounts/:id — close the account.
#[tracing::instrument(skip(state))]
pub async fn close<S, P, R>(
    State(state): State<Arc<AppState<S, P, R>>>,
    Path(id): Path<String>,
) -> Result<Json<OperationResponse>, ApiError>
where
    S: EventStore + 'static,
    P: EventPublisher + 'static,
    R: BankAccountRepository + 'static,
{
    let account_id = AggregateId::from_string(id);
    let result = state
        .account_service
        .close_account(CloseAccount::new(account_id.clone()))
        .await?;

    Ok(Json(OperationResponse {
        account_id: account_id.to_string(),
        new_version: result.new_version.as_i64(),
    }))
}

/// GET /api/v1/accounts — list all accounts from the read store.
#[tracing::instrument(skip(state))]
pub async fn list<S, P, R>(
    State(state): State<Arc<AppState<S, P, R>>>,
) -> Result<Json<Vec<BankAccountResponse>>, ApiError>
where
    S: EventStore + 'static,
    P: EventPublisher + 'static,
    R: BankAccountRepository + 'static,
{
    let accounts = state.repository.find_all().await?;
    Ok(Json(accounts.into_iter().map(Into::into).collect()))
}

/// GET /api/v1/accounts/:id — fetch one account from the read store.
#[tracing::instrument(skip(state))]
pub async fn get<S, P, R>(
    State(state): State<Arc<AppState<S, P, R>>>,
    Path(id): Path<String>,
) -> Result<Json<BankAccountResponse>, ApiError>
where
    S: EventStore + 'static,
    P: EventPublisher + 'static,
    R: BankAccountRepository + 'static,
{
    let account_id = AggregateId::from_string(id);
    let account = state
        .repository
        .find_by_identifier(&account_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Account {account_id} not found")))?;

    Ok(Json(account.into()))
}
