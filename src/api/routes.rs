//! API Routes
//!
//! HTTP endpoint definitions. Handlers marshal parameters, call the
//! engine or a lifecycle service, and map results to response DTOs.

use std::collections::HashMap;
use std::str::FromStr;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Account, TransactionRecord, User};
use crate::error::{AppError, AppResult};
use crate::rates::CancelToken;
use crate::service::UserFields;

use super::AppState;

// =========================================================================
// Request/Response types
// =========================================================================

#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    pub from_account_id: Uuid,
    pub to_account_id: Uuid,
    pub amount: String,
}

#[derive(Debug, Deserialize)]
pub struct AmountRequest {
    pub amount: String,
}

#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    #[serde(rename = "type")]
    pub transaction_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_account: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_account: Option<Uuid>,
    pub amount: Decimal,
    pub currency: String,
}

impl From<TransactionRecord> for TransactionResponse {
    fn from(record: TransactionRecord) -> Self {
        Self {
            id: record.id,
            created_at: record.created_at,
            transaction_type: record.kind.transaction_type().as_str(),
            from_account: record.kind.from_account(),
            to_account: record.kind.to_account(),
            amount: record.amount.value(),
            currency: record.currency,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    pub owner_id: Uuid,
    pub currency: String,
}

#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub id: Uuid,
    pub balance: Decimal,
    pub currency: String,
    pub owner_id: Uuid,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            balance: account.balance.value(),
            currency: account.currency,
            owner_id: account.owner_id,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UserRequest {
    pub last_name: String,
    pub first_name: String,
    #[serde(default)]
    pub patronymic_name: Option<String>,
    pub birth_date: NaiveDate,
    pub email: String,
    pub phone_number: String,
}

impl From<UserRequest> for UserFields {
    fn from(req: UserRequest) -> Self {
        Self {
            last_name: req.last_name,
            first_name: req.first_name,
            patronymic_name: req.patronymic_name,
            birth_date: req.birth_date,
            email: req.email,
            phone_number: req.phone_number,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub last_name: String,
    pub first_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patronymic_name: Option<String>,
    pub birth_date: NaiveDate,
    pub email: String,
    pub phone_number: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            last_name: user.last_name,
            first_name: user.first_name,
            patronymic_name: user.patronymic_name,
            birth_date: user.birth_date,
            email: user.email,
            phone_number: user.phone_number,
        }
    }
}

fn parse_amount(raw: &str) -> Result<Decimal, AppError> {
    Decimal::from_str(raw).map_err(|e| AppError::InvalidRequest(format!("invalid amount: {e}")))
}

// =========================================================================
// Handlers
// =========================================================================

async fn transfer(
    State(state): State<AppState>,
    Json(req): Json<TransferRequest>,
) -> AppResult<Json<TransactionResponse>> {
    let amount = parse_amount(&req.amount)?;
    let record = state
        .engine
        .transfer(
            req.from_account_id,
            req.to_account_id,
            amount,
            &CancelToken::never(),
        )
        .await
        .map_err(AppError::Domain)?;
    Ok(Json(record.into()))
}

async fn deposit(
    State(state): State<AppState>,
    Path(account_id): Path<Uuid>,
    Json(req): Json<AmountRequest>,
) -> AppResult<Json<TransactionResponse>> {
    let amount = parse_amount(&req.amount)?;
    let record = state
        .engine
        .deposit(account_id, amount)
        .await
        .map_err(AppError::Domain)?;
    Ok(Json(record.into()))
}

async fn debit(
    State(state): State<AppState>,
    Path(account_id): Path<Uuid>,
    Json(req): Json<AmountRequest>,
) -> AppResult<Json<TransactionResponse>> {
    let amount = parse_amount(&req.amount)?;
    let record = state
        .engine
        .debit(account_id, amount)
        .await
        .map_err(AppError::Domain)?;
    Ok(Json(record.into()))
}

async fn create_account(
    State(state): State<AppState>,
    Json(req): Json<CreateAccountRequest>,
) -> AppResult<(StatusCode, Json<AccountResponse>)> {
    let account = state
        .accounts
        .create_account(req.owner_id, &req.currency)
        .await
        .map_err(AppError::Domain)?;
    Ok((StatusCode::CREATED, Json(account.into())))
}

async fn get_account(
    State(state): State<AppState>,
    Path(account_id): Path<Uuid>,
) -> AppResult<Json<AccountResponse>> {
    let account = state
        .accounts
        .get_account(account_id)
        .await
        .map_err(AppError::Domain)?;
    Ok(Json(account.into()))
}

async fn list_accounts(State(state): State<AppState>) -> AppResult<Json<Vec<AccountResponse>>> {
    let accounts = state
        .accounts
        .list_accounts()
        .await
        .map_err(AppError::Domain)?;
    Ok(Json(accounts.into_iter().map(Into::into).collect()))
}

async fn delete_account(
    State(state): State<AppState>,
    Path(account_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state
        .accounts
        .delete_account(account_id)
        .await
        .map_err(AppError::Domain)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn account_transactions(
    State(state): State<AppState>,
    Path(account_id): Path<Uuid>,
) -> AppResult<Json<Vec<TransactionResponse>>> {
    let records = state
        .accounts
        .account_transactions(account_id)
        .await
        .map_err(AppError::Domain)?;
    Ok(Json(records.into_iter().map(Into::into).collect()))
}

async fn supported_currencies(
    State(state): State<AppState>,
) -> AppResult<Json<HashMap<String, String>>> {
    let currencies = state
        .accounts
        .supported_currencies()
        .await
        .map_err(AppError::Domain)?;
    Ok(Json(currencies))
}

async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<UserRequest>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    let user = state
        .users
        .create_user(req.into())
        .await
        .map_err(AppError::Domain)?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<UserResponse>> {
    let user = state
        .users
        .get_user(user_id)
        .await
        .map_err(AppError::Domain)?;
    Ok(Json(user.into()))
}

async fn list_users(State(state): State<AppState>) -> AppResult<Json<Vec<UserResponse>>> {
    let users = state.users.list_users().await.map_err(AppError::Domain)?;
    Ok(Json(users.into_iter().map(Into::into).collect()))
}

async fn update_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(req): Json<UserRequest>,
) -> AppResult<Json<UserResponse>> {
    let user = state
        .users
        .update_user(user_id, req.into())
        .await
        .map_err(AppError::Domain)?;
    Ok(Json(user.into()))
}

async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state
        .users
        .delete_user(user_id)
        .await
        .map_err(AppError::Domain)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Build the API router
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/transfers", post(transfer))
        .route("/accounts", post(create_account).get(list_accounts))
        .route("/accounts/:id", get(get_account).delete(delete_account))
        .route("/accounts/:id/deposit", post(deposit))
        .route("/accounts/:id/debit", post(debit))
        .route("/accounts/:id/transactions", get(account_transactions))
        .route("/currencies", get(supported_currencies))
        .route("/users", post(create_user).get(list_users))
        .route("/users/:id", get(get_user).put(update_user).delete(delete_user))
}
