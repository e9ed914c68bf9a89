use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use http::StatusCode;
use tracing::{error, info};

use crate::errors::AppError;
use crate::models::{Account, AccountUpdate, CreateAccount, DocumentId};
use crate::services::account_service::{self, AccountQuery};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/accounts", get(list_accounts).post(create_account))
        .route("/accounts/", get(list_accounts).post(create_account))
        .route(
            "/accounts/:id",
            get(get_account).patch(update_account).delete(delete_account),
        )
}

fn parse_id(raw: &str) -> Result<DocumentId, AppError> {
    DocumentId::parse(raw).map_err(|e| {
        error!("Rejected account id {}: {}", raw, e);
        AppError::from(e)
    })
}

pub async fn list_accounts(
    State(state): State<AppState>,
    query: Result<Query<AccountQuery>, QueryRejection>,
) -> Result<Json<Vec<Account>>, AppError> {
    let Query(query) = query.map_err(|e| AppError::Validation(e.body_text()))?;
    info!("GET /accounts - Listing accounts (page {})", query.page());
    let accounts = account_service::list(state.accounts.as_ref(), query)
        .await
        .map_err(|e| {
            error!("Failed to list accounts: {}", e);
            e
        })?;
    Ok(Json(accounts))
}

pub async fn create_account(
    State(state): State<AppState>,
    payload: Result<Json<CreateAccount>, JsonRejection>,
) -> Result<(StatusCode, Json<Account>), AppError> {
    let Json(data) = payload.map_err(|e| AppError::Validation(e.body_text()))?;
    info!("POST /accounts - Creating account '{}'", data.name);
    let account = account_service::create(state.accounts.as_ref(), data)
        .await
        .map_err(|e| {
            error!("Failed to create account: {}", e);
            e
        })?;
    info!("Created account {}", account.id);
    Ok((StatusCode::CREATED, Json(account)))
}

pub async fn get_account(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Account>, AppError> {
    info!("GET /accounts/{} - Fetching account", id);
    let id = parse_id(&id)?;
    let account = account_service::fetch_one(state.accounts.as_ref(), &id)
        .await
        .map_err(|e| {
            error!("Failed to fetch account {}: {}", id, e);
            e
        })?;
    Ok(Json(account))
}

pub async fn update_account(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<AccountUpdate>, JsonRejection>,
) -> Result<Json<Account>, AppError> {
    info!("PATCH /accounts/{} - Updating account", id);
    let id = parse_id(&id)?;
    let Json(patch) = payload.map_err(|e| AppError::Validation(e.body_text()))?;
    let account = account_service::update(state.accounts.as_ref(), &id, patch)
        .await
        .map_err(|e| {
            error!("Failed to update account {}: {}", id, e);
            e
        })?;
    Ok(Json(account))
}

pub async fn delete_account(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    info!("DELETE /accounts/{} - Deleting account", id);
    let id = parse_id(&id)?;
    account_service::delete(state.accounts.as_ref(), &id)
        .await
        .map_err(|e| {
            error!("Failed to delete account {}: {}", id, e);
            e
        })?;
    Ok(StatusCode::NO_CONTENT)
}
