use axum::async_trait;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequestParts, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::routing::{get, post};
use axum::{Json, Router};
use http::StatusCode;
use tracing::{error, info, warn};

use crate::errors::AppError;
use crate::models::{CurrentUser, LoginRequest, RegisterUser, TokenResponse, UserResponse};
use crate::services::user_service;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/", get(list_users))
        .route("/users/register", post(register))
        .route("/users/login", post(login))
        .route("/users/me", get(me))
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("Missing bearer token".into()))?;
        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Unauthorized("Authorization header must use Bearer".into()))?;
        state.auth.decode_token(token.trim()).map_err(|e| {
            warn!("Rejected bearer token: {}", e);
            AppError::Unauthorized("Invalid or expired token".into())
        })
    }
}

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterUser>, JsonRejection>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let Json(data) = payload.map_err(|e| AppError::Validation(e.body_text()))?;
    info!("POST /users/register - Registering '{}'", data.username);
    let user = user_service::register(state.users.as_ref(), &state.auth, data)
        .await
        .map_err(|e| {
            error!("Failed to register user: {}", e);
            e
        })?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, AppError> {
    let Json(data) = payload.map_err(|e| AppError::Validation(e.body_text()))?;
    info!("POST /users/login - Login attempt");
    let token = user_service::login(state.users.as_ref(), &state.auth, data).await?;
    Ok(Json(token))
}

pub async fn me(current: CurrentUser) -> Json<CurrentUser> {
    info!("GET /users/me - {}", current.username);
    Json(current)
}

pub async fn list_users(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    info!("GET /users - Listing users for {}", current.username);
    let users = user_service::list_all(state.users.as_ref(), &current)
        .await
        .map_err(|e| {
            error!("Failed to list users: {}", e);
            e
        })?;
    Ok(Json(users))
}
