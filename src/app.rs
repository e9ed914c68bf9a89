use axum::Router;
use tower_http::cors::CorsLayer;

use crate::routes::{accounts, health, users};
use crate::state::AppState;

pub fn create_app(state: AppState) -> Router {
    Router::<AppState>::new()
        .nest("/health", health::router())
        .merge(accounts::router())
        .merge(users::router())
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}
