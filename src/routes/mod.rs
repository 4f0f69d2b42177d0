use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{auth::require_auth, state::AppState};

pub mod health;
pub mod settings;
pub mod subscriptions;
pub mod upload;

pub fn public_routes() -> Router<AppState> {
    Router::new().route("/api/health", get(health::health))
}

/// Routes behind the bearer-token middleware.
pub fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/subscriptions", get(subscriptions::list_subscriptions))
        .route("/api/settings", get(settings::get_settings))
        .route("/api/upload/avatar", post(upload::upload_avatar))
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}
