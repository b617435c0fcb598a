//! Admin endpoints, mounted when `admin.enabled`.

pub mod auth;
pub mod handlers;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::http::server::AppState;

pub fn setup_admin_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/guard", get(get_guard))
        .route("/admin/cache", get(get_cache))
        .route("/admin/cache/purge", post(purge_cache))
        .route_layer(middleware::from_fn_with_state(state, admin_auth_middleware))
}
