use axum::{Router, routing::get};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::handlers::{api, token};
use crate::state::AppState;

/// Create the public API router: token issuance and health check.
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/token", get(token::issue_token))
        .route("/health", get(api::health_check))
        .layer(TraceLayer::new_for_http())
}
