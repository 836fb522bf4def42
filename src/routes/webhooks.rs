use axum::{Router, routing::post};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::handlers::voice;
use crate::state::AppState;

/// Create the webhook router for endpoints called by the signaling cloud.
///
/// The cloud authenticates these calls with its own signed-request scheme,
/// which this harness deliberately does not verify.
pub fn create_webhook_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/voice", post(voice::voice_webhook))
        .layer(TraceLayer::new_for_http())
}
