//! Access token endpoint.
//!
//! Every request mints a fresh grant for a newly generated identity; there
//! is no request body and no input validation.

use std::sync::Arc;

use axum::{extract::State, response::Json};
use serde::Serialize;
use tracing::info;

use crate::AppError;
use crate::state::AppState;

/// Response body for `GET /token`.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    /// The signed access grant consumed by the device at startup
    pub token: String,
    /// The identity the grant was issued for
    pub identity: String,
}

/// Handler for GET /token.
pub async fn issue_token(
    State(state): State<Arc<AppState>>,
) -> Result<Json<TokenResponse>, AppError> {
    let issued = state
        .token_issuer
        .issue()
        .map_err(|e| AppError::InternalServerError(format!("Failed to mint access token: {e}")))?;

    info!("Generated access token for identity: {}", issued.identity);

    Ok(Json(TokenResponse {
        token: issued.token,
        identity: issued.identity,
    }))
}
