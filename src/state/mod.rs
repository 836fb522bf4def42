use std::sync::Arc;

use crate::auth::TokenIssuer;
use crate::config::ServerConfig;

/// Application state that can be shared across handlers
pub struct AppState {
    pub config: ServerConfig,
    /// Mints one signed access grant per `/token` request
    pub token_issuer: TokenIssuer,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Arc<Self> {
        let token_issuer = TokenIssuer::new(&config);
        Arc::new(Self {
            config,
            token_issuer,
        })
    }
}
