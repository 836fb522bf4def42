pub mod auth;
pub mod client;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod twiml;

// Re-export commonly used items for convenience
pub use config::{ServerConfig, WebhookMode};
pub use errors::app_error::{AppError, AppResult};
pub use state::AppState;
