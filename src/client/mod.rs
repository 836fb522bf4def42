//! Softphone client: a controller owning one signaling device and at most
//! one active call, the observer contract it drives the device through, and
//! the simulated signaling cloud used by the harness.

pub mod cloud;
pub mod controller;
pub mod device;
pub mod log_sink;
pub mod ui;

pub use cloud::SimulatedCloud;
pub use controller::SoftphoneController;
pub use device::{
    CallEvent, CallHandle, CallSession, DeviceEvent, DeviceHandle, DeviceOptions, DeviceSession,
    SignalError, SignalingBackend,
};
pub use log_sink::{LogEntry, LogLevel, LogSink};
pub use ui::{DeviceStatus, UiSnapshot, UiState};

use thiserror::Error;

/// Client-side error types
#[derive(Debug, Error)]
pub enum ClientError {
    /// An operation requiring a device was attempted before `initialize`
    #[error("Device not initialized")]
    DeviceNotInitialized,

    /// The device was destroyed and can no longer place calls
    #[error("Device has been destroyed")]
    DeviceDestroyed,

    /// A connect was attempted while another call is still live
    #[error("A call is already in progress")]
    CallInProgress,

    /// Token fetch failed (network error or undecodable body)
    #[error("Token request failed: {0}")]
    TokenRequest(#[from] reqwest::Error),

    /// Token endpoint answered with an unusable payload
    #[error("Malformed token response: {0}")]
    TokenResponse(String),

    /// Access token is not a decodable grant
    #[error("Malformed access token: {0}")]
    MalformedToken(String),
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;
