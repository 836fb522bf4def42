//! Observer contract between the controller and a signaling backend.
//!
//! Mirrors the vendor SDK surface: a device is created from an access token
//! and registers asynchronously, delivering lifecycle events on a channel.
//! An outbound call gets its own handle and event stream. The controller
//! records which events it reacts to and what state transition each implies,
//! independent of the transport that delivers them.

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::ClientError;

/// Options applied when a device is created. Not hot-swappable: changing
/// any of these requires a full device reinitialization.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeviceOptions {
    /// Ask the backend for precise signaling error codes instead of the
    /// generic catch-all code.
    pub improved_signaling_error_precision: bool,
}

/// Structured error delivered through device or call event streams.
#[derive(Debug, Clone)]
pub struct SignalError {
    pub code: u32,
    pub name: String,
    pub message: String,
}

/// Device lifecycle events.
#[derive(Debug, Clone)]
pub enum DeviceEvent {
    Registered,
    Unregistered,
    TokenWillExpire,
    Error(SignalError),
}

/// Call lifecycle events.
#[derive(Debug, Clone)]
pub enum CallEvent {
    Accept,
    Disconnect,
    Cancel,
    Reject,
    Error(SignalError),
    Warning { name: String, detail: String },
    Reconnecting(SignalError),
    Reconnected,
}

impl CallEvent {
    /// Whether this event ends the call. `Accept` is not terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CallEvent::Disconnect | CallEvent::Cancel | CallEvent::Reject | CallEvent::Error(_)
        )
    }
}

/// A created device: control handle plus its event stream.
pub struct DeviceSession {
    pub handle: Box<dyn DeviceHandle>,
    pub events: mpsc::UnboundedReceiver<DeviceEvent>,
}

/// An active outbound call: control handle plus its event stream.
pub struct CallSession {
    pub call_sid: String,
    pub handle: Box<dyn CallHandle>,
    pub events: mpsc::UnboundedReceiver<CallEvent>,
}

/// Factory for device sessions; the only seam between the controller and
/// the vendor signaling transport.
#[async_trait]
pub trait SignalingBackend: Send + Sync {
    /// Create a device from an access token and start its registration.
    /// Registration completes asynchronously via `DeviceEvent::Registered`;
    /// the device is unusable until then.
    async fn create_device(
        &self,
        token: &str,
        options: DeviceOptions,
    ) -> Result<DeviceSession, ClientError>;
}

/// Control surface of a live device.
#[async_trait]
pub trait DeviceHandle: Send + Sync {
    /// Place an outbound call through the configured application.
    async fn connect(&self) -> Result<CallSession, ClientError>;

    /// Release the device. Idempotent; a destroyed device refuses further
    /// connects and stops emitting events.
    fn destroy(&self);
}

/// Control surface of an active call.
pub trait CallHandle: Send + Sync {
    /// Request call termination. Teardown is confirmed asynchronously by a
    /// `CallEvent::Disconnect`, not by this method returning.
    fn disconnect(&self);
}
