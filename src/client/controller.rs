//! Softphone controller.
//!
//! Owns the lifecycle of a single signaling device and at most one active
//! call, with explicit release-before-replace discipline: a new device is
//! never created while the previous one is still live. All UI transitions
//! happen either directly in the operations below or in the event pumps
//! they spawn.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::ClientError;
use super::device::{
    CallEvent, CallHandle, DeviceEvent, DeviceHandle, DeviceOptions, SignalingBackend,
};
use super::log_sink::{LogLevel, LogSink};
use super::ui::{DeviceStatus, UiState};

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: String,
    identity: String,
}

struct DeviceSlot {
    handle: Box<dyn DeviceHandle>,
    pump: JoinHandle<()>,
}

type CallSlot = Arc<Mutex<Option<Box<dyn CallHandle>>>>;

pub struct SoftphoneController {
    backend: Arc<dyn SignalingBackend>,
    token_url: String,
    http: reqwest::Client,
    improved_signaling: bool,
    device: Option<DeviceSlot>,
    current_call: CallSlot,
    ui: Arc<UiState>,
    log: Arc<LogSink>,
}

impl SoftphoneController {
    pub fn new(backend: Arc<dyn SignalingBackend>, token_url: impl Into<String>) -> Self {
        Self {
            backend,
            token_url: token_url.into(),
            http: reqwest::Client::new(),
            improved_signaling: false,
            device: None,
            current_call: Arc::new(Mutex::new(None)),
            ui: Arc::new(UiState::new()),
            log: Arc::new(LogSink::new()),
        }
    }

    pub fn ui(&self) -> Arc<UiState> {
        self.ui.clone()
    }

    pub fn logs(&self) -> Arc<LogSink> {
        self.log.clone()
    }

    pub fn improved_signaling(&self) -> bool {
        self.improved_signaling
    }

    pub fn has_device(&self) -> bool {
        self.device.is_some()
    }

    pub fn has_active_call(&self) -> bool {
        self.current_call.lock().is_some()
    }

    /// Fetch a fresh grant and (re)create the device.
    ///
    /// Any previous device is destroyed before the replacement is created;
    /// at no point are two devices live. Registration completes
    /// asynchronously: the device is unusable until `Registered` arrives.
    pub async fn initialize(&mut self) -> Result<(), ClientError> {
        self.log.push(
            LogLevel::Info,
            format!(
                "Initializing device (improved signaling error precision: {})",
                self.improved_signaling
            ),
        );

        match self.try_initialize().await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.log
                    .push(LogLevel::Error, format!("Failed to initialize device: {e}"));
                self.ui.set_status(DeviceStatus::Error);
                Err(e)
            }
        }
    }

    async fn try_initialize(&mut self) -> Result<(), ClientError> {
        let token = self.fetch_token().await?;

        // A live call references the device about to be torn down; release
        // it first so the slot never outlives its device.
        let stale_call = self.current_call.lock().take();
        if let Some(call) = stale_call {
            self.log
                .push(LogLevel::Warn, "Releasing active call before device teardown");
            call.disconnect();
        }

        // Release the previous device before creating its replacement.
        if let Some(slot) = self.device.take() {
            slot.handle.destroy();
            slot.pump.abort();
        }
        self.ui.set_connect_enabled(false);
        self.ui.set_disconnect_enabled(false);

        let options = DeviceOptions {
            improved_signaling_error_precision: self.improved_signaling,
        };
        let session = self.backend.create_device(&token, options).await?;
        let pump = self.spawn_device_pump(session.events);
        self.device = Some(DeviceSlot {
            handle: session.handle,
            pump,
        });
        Ok(())
    }

    async fn fetch_token(&self) -> Result<String, ClientError> {
        let response = self.http.get(&self.token_url).send().await?;
        let body: TokenResponse = response.json().await?;
        if body.token.is_empty() {
            return Err(ClientError::TokenResponse("empty token".to_string()));
        }
        self.log.push(
            LogLevel::Success,
            format!("Token received for identity: {}", body.identity),
        );
        Ok(body.token)
    }

    fn spawn_device_pump(&self, mut events: mpsc::UnboundedReceiver<DeviceEvent>) -> JoinHandle<()> {
        let ui = self.ui.clone();
        let log = self.log.clone();
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                match event {
                    DeviceEvent::Registered => {
                        log.push(LogLevel::Success, "Device registered");
                        ui.set_status(DeviceStatus::Ready);
                        ui.set_connect_enabled(true);
                    }
                    DeviceEvent::Unregistered => {
                        log.push(LogLevel::Warn, "Device unregistered");
                        ui.set_status(DeviceStatus::Unregistered);
                        ui.set_connect_enabled(false);
                    }
                    DeviceEvent::Error(error) => {
                        log.push(
                            LogLevel::Error,
                            format!("Device error: {} - {}", error.code, error.message),
                        );
                    }
                    DeviceEvent::TokenWillExpire => {
                        log.push(LogLevel::Warn, "Token will expire soon");
                    }
                }
            }
        })
    }

    /// Place an outbound call.
    ///
    /// Refused while another call is live: the call slot holds at most one
    /// handle and an accepted connect must never displace it. The connect
    /// action is also disabled immediately, before the backend round trip,
    /// so a second click cannot start a concurrent attempt; it is re-enabled
    /// only by a terminal call event.
    pub async fn connect(&mut self) -> Result<(), ClientError> {
        let Some(device) = &self.device else {
            self.log.push(LogLevel::Error, "Device not initialized");
            return Err(ClientError::DeviceNotInitialized);
        };
        if self.has_active_call() {
            self.log.push(LogLevel::Error, "A call is already in progress");
            return Err(ClientError::CallInProgress);
        }

        self.log.push(LogLevel::Info, "Connecting...");
        self.ui.set_status(DeviceStatus::Connecting);
        self.ui.set_connect_enabled(false);

        match device.handle.connect().await {
            Ok(session) => {
                self.log
                    .push(LogLevel::Info, format!("Call created: {}", session.call_sid));
                *self.current_call.lock() = Some(session.handle);
                Self::spawn_call_pump(
                    self.ui.clone(),
                    self.log.clone(),
                    self.current_call.clone(),
                    session.events,
                );
                Ok(())
            }
            Err(e) => {
                self.log.push(LogLevel::Error, format!("Connect failed: {e}"));
                self.ui.set_status(DeviceStatus::Ready);
                self.ui.set_connect_enabled(true);
                Err(e)
            }
        }
    }

    fn spawn_call_pump(
        ui: Arc<UiState>,
        log: Arc<LogSink>,
        call: CallSlot,
        mut events: mpsc::UnboundedReceiver<CallEvent>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                let terminal = event.is_terminal();
                match event {
                    CallEvent::Accept => {
                        log.push(LogLevel::Success, "Call accepted");
                        ui.set_disconnect_enabled(true);
                    }
                    CallEvent::Disconnect => finish_call(
                        &ui,
                        &log,
                        &call,
                        DeviceStatus::Ready,
                        LogLevel::Warn,
                        "Call disconnected",
                    ),
                    CallEvent::Cancel => finish_call(
                        &ui,
                        &log,
                        &call,
                        DeviceStatus::Ready,
                        LogLevel::Warn,
                        "Call cancelled",
                    ),
                    CallEvent::Reject => finish_call(
                        &ui,
                        &log,
                        &call,
                        DeviceStatus::Ready,
                        LogLevel::Error,
                        "Call rejected",
                    ),
                    CallEvent::Error(error) => finish_call(
                        &ui,
                        &log,
                        &call,
                        DeviceStatus::Error,
                        LogLevel::Error,
                        &format!(
                            "Call error: {} ({}) - {}",
                            error.code, error.name, error.message
                        ),
                    ),
                    CallEvent::Warning { name, detail } => {
                        log.push(LogLevel::Warn, format!("Call warning: {name} - {detail}"));
                    }
                    CallEvent::Reconnecting(error) => {
                        log.push(
                            LogLevel::Warn,
                            format!("Call reconnecting: {}", error.message),
                        );
                    }
                    CallEvent::Reconnected => {
                        log.push(LogLevel::Success, "Call reconnected");
                    }
                }
                // The call object is dead after a terminal event
                if terminal {
                    break;
                }
            }
        })
    }

    /// Request termination of the active call.
    ///
    /// No-op when no call is live. Actual teardown is confirmed by the
    /// `Disconnect` event, not by this method returning.
    pub fn disconnect(&self) {
        let guard = self.current_call.lock();
        if let Some(call) = guard.as_ref() {
            self.log.push(LogLevel::Info, "Disconnecting...");
            call.disconnect();
        }
    }

    /// Change the improved-signaling flag.
    ///
    /// The flag is not hot-swappable on a live device: a change fully
    /// reinitializes, destroying the old instance first.
    pub async fn set_improved_signaling(&mut self, enabled: bool) -> Result<(), ClientError> {
        if self.improved_signaling == enabled {
            return Ok(());
        }
        self.improved_signaling = enabled;
        self.log
            .push(LogLevel::Info, "Reinitializing device with new settings...");
        self.initialize().await
    }

    pub fn clear_logs(&self) {
        self.log.clear();
    }
}

/// Shared terminal transition for disconnect/cancel/reject/error: log the
/// outcome, restore the status, re-enable connect, disable disconnect and
/// release the call reference.
fn finish_call(
    ui: &UiState,
    log: &LogSink,
    call: &CallSlot,
    status: DeviceStatus,
    level: LogLevel,
    message: &str,
) {
    log.push(level, message);
    ui.set_status(status);
    ui.set_connect_enabled(true);
    ui.set_disconnect_enabled(false);
    *call.lock() = None;
}
