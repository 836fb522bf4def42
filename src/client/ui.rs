//! Mirror of the harness UI: a status indicator and the enabled state of
//! the connect/disconnect actions.

use parking_lot::Mutex;

/// Value shown in the device status indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceStatus {
    Initializing,
    Ready,
    Connecting,
    Unregistered,
    Error,
}

impl DeviceStatus {
    pub fn label(&self) -> &'static str {
        match self {
            DeviceStatus::Initializing => "Initializing",
            DeviceStatus::Ready => "Ready",
            DeviceStatus::Connecting => "Connecting",
            DeviceStatus::Unregistered => "Unregistered",
            DeviceStatus::Error => "Error",
        }
    }
}

/// Point-in-time view of the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UiSnapshot {
    pub status: DeviceStatus,
    pub connect_enabled: bool,
    pub disconnect_enabled: bool,
}

/// Shared UI state, mutated by controller methods and event pumps.
#[derive(Debug)]
pub struct UiState {
    inner: Mutex<UiSnapshot>,
}

impl Default for UiState {
    fn default() -> Self {
        Self::new()
    }
}

impl UiState {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(UiSnapshot {
                status: DeviceStatus::Initializing,
                connect_enabled: false,
                disconnect_enabled: false,
            }),
        }
    }

    pub fn set_status(&self, status: DeviceStatus) {
        self.inner.lock().status = status;
    }

    pub fn set_connect_enabled(&self, enabled: bool) {
        self.inner.lock().connect_enabled = enabled;
    }

    pub fn set_disconnect_enabled(&self, enabled: bool) {
        self.inner.lock().disconnect_enabled = enabled;
    }

    pub fn snapshot(&self) -> UiSnapshot {
        *self.inner.lock()
    }
}
