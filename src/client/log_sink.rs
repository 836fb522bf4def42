//! Append-only log panel mirrored to the console via `tracing`.
//!
//! Entries are timestamped and leveled, never persisted, and cleared only
//! by an explicit user action.

use chrono::Local;
use parking_lot::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Success,
    Warn,
    Error,
}

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: String,
    pub level: LogLevel,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct LogSink {
    entries: Mutex<Vec<LogEntry>>,
}

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a timestamped entry and mirror it to the console.
    pub fn push(&self, level: LogLevel, message: impl Into<String>) {
        let message = message.into();
        match level {
            LogLevel::Info | LogLevel::Success => tracing::info!("{message}"),
            LogLevel::Warn => tracing::warn!("{message}"),
            LogLevel::Error => tracing::error!("{message}"),
        }
        self.entries.lock().push(LogEntry {
            timestamp: Local::now().format("%H:%M:%S").to_string(),
            level,
            message,
        });
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().clone()
    }

    /// Whether any entry contains the given fragment.
    pub fn contains(&self, fragment: &str) -> bool {
        self.entries.lock().iter().any(|e| e.message.contains(fragment))
    }

    /// Drop all entries.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_clear() {
        let sink = LogSink::new();
        sink.push(LogLevel::Info, "Device registered");
        sink.push(LogLevel::Error, "Call error: 31000");

        assert_eq!(sink.entries().len(), 2);
        assert!(sink.contains("Call error"));
        assert!(!sink.contains("warning"));

        sink.clear();
        assert!(sink.entries().is_empty());
    }
}
