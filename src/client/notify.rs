//! User-facing notifications ("toasts").

use std::sync::Mutex;

/// How a notification is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The action worked.
    Success,
    /// The action was refused or failed.
    Error,
    /// Neutral information.
    Info,
}

/// One message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Text shown to the user.
    pub message: String,
    /// Presentation.
    pub severity: Severity,
    /// How long it stays on screen.
    pub duration_ms: u64,
}

impl Notification {
    /// Success toast, shown for 3 s.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Success,
            duration_ms: 3000,
        }
    }

    /// Error toast, shown for 5 s.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Error,
            duration_ms: 5000,
        }
    }

    /// Informational toast, shown for 3 s.
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Info,
            duration_ms: 3000,
        }
    }
}

/// Fire-and-forget presentation of notifications.
pub trait NotificationSink: Send + Sync + std::fmt::Debug {
    /// Presents `notification`. Must not block.
    fn notify(&self, notification: Notification);
}

/// Writes notifications to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, n: Notification) {
        match n.severity {
            Severity::Error => tracing::warn!(message = %n.message, "notification"),
            Severity::Success | Severity::Info => {
                tracing::info!(message = %n.message, duration_ms = n.duration_ms, "notification");
            }
        }
    }
}

/// Keeps every notification in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    seen: Mutex<Vec<Notification>>,
}

impl RecordingSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything received so far.
    #[must_use]
    pub fn notifications(&self) -> Vec<Notification> {
        self.seen.lock().map(|v| v.clone()).unwrap_or_default()
    }

    /// Removes and returns everything received so far.
    pub fn take(&self) -> Vec<Notification> {
        self.seen
            .lock()
            .map(|mut v| std::mem::take(&mut *v))
            .unwrap_or_default()
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, notification: Notification) {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(notification);
        }
    }
}
