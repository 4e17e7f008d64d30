// User-facing notifications. Fire-and-forget: nothing reads a result back.

use std::sync::Mutex;

use tracing::{info, warn};

/// Toast flavour, mirroring a success/destructive pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
}

/// Sink for notifications shown to the user.
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, description: &str, severity: Severity);
}

/// Writes notifications to the log. Used when no UI is attached.
#[derive(Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, title: &str, description: &str, severity: Severity) {
        match severity {
            Severity::Success => info!(title, description, "notification"),
            Severity::Error => warn!(title, description, "notification"),
        }
    }
}

/// A notification captured by [`RecordingNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub severity: Severity,
}

/// Keeps every notification in memory, in order.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    seen: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Vec<Notification> {
        match self.seen.lock() {
            Ok(mut seen) => std::mem::take(&mut *seen),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }

    pub fn last(&self) -> Option<Notification> {
        match self.seen.lock() {
            Ok(seen) => seen.last().cloned(),
            Err(poisoned) => poisoned.into_inner().last().cloned(),
        }
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, title: &str, description: &str, severity: Severity) {
        let n = Notification {
            title: title.to_string(),
            description: description.to_string(),
            severity,
        };
        match self.seen.lock() {
            Ok(mut seen) => seen.push(n),
            Err(poisoned) => poisoned.into_inner().push(n),
        }
    }
}
