//! Fire-and-forget warning sink.
//!
//! Best-effort teardown steps report problems here instead of failing the
//! scenario. Implementations must never panic or block the caller.

use std::sync::Mutex;
use tracing::warn;

/// Sink for non-fatal warnings
pub trait NotificationSink: Send + Sync {
    /// Report a warning; must not fail
    fn warn(&self, message: &str);
}

/// Default sink, emitting through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl NotificationSink for TracingNotifier {
    fn warn(&self, message: &str) {
        warn!(target: "navegar::notifier", "{message}");
    }
}

/// Sink that buffers warnings for assertions in tests
#[derive(Debug, Default)]
pub struct CollectingNotifier {
    messages: Mutex<Vec<String>>,
}

impl CollectingNotifier {
    /// Create an empty collector
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Warnings received so far
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().map(|m| m.clone()).unwrap_or_default()
    }
}

impl NotificationSink for CollectingNotifier {
    fn warn(&self, message: &str) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(message.to_string());
        }
    }
}
