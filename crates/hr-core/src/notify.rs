//! Outbound notification contract
//!
//! The core fires notifications and never waits on delivery; outcomes
//! are the notifier's concern, not the in-flight exchange's.

use serde::{Deserialize, Serialize};
use tracing::info;

/// One outbound message queued by a dialog handler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Destination phone number
    pub to: String,
    pub message: String,
}

impl Notification {
    pub fn new(to: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            message: message.into(),
        }
    }
}

/// Sink for outbound notifications
///
/// `deliver` must not block the caller on delivery; implementations
/// hand the message off (e.g. spawn the send) and return immediately.
pub trait Notifier: Send + Sync {
    fn deliver(&self, notification: Notification);
}

/// Notifier that only logs, used when no SMS credentials are configured
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn deliver(&self, notification: Notification) {
        info!(to = %notification.to, "SMS (not sent, no credentials): {}", notification.message);
    }
}
