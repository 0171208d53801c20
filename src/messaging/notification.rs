// Notification system for user-visible error/success reporting

use std::time::{SystemTime, UNIX_EPOCH};

/// Default on-screen duration of a notification
pub const DEFAULT_NOTIFICATION_MS: u32 = 3000;

/// Severity of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

/// Notification with timestamp and display duration
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    pub duration_ms: u32,
    pub timestamp: u64, // Unix timestamp in milliseconds
}

impl Notification {
    /// Create a notification stamped with the current time
    pub fn new(level: NotificationLevel, message: impl Into<String>, duration_ms: u32) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;

        Self {
            level,
            message: message.into(),
            duration_ms,
            timestamp,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Info, message, DEFAULT_NOTIFICATION_MS)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Warning, message, DEFAULT_NOTIFICATION_MS)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Error, message, DEFAULT_NOTIFICATION_MS)
    }

    /// Override the display duration
    pub fn with_duration(mut self, duration_ms: u32) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    /// Check whether the notification is younger than `max_age_ms`
    pub fn is_recent(&self, max_age_ms: u64) -> bool {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;

        now.saturating_sub(self.timestamp) < max_age_ms
    }
}

/// Sink for user-visible notifications
///
/// The engine never waits on a notifier and never inspects the outcome:
/// a full or disconnected sink simply drops the message.
pub trait Notifier {
    fn notify(&mut self, notification: Notification);
}

/// Collecting notifier, handy for headless runs and tests
impl Notifier for Vec<Notification> {
    fn notify(&mut self, notification: Notification) {
        self.push(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_creation() {
        let notif = Notification::error("Test error");

        assert_eq!(notif.level, NotificationLevel::Error);
        assert_eq!(notif.message, "Test error");
        assert_eq!(notif.duration_ms, DEFAULT_NOTIFICATION_MS);
        assert!(notif.timestamp > 0);
    }

    #[test]
    fn test_notification_helpers() {
        let info = Notification::info("Info");
        let warning = Notification::warning("Warning").with_duration(500);
        let error = Notification::error("Error");

        assert_eq!(info.level, NotificationLevel::Info);
        assert_eq!(warning.level, NotificationLevel::Warning);
        assert_eq!(warning.duration_ms, 500);
        assert_eq!(error.level, NotificationLevel::Error);
    }

    #[test]
    fn test_notification_is_recent() {
        let notif = Notification::info("Test");
        assert!(notif.is_recent(10_000));
    }

    #[test]
    fn test_vec_notifier_collects() {
        let mut sink: Vec<Notification> = Vec::new();
        sink.notify(Notification::info("one"));
        sink.notify(Notification::error("two"));
        assert_eq!(sink.len(), 2);
        assert_eq!(sink[1].message, "two");
    }
}
