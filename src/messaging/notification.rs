// Notifications for user-visible problems (generation, waveform, playback)

use crate::messaging::channels::NotificationProducer;
use std::sync::{Arc, Mutex};

/// Severity of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

/// Which part of the studio raised the notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationCategory {
    Generation,
    Waveform,
    Playback,
    Config,
    Generic,
}

/// Notification with timestamp and metadata
#[derive(Debug, Clone)]
pub struct Notification {
    pub level: NotificationLevel,
    pub category: NotificationCategory,
    pub message: String,
    pub timestamp: i64, // Unix timestamp in milliseconds
}

impl Notification {
    /// Creates a notification stamped with the current time
    pub fn new(level: NotificationLevel, category: NotificationCategory, message: String) -> Self {
        Self {
            level,
            category,
            message,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn info(category: NotificationCategory, message: String) -> Self {
        Self::new(NotificationLevel::Info, category, message)
    }

    pub fn warning(category: NotificationCategory, message: String) -> Self {
        Self::new(NotificationLevel::Warning, category, message)
    }

    pub fn error(category: NotificationCategory, message: String) -> Self {
        Self::new(NotificationLevel::Error, category, message)
    }

    /// Whether the notification is younger than `max_age_ms`
    pub fn is_recent(&self, max_age_ms: i64) -> bool {
        let now = chrono::Utc::now().timestamp_millis();
        now.saturating_sub(self.timestamp) < max_age_ms
    }
}

/// Cloneable handle that logs a notification and forwards it to the UI
///
/// Pushing never blocks: if the channel is full or contended the
/// notification is only logged.
#[derive(Clone, Default)]
pub struct Notifier {
    tx: Option<Arc<Mutex<NotificationProducer>>>,
}

impl Notifier {
    pub fn new(tx: NotificationProducer) -> Self {
        Self {
            tx: Some(Arc::new(Mutex::new(tx))),
        }
    }

    /// Log-only notifier
    pub fn silent() -> Self {
        Self { tx: None }
    }

    pub fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Info => log::info!("{:?}: {}", notification.category, notification.message),
            NotificationLevel::Warning => log::warn!("{:?}: {}", notification.category, notification.message),
            NotificationLevel::Error => log::error!("{:?}: {}", notification.category, notification.message),
        }

        if let Some(tx) = &self.tx
            && let Ok(mut tx) = tx.try_lock()
        {
            let _ = ringbuf::traits::Producer::try_push(&mut *tx, notification);
        }
    }

    pub fn info(&self, category: NotificationCategory, message: impl Into<String>) {
        self.notify(Notification::info(category, message.into()));
    }

    pub fn warning(&self, category: NotificationCategory, message: impl Into<String>) {
        self.notify(Notification::warning(category, message.into()));
    }

    pub fn error(&self, category: NotificationCategory, message: impl Into<String>) {
        self.notify(Notification::error(category, message.into()));
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("connected", &self.tx.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::channels::create_notification_channel;
    use ringbuf::traits::Consumer;

    #[test]
    fn test_notification_creation() {
        let notif = Notification::error(NotificationCategory::Playback, "Test error".to_string());

        assert_eq!(notif.level, NotificationLevel::Error);
        assert_eq!(notif.category, NotificationCategory::Playback);
        assert_eq!(notif.message, "Test error");
        assert!(notif.timestamp > 0);
    }

    #[test]
    fn test_notification_is_recent() {
        let notif = Notification::info(NotificationCategory::Generic, "Test".to_string());

        assert!(notif.is_recent(1000));
        assert!(notif.is_recent(10_000));
    }

    #[test]
    fn test_notifier_forwards_to_channel() {
        let (tx, mut rx) = create_notification_channel(4);
        let notifier = Notifier::new(tx);

        notifier.warning(NotificationCategory::Waveform, "Loading waveform failed");

        let received = rx.try_pop();
        assert!(matches!(
            received,
            Some(Notification {
                level: NotificationLevel::Warning,
                category: NotificationCategory::Waveform,
                ..
            })
        ));
    }

    #[test]
    fn test_silent_notifier_drops() {
        // Must not panic without a channel
        Notifier::silent().error(NotificationCategory::Generic, "nobody listens");
    }
}
