// Messaging - User-facing notifications
// Degrade points log through `log` and surface through the notification channel

pub mod channels;
pub mod notification;

pub use channels::{NotificationConsumer, NotificationProducer, create_notification_channel};
pub use notification::{Notification, NotificationCategory, NotificationLevel, Notifier};
