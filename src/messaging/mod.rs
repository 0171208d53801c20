// Messaging - User-visible notifications (fire-and-forget)

pub mod channels;
pub mod notification;

pub use channels::{NotificationConsumer, NotificationProducer, create_notification_channel};
pub use notification::{Notification, NotificationLevel, Notifier};
