// Lock-free notification channel between the engine and the UI

use crate::messaging::notification::{Notification, Notifier};
use ringbuf::traits::{Producer, Split};
use ringbuf::HeapRb;

pub type NotificationProducer = ringbuf::HeapProd<Notification>;
pub type NotificationConsumer = ringbuf::HeapCons<Notification>;

pub fn create_notification_channel(
    capacity: usize,
) -> (NotificationProducer, NotificationConsumer) {
    let rb = HeapRb::<Notification>::new(capacity);
    rb.split()
}

impl Notifier for NotificationProducer {
    fn notify(&mut self, notification: Notification) {
        if let Err(dropped) = self.try_push(notification) {
            log::warn!("Notification channel full, dropping: {}", dropped.message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ringbuf::traits::{Consumer, Observer};

    #[test]
    fn test_channel_delivers_in_order() {
        let (mut tx, mut rx) = create_notification_channel(4);
        tx.notify(Notification::info("first"));
        tx.notify(Notification::info("second"));

        assert_eq!(rx.occupied_len(), 2);
        assert_eq!(rx.try_pop().unwrap().message, "first");
        assert_eq!(rx.try_pop().unwrap().message, "second");
        assert!(rx.try_pop().is_none());
    }

    #[test]
    fn test_full_channel_drops_without_panicking() {
        let (mut tx, rx) = create_notification_channel(1);
        tx.notify(Notification::info("kept"));
        tx.notify(Notification::info("dropped"));
        assert_eq!(rx.occupied_len(), 1);
    }
}
