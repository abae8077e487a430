use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use super::domain::Notification;

/// Notifications whose first delivery failed, kept for a later flush.
#[derive(Debug, Default)]
pub struct Outbox {
    pending: Mutex<VecDeque<Notification>>,
}

impl Outbox {
    pub fn park(&self, notification: Notification) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(notification);
    }

    pub fn drain(&self) -> Vec<Notification> {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::ids::StudentId;
    use crate::workflows::notifications::{NotificationKind, Priority};
    use chrono::Utc;

    #[test]
    fn drain_empties_in_fifo_order() {
        let outbox = Outbox::default();
        for title in ["first", "second"] {
            outbox.park(Notification::new(
                StudentId::from("stu-1"),
                NotificationKind::GeneralAnnouncement,
                Priority::Low,
                title,
                "body",
                Utc::now(),
            ));
        }
        assert_eq!(outbox.len(), 2);
        let drained = outbox.drain();
        assert_eq!(drained[0].title, "first");
        assert_eq!(drained[1].title, "second");
        assert!(outbox.is_empty());
    }
}
