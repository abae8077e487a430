use crate::workflows::error::RepositoryError;
use crate::workflows::ids::{NotificationId, StudentId};

use super::domain::Notification;

pub trait NotificationRepository: Send + Sync {
    fn insert(&self, notification: Notification) -> Result<Notification, RepositoryError>;
    fn update(&self, notification: Notification) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &NotificationId) -> Result<Option<Notification>, RepositoryError>;
    /// Every notification of the student, deleted ones included.
    fn for_student(&self, student: &StudentId) -> Result<Vec<Notification>, RepositoryError>;
}
