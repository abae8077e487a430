//! Per-student notification feed with soft deletion and a retry outbox.

pub mod domain;
pub mod outbox;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{Notification, NotificationKind, OfferSummary, Priority, RelatedData};
pub use outbox::Outbox;
pub use repository::NotificationRepository;
pub use router::notification_routes;
pub use service::{
    DailyUpdates, DailyUpdatesQuery, DeadlineKind, FlushReport, NotificationFeed, Opportunity,
    Pagination, UpcomingDeadline,
};
