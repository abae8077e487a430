use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::workflows::applications::ApplicationRepository;
use crate::workflows::error::PlacementError;
use crate::workflows::identity::ProfileDirectory;
use crate::workflows::ids::{ApplicationId, JobId, NotificationId, StudentId};
use crate::workflows::jobs::service::swept_catalog;
use crate::workflows::jobs::{Job, JobRepository};

use super::domain::{Notification, NotificationKind};
use super::outbox::Outbox;
use super::repository::NotificationRepository;

const DEFAULT_PAGE_SIZE: usize = 10;
const MAX_PAGE_SIZE: usize = 100;
const RECENT_OPPORTUNITY_DAYS: i64 = 7;
const RECENT_OPPORTUNITY_LIMIT: usize = 5;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DailyUpdatesQuery {
    pub page: Option<usize>,
    pub limit: Option<usize>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeadlineKind {
    ApplicationDeadline,
    JobDeadline,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpcomingDeadline {
    pub kind: DeadlineKind,
    pub title: String,
    pub deadline: DateTime<Utc>,
    pub application_id: Option<ApplicationId>,
    pub job_id: JobId,
    pub job_title: String,
    pub company_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Opportunity {
    pub id: JobId,
    pub title: String,
    pub company: Option<String>,
    pub industry: Option<String>,
    pub location: String,
    pub package: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: usize,
    pub limit: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DailyUpdates {
    pub notifications: Vec<Notification>,
    pub unread_count: usize,
    pub upcoming_deadlines: Vec<UpcomingDeadline>,
    pub recent_opportunities: Vec<Opportunity>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FlushReport {
    pub delivered: usize,
    pub remaining: usize,
}

/// Delivery and read-side of the student notification feed.
pub struct NotificationFeed {
    notifications: Arc<dyn NotificationRepository>,
    applications: Arc<dyn ApplicationRepository>,
    jobs: Arc<dyn JobRepository>,
    profiles: Arc<dyn ProfileDirectory>,
    outbox: Outbox,
}

impl NotificationFeed {
    pub fn new(
        notifications: Arc<dyn NotificationRepository>,
        applications: Arc<dyn ApplicationRepository>,
        jobs: Arc<dyn JobRepository>,
        profiles: Arc<dyn ProfileDirectory>,
    ) -> Self {
        Self {
            notifications,
            applications,
            jobs,
            profiles,
            outbox: Outbox::default(),
        }
    }

    /// Store a notification. A storage failure parks it in the outbox and returns `false`.
    pub fn deliver(&self, notification: Notification) -> bool {
        match self.notifications.insert(notification.clone()) {
            Ok(stored) => {
                info!(
                    notification_id = %stored.id,
                    student_id = %stored.student,
                    kind = stored.kind.label(),
                    "notification delivered"
                );
                true
            }
            Err(error) => {
                warn!(
                    %error,
                    student_id = %notification.student,
                    "notification delivery failed; parked in outbox"
                );
                self.outbox.park(notification);
                false
            }
        }
    }

    /// Retry every parked notification once.
    pub fn flush_outbox(&self) -> FlushReport {
        let mut delivered = 0;
        for notification in self.outbox.drain() {
            match self.notifications.insert(notification.clone()) {
                Ok(_) => delivered += 1,
                Err(error) => {
                    warn!(%error, notification_id = %notification.id, "outbox retry failed");
                    self.outbox.park(notification);
                }
            }
        }
        let report = FlushReport {
            delivered,
            remaining: self.outbox.len(),
        };
        if report.delivered > 0 || report.remaining > 0 {
            info!(
                delivered = report.delivered,
                remaining = report.remaining,
                "notification outbox flushed"
            );
        }
        report
    }

    pub fn outbox_len(&self) -> usize {
        self.outbox.len()
    }

    fn visible(&self, student: &StudentId) -> Result<Vec<Notification>, PlacementError> {
        let mut visible: Vec<Notification> = self
            .notifications
            .for_student(student)?
            .into_iter()
            .filter(|notification| notification.belongs_to(student))
            .collect();
        visible.sort_by(|left, right| right.created_at.cmp(&left.created_at));
        Ok(visible)
    }

    /// Non-deleted notifications linked to one application, newest first.
    pub fn for_application(
        &self,
        student: &StudentId,
        application: &ApplicationId,
    ) -> Result<Vec<Notification>, PlacementError> {
        Ok(self
            .visible(student)?
            .into_iter()
            .filter(|notification| {
                notification.related.application_id.as_ref() == Some(application)
            })
            .collect())
    }

    pub fn daily_updates(
        &self,
        student: &StudentId,
        query: DailyUpdatesQuery,
        now: DateTime<Utc>,
    ) -> Result<DailyUpdates, PlacementError> {
        let kind = match query.kind.as_deref().filter(|kind| !kind.is_empty()) {
            Some(raw) => Some(NotificationKind::parse(raw).ok_or_else(|| {
                PlacementError::validation(format!("unknown notification type: {raw}"))
            })?),
            None => None,
        };
        let page = query.page.unwrap_or(1).max(1);
        let limit = query
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);

        let visible = self.visible(student)?;
        let unread_count = visible.iter().filter(|notification| !notification.is_read).count();
        let filtered: Vec<Notification> = visible
            .into_iter()
            .filter(|notification| kind.map_or(true, |kind| notification.kind == kind))
            .collect();
        let total = filtered.len();
        let notifications = filtered
            .into_iter()
            .skip(page.saturating_sub(1).saturating_mul(limit))
            .take(limit)
            .collect();

        let (catalog, _) = swept_catalog(self.jobs.as_ref(), now)?;
        Ok(DailyUpdates {
            notifications,
            unread_count,
            upcoming_deadlines: self.upcoming_deadlines(student, &catalog, now)?,
            recent_opportunities: self.recent_opportunities(catalog, now)?,
            pagination: Pagination { page, limit, total },
        })
    }

    fn company_name(&self, job: &Job) -> Result<Option<String>, PlacementError> {
        Ok(self.profiles.company(&job.company)?.map(|company| company.name))
    }

    fn upcoming_deadlines(
        &self,
        student: &StudentId,
        catalog: &[Job],
        now: DateTime<Utc>,
    ) -> Result<Vec<UpcomingDeadline>, PlacementError> {
        let mut deadlines = Vec::new();

        for application in self.applications.for_student(student)? {
            let Some(deadline) = application.next_deadline.filter(|deadline| *deadline > now) else {
                continue;
            };
            let Some(job) = catalog.iter().find(|job| job.id == application.job) else {
                continue;
            };
            deadlines.push(UpcomingDeadline {
                kind: DeadlineKind::ApplicationDeadline,
                title: format!("Deadline for {}", job.title),
                deadline,
                application_id: Some(application.id),
                company_name: self.company_name(job)?,
                job_id: job.id.clone(),
                job_title: job.title.clone(),
            });
        }

        for job in catalog {
            if !job.is_visible_to_students() || job.deadline <= now {
                continue;
            }
            deadlines.push(UpcomingDeadline {
                kind: DeadlineKind::JobDeadline,
                title: format!("Application deadline for {}", job.title),
                deadline: job.deadline,
                application_id: None,
                company_name: self.company_name(job)?,
                job_id: job.id.clone(),
                job_title: job.title.clone(),
            });
        }

        deadlines.sort_by(|left, right| left.deadline.cmp(&right.deadline));
        Ok(deadlines)
    }

    fn recent_opportunities(
        &self,
        catalog: Vec<Job>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Opportunity>, PlacementError> {
        let since = now - Duration::days(RECENT_OPPORTUNITY_DAYS);
        let mut recent: Vec<Job> = catalog
            .into_iter()
            .filter(|job| job.is_visible_to_students() && job.created_at >= since)
            .collect();
        recent.sort_by(|left, right| right.created_at.cmp(&left.created_at));
        recent.truncate(RECENT_OPPORTUNITY_LIMIT);

        let mut opportunities = Vec::with_capacity(recent.len());
        for job in recent {
            let company = self.profiles.company(&job.company)?;
            opportunities.push(Opportunity {
                id: job.id,
                title: job.title,
                company: company.as_ref().map(|company| company.name.clone()),
                industry: company.and_then(|company| company.industry),
                location: job.location,
                package: job.package,
                created_at: job.created_at,
            });
        }
        Ok(opportunities)
    }

    fn owned(
        &self,
        student: &StudentId,
        id: &NotificationId,
    ) -> Result<Notification, PlacementError> {
        self.notifications
            .fetch(id)?
            .filter(|notification| notification.belongs_to(student))
            .ok_or(PlacementError::NotFound("notification"))
    }

    pub fn mark_read(
        &self,
        student: &StudentId,
        id: &NotificationId,
        now: DateTime<Utc>,
    ) -> Result<Notification, PlacementError> {
        let mut notification = self.owned(student, id)?;
        notification.is_read = true;
        notification.updated_at = now;
        self.notifications.update(notification.clone())?;
        Ok(notification)
    }

    /// Mark every unread notification read, returning how many changed.
    pub fn mark_all_read(
        &self,
        student: &StudentId,
        now: DateTime<Utc>,
    ) -> Result<usize, PlacementError> {
        let mut changed = 0;
        for mut notification in self.visible(student)? {
            if notification.is_read {
                continue;
            }
            notification.is_read = true;
            notification.updated_at = now;
            self.notifications.update(notification)?;
            changed += 1;
        }
        Ok(changed)
    }

    pub fn delete(
        &self,
        student: &StudentId,
        id: &NotificationId,
        now: DateTime<Utc>,
    ) -> Result<(), PlacementError> {
        let mut notification = self.owned(student, id)?;
        notification.is_deleted = true;
        notification.updated_at = now;
        self.notifications.update(notification)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::workflows::ids::{CompanyId, TpoId};
    use crate::workflows::jobs::{JobDraft, JobTimeline, OperationalStatus};
    use crate::workflows::notifications::Priority;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 4, 1, 8, 0, 0).single().expect("valid")
    }

    fn feed() -> (NotificationFeed, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::default());
        let feed =
            NotificationFeed::new(store.clone(), store.clone(), store.clone(), store.clone());
        (feed, store)
    }

    fn notification(student: &str, kind: NotificationKind, minutes: i64) -> Notification {
        Notification::new(
            StudentId::from(student),
            kind,
            Priority::Medium,
            format!("note {minutes}"),
            "body",
            now() + Duration::minutes(minutes),
        )
    }

    #[test]
    fn daily_updates_paginate_newest_first_and_filter_by_kind() {
        let (feed, _) = feed();
        let student = StudentId::from("stu-1");
        for minutes in 0..5 {
            let note = notification("stu-1", NotificationKind::ApplicationUpdate, minutes);
            assert!(feed.deliver(note));
        }
        feed.deliver(notification("stu-1", NotificationKind::QuizReminder, 10));
        feed.deliver(notification("stu-2", NotificationKind::ApplicationUpdate, 11));

        let page = feed
            .daily_updates(
                &student,
                DailyUpdatesQuery {
                    page: Some(2),
                    limit: Some(2),
                    kind: Some("application_update".to_string()),
                },
                now(),
            )
            .expect("updates");
        assert_eq!(page.pagination.total, 5);
        assert_eq!(page.unread_count, 6);
        let titles: Vec<&str> = page
            .notifications
            .iter()
            .map(|notification| notification.title.as_str())
            .collect();
        assert_eq!(titles, vec!["note 2", "note 1"]);

        let invalid = feed.daily_updates(
            &student,
            DailyUpdatesQuery {
                kind: Some("bogus".to_string()),
                ..DailyUpdatesQuery::default()
            },
            now(),
        );
        assert!(matches!(invalid, Err(PlacementError::Validation(_))));
    }

    #[test]
    fn foreign_and_deleted_notifications_are_not_found() {
        let (feed, _) = feed();
        let owner = StudentId::from("stu-1");
        let stranger = StudentId::from("stu-2");
        let note = notification("stu-1", NotificationKind::GeneralAnnouncement, 0);
        let id = note.id.clone();
        feed.deliver(note);

        assert!(matches!(
            feed.mark_read(&stranger, &id, now()),
            Err(PlacementError::NotFound("notification"))
        ));
        assert!(feed.mark_read(&owner, &id, now()).expect("read").is_read);

        feed.delete(&owner, &id, now()).expect("delete");
        assert!(matches!(
            feed.mark_read(&owner, &id, now()),
            Err(PlacementError::NotFound("notification"))
        ));
        assert!(matches!(
            feed.delete(&owner, &id, now()),
            Err(PlacementError::NotFound("notification"))
        ));
        let updates = feed
            .daily_updates(&owner, DailyUpdatesQuery::default(), now())
            .expect("updates");
        assert!(updates.notifications.is_empty());
    }

    #[test]
    fn mark_all_read_counts_changes() {
        let (feed, _) = feed();
        let student = StudentId::from("stu-1");
        for minutes in 0..3 {
            feed.deliver(notification("stu-1", NotificationKind::ExamNotification, minutes));
        }
        assert_eq!(feed.mark_all_read(&student, now()).expect("mark"), 3);
        assert_eq!(feed.mark_all_read(&student, now()).expect("mark"), 0);
    }

    fn open_job_with_test_in(store: &MemoryStore, offset: Duration) -> JobId {
        let mut job = Job::from_draft(
            CompanyId::from("cmp-1"),
            JobDraft {
                title: Some("Data Analyst".to_string()),
                description: Some("Dashboards".to_string()),
                location: Some("Pune".to_string()),
                package: Some(8.0),
                deadline: Some(now() + Duration::days(10)),
                timeline: JobTimeline {
                    online_test: Some(now() + offset),
                    ..JobTimeline::default()
                },
                ..JobDraft::default()
            },
            now(),
        )
        .expect("job");
        job.approve(TpoId::from("tpo-1"), now()).expect("approve");
        JobRepository::insert(store, job).expect("insert").id
    }

    #[test]
    fn daily_updates_close_jobs_whose_online_test_passed() {
        let (feed, store) = feed();
        let job = open_job_with_test_in(&store, Duration::hours(1));
        let student = StudentId::from("stu-1");

        let before = feed
            .daily_updates(&student, DailyUpdatesQuery::default(), now())
            .expect("updates");
        assert_eq!(before.recent_opportunities.len(), 1);
        assert_eq!(before.upcoming_deadlines.len(), 1);

        let after = feed
            .daily_updates(&student, DailyUpdatesQuery::default(), now() + Duration::hours(3))
            .expect("updates");
        assert!(after.recent_opportunities.is_empty());
        assert!(after.upcoming_deadlines.is_empty());
        let stored = JobRepository::fetch(store.as_ref(), &job)
            .expect("fetch")
            .expect("exists");
        assert_eq!(stored.status, OperationalStatus::Closed);
    }

    #[test]
    fn huge_page_numbers_return_an_empty_page() {
        let (feed, _) = feed();
        let student = StudentId::from("stu-1");
        feed.deliver(notification("stu-1", NotificationKind::ApplicationUpdate, 0));

        let page = feed
            .daily_updates(
                &student,
                DailyUpdatesQuery {
                    page: Some(usize::MAX),
                    limit: Some(10),
                    kind: None,
                },
                now(),
            )
            .expect("updates");
        assert!(page.notifications.is_empty());
        assert_eq!(page.pagination.total, 1);
        assert_eq!(page.pagination.page, usize::MAX);
    }
}
