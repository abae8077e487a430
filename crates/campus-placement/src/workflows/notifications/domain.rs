use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::ids::{ApplicationId, JobId, NotificationId, QuestionSetId, StudentId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    DeadlineReminder,
    ExamNotification,
    NewOpportunity,
    ApplicationUpdate,
    InterviewScheduled,
    OfferReceived,
    PlacementAchieved,
    QuizReminder,
    GeneralAnnouncement,
}

impl NotificationKind {
    pub const fn ordered() -> [NotificationKind; 9] {
        [
            NotificationKind::DeadlineReminder,
            NotificationKind::ExamNotification,
            NotificationKind::NewOpportunity,
            NotificationKind::ApplicationUpdate,
            NotificationKind::InterviewScheduled,
            NotificationKind::OfferReceived,
            NotificationKind::PlacementAchieved,
            NotificationKind::QuizReminder,
            NotificationKind::GeneralAnnouncement,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            NotificationKind::DeadlineReminder => "deadline_reminder",
            NotificationKind::ExamNotification => "exam_notification",
            NotificationKind::NewOpportunity => "new_opportunity",
            NotificationKind::ApplicationUpdate => "application_update",
            NotificationKind::InterviewScheduled => "interview_scheduled",
            NotificationKind::OfferReceived => "offer_received",
            NotificationKind::PlacementAchieved => "placement_achieved",
            NotificationKind::QuizReminder => "quiz_reminder",
            NotificationKind::GeneralAnnouncement => "general_announcement",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ordered()
            .into_iter()
            .find(|kind| kind.label() == value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferSummary {
    pub package_total: f64,
    pub joining_date: Option<DateTime<Utc>>,
    pub company_name: Option<String>,
}

/// Optional links from a notification to the entity it describes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelatedData {
    pub application_id: Option<ApplicationId>,
    pub job_id: Option<JobId>,
    pub quiz_id: Option<QuestionSetId>,
    pub deadline_date: Option<DateTime<Utc>>,
    pub interview_date: Option<DateTime<Utc>>,
    pub interview_location: Option<String>,
    pub offer: Option<OfferSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub student: StudentId,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub priority: Priority,
    pub is_read: bool,
    pub is_deleted: bool,
    pub related: RelatedData,
    pub action_required: bool,
    pub action_url: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        student: StudentId,
        kind: NotificationKind,
        priority: Priority,
        title: impl Into<String>,
        message: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: NotificationId::generate(),
            student,
            title: title.into(),
            message: message.into(),
            kind,
            priority,
            is_read: false,
            is_deleted: false,
            related: RelatedData::default(),
            action_required: false,
            action_url: None,
            expires_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn belongs_to(&self, student: &StudentId) -> bool {
        &self.student == student && !self.is_deleted
    }
}
