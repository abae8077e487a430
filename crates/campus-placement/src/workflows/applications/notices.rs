//! Student notifications emitted by stage changes and completions.

use chrono::{DateTime, Utc};

use crate::workflows::jobs::Job;
use crate::workflows::notifications::{
    Notification, NotificationKind, OfferSummary, Priority, RelatedData,
};

use super::domain::{Application, StageCompletion, StageUpdate};

fn day(date: DateTime<Utc>) -> String {
    date.format("%d %b %Y").to_string()
}

fn linked(application: &Application) -> RelatedData {
    RelatedData {
        application_id: Some(application.id.clone()),
        job_id: Some(application.job.clone()),
        ..RelatedData::default()
    }
}

fn action_url(application: &Application) -> String {
    format!("/timeline/application/{}", application.id)
}

/// Notification for a stage transition that has just been applied.
pub(crate) fn stage_notice(
    application: &Application,
    job: &Job,
    company_name: Option<&str>,
    update: &StageUpdate,
    now: DateTime<Utc>,
) -> Notification {
    let mut related = linked(application);
    let mut action_required = false;

    let (priority, title, message) = match update {
        StageUpdate::Test { date, location, .. } => {
            related.deadline_date = Some(*date);
            action_required = true;
            (
                Priority::High,
                "Test Scheduled",
                format!(
                    "Test scheduled for {} on {} at {location}",
                    job.title,
                    day(*date)
                ),
            )
        }
        StageUpdate::Shortlisted { .. } => (
            Priority::High,
            "Congratulations! Shortlisted",
            format!("You have been shortlisted for {}", job.title),
        ),
        StageUpdate::Interview { date, location, .. } => {
            related.interview_date = Some(*date);
            related.interview_location = Some(location.clone());
            action_required = true;
            (
                Priority::High,
                "Interview Scheduled",
                format!("Interview scheduled for {} on {}", job.title, day(*date)),
            )
        }
        StageUpdate::Offer {
            package,
            joining_date,
            ..
        } => {
            related.offer = Some(OfferSummary {
                package_total: package.total,
                joining_date: Some(*joining_date),
                company_name: company_name.map(str::to_string),
            });
            action_required = true;
            (
                Priority::Urgent,
                "Offer Received!",
                format!(
                    "Congratulations! You have received an offer for {} with package {} LPA",
                    job.title, package.total
                ),
            )
        }
        StageUpdate::Placed { .. } => (
            Priority::Urgent,
            "Placement Achieved!",
            format!(
                "Congratulations! You have been successfully placed at {}",
                company_name.unwrap_or(job.title.as_str())
            ),
        ),
        StageUpdate::Rejected { reason } => (
            Priority::Medium,
            "Application Status Update",
            match reason {
                Some(reason) => format!(
                    "Your application for {} was not selected: {reason}",
                    job.title
                ),
                None => format!("Your application for {} was not selected this time", job.title),
            },
        ),
    };

    let mut notice = Notification::new(
        application.student.clone(),
        NotificationKind::ApplicationUpdate,
        priority,
        title,
        message,
        now,
    );
    notice.related = related;
    notice.action_required = action_required;
    notice.action_url = Some(action_url(application));
    notice
}

/// Notification for a Test or Interview being marked as taken place.
pub(crate) fn completion_notice(
    application: &Application,
    job: &Job,
    completion: &StageCompletion,
    now: DateTime<Utc>,
) -> Notification {
    let (title, message) = match completion {
        StageCompletion::Test { score } => (
            "Test Completed",
            format!("Your test for {} has been evaluated with score {score}", job.title),
        ),
        StageCompletion::Interview { .. } => (
            "Interview Completed",
            format!("Your interview for {} has been completed", job.title),
        ),
    };

    let mut notice = Notification::new(
        application.student.clone(),
        NotificationKind::ApplicationUpdate,
        Priority::Medium,
        title,
        message,
        now,
    );
    notice.related = linked(application);
    notice.action_url = Some(action_url(application));
    notice
}
