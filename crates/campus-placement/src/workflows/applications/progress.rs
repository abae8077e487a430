use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{Application, Stage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Completed,
    Overdue,
    Pending,
}

/// One row of the per-application placement timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineStep {
    pub stage: Stage,
    pub date: Option<DateTime<Utc>>,
    pub completed: bool,
    pub status: StepStatus,
    pub description: String,
}

fn day(date: DateTime<Utc>) -> String {
    date.format("%d %b %Y").to_string()
}

fn scheduled_status(
    completed: bool,
    date: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> StepStatus {
    match (completed, date) {
        (true, _) => StepStatus::Completed,
        (false, Some(date)) if date < now => StepStatus::Overdue,
        _ => StepStatus::Pending,
    }
}

fn settled_status(completed: bool) -> StepStatus {
    if completed {
        StepStatus::Completed
    } else {
        StepStatus::Pending
    }
}

/// Build the six canonical timeline rows. Only Test and Interview can be overdue.
pub fn timeline_steps(application: &Application, now: DateTime<Utc>) -> Vec<TimelineStep> {
    let timeline = &application.timeline;

    let test_description = match (timeline.test.completed, timeline.test.date) {
        (true, _) => match timeline.test.score {
            Some(score) => format!("Test completed with score: {score}"),
            None => "Test completed".to_string(),
        },
        (false, Some(date)) => format!("Test scheduled for {}", day(date)),
        (false, None) => "Test not scheduled yet".to_string(),
    };
    let interview_description = match (timeline.interview.completed, timeline.interview.date) {
        (true, _) => "Interview completed successfully".to_string(),
        (false, Some(date)) => format!("Interview scheduled for {}", day(date)),
        (false, None) => "Interview not scheduled yet".to_string(),
    };
    let offer_description = match (&timeline.offer.package, timeline.offer.completed) {
        (Some(package), true) => format!("Offer received with package: {} LPA", package.total),
        _ => "Awaiting offer".to_string(),
    };
    let placed_description = match (timeline.placed.joining_date, timeline.placed.completed) {
        (Some(joining), true) => format!("Successfully placed! Joining on {}", day(joining)),
        _ => "Final placement stage".to_string(),
    };

    vec![
        TimelineStep {
            stage: Stage::Applied,
            date: Some(timeline.applied.date),
            completed: timeline.applied.completed,
            status: StepStatus::Completed,
            description: "Application submitted successfully".to_string(),
        },
        TimelineStep {
            stage: Stage::Test,
            date: timeline.test.date,
            completed: timeline.test.completed,
            status: scheduled_status(timeline.test.completed, timeline.test.date, now),
            description: test_description,
        },
        TimelineStep {
            stage: Stage::Shortlisted,
            date: timeline.shortlisted.date,
            completed: timeline.shortlisted.completed,
            status: settled_status(timeline.shortlisted.completed),
            description: if timeline.shortlisted.completed {
                "Successfully shortlisted for next round".to_string()
            } else {
                "Awaiting shortlisting decision".to_string()
            },
        },
        TimelineStep {
            stage: Stage::Interview,
            date: timeline.interview.date,
            completed: timeline.interview.completed,
            status: scheduled_status(
                timeline.interview.completed,
                timeline.interview.date,
                now,
            ),
            description: interview_description,
        },
        TimelineStep {
            stage: Stage::Offer,
            date: timeline.offer.date,
            completed: timeline.offer.completed,
            status: settled_status(timeline.offer.completed),
            description: offer_description,
        },
        TimelineStep {
            stage: Stage::Placed,
            date: timeline.placed.date,
            completed: timeline.placed.completed,
            status: settled_status(timeline.placed.completed),
            description: placed_description,
        },
    ]
}

/// Percentage of completed rows, rounded to a whole number.
pub fn overall_progress(steps: &[TimelineStep]) -> u8 {
    if steps.is_empty() {
        return 0;
    }
    let completed = steps.iter().filter(|step| step.completed).count();
    ((completed as f64 / steps.len() as f64) * 100.0).round() as u8
}

pub fn status_description(stage: Stage) -> &'static str {
    match stage {
        Stage::Applied => "Your application has been submitted and is under review",
        Stage::Test => "An assessment has been scheduled for this application",
        Stage::Shortlisted => "Congratulations! You have been shortlisted for the next round",
        Stage::Interview => "You have been selected for an interview. Please prepare well!",
        Stage::Offer => "Excellent! You have received a job offer",
        Stage::Placed => "Congratulations! You have been successfully placed",
        Stage::Rejected => "Unfortunately, your application was not selected this time",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::applications::domain::{InterviewMode, StageChange, StageUpdate};
    use crate::workflows::ids::{JobId, StudentId};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 2, 1, 9, 0, 0).single().expect("valid")
    }

    #[test]
    fn fresh_application_has_one_completed_row() {
        let application = Application::new(StudentId::from("stu-1"), JobId::from("job-1"), now());
        let steps = timeline_steps(&application, now());
        assert_eq!(steps.len(), 6);
        assert_eq!(steps[0].status, StepStatus::Completed);
        assert!(steps[1..].iter().all(|step| step.status == StepStatus::Pending));
        assert_eq!(overall_progress(&steps), 17);
    }

    #[test]
    fn elapsed_unfinished_interview_is_overdue() {
        let mut application =
            Application::new(StudentId::from("stu-1"), JobId::from("job-1"), now());
        application
            .advance(
                StageChange {
                    update: StageUpdate::Interview {
                        date: now() + Duration::days(1),
                        location: "Hall A".to_string(),
                        mode: InterviewMode::Online,
                        interviewer: "Panel".to_string(),
                        duration: None,
                        instructions: None,
                    },
                    next_deadline: None,
                },
                now(),
            )
            .expect("advance");

        let before = timeline_steps(&application, now());
        assert_eq!(before[3].status, StepStatus::Pending);

        let after = timeline_steps(&application, now() + Duration::days(2));
        assert_eq!(after[3].status, StepStatus::Overdue);
        assert!(after[3].description.starts_with("Interview scheduled for"));
    }
}
