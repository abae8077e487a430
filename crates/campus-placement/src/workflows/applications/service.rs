use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::workflows::error::{PlacementError, RepositoryError};
use crate::workflows::identity::{Principal, ProfileDirectory, ProfileRef, StudentProfile};
use crate::workflows::ids::{ApplicationId, JobId, StudentId};
use crate::workflows::jobs::service::close_if_due;
use crate::workflows::jobs::{Job, JobRepository};
use crate::workflows::notifications::{Notification, NotificationFeed};

use super::domain::{
    Application, CompletionRequest, Stage, StageChange, StageChangeRequest, StageCompletion,
};
use super::notices::{completion_notice, stage_notice};
use super::progress::{overall_progress, status_description, timeline_steps, TimelineStep};
use super::repository::ApplicationRepository;

/// Job fields embedded in application views.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobSummary {
    pub id: JobId,
    pub title: String,
    pub location: String,
    pub package: f64,
    pub deadline: DateTime<Utc>,
    pub company_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageTransition {
    pub application_id: ApplicationId,
    pub previous_stage: Stage,
    pub new_stage: Stage,
    pub stage_progress: u8,
    pub next_deadline: Option<DateTime<Utc>>,
    pub notification_delivered: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct MyApplicationView {
    pub id: ApplicationId,
    pub application_number: String,
    pub job: JobSummary,
    pub status: Stage,
    pub status_description: &'static str,
    pub stage_progress: u8,
    pub applied_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub next_deadline: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StageCount {
    pub stage: Stage,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct MyApplications {
    pub total_applications: usize,
    pub applications: Vec<MyApplicationView>,
    pub by_stage: Vec<StageCount>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TimelineCard {
    pub application_id: ApplicationId,
    pub job: JobSummary,
    pub current_stage: Stage,
    pub stage_progress: u8,
    pub applied_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub next_deadline: Option<DateTime<Utc>>,
    pub timeline: Vec<TimelineStep>,
    pub overall_progress: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlacementStatistics {
    pub total_applications: usize,
    pub active_applications: usize,
    pub placed_applications: usize,
    /// Percentage rounded to one decimal place.
    pub placement_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlacementTimeline {
    pub timeline: Vec<TimelineCard>,
    pub statistics: PlacementStatistics,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApplicationTimelineView {
    pub application: Application,
    pub job: JobSummary,
    pub timeline: Vec<TimelineStep>,
    pub overall_progress: u8,
    pub notifications: Vec<Notification>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentSummary {
    pub id: StudentId,
    pub name: String,
    pub email: String,
    pub roll_number: String,
    pub branch: String,
    pub cgpa: Option<f32>,
}

impl From<StudentProfile> for StudentSummary {
    fn from(profile: StudentProfile) -> Self {
        Self {
            id: profile.id,
            name: profile.name,
            email: profile.email,
            roll_number: profile.roll_number,
            branch: profile.branch,
            cgpa: profile.cgpa,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ApplicantView {
    pub application_id: ApplicationId,
    pub application_number: String,
    pub student: Option<StudentSummary>,
    pub status: Stage,
    pub stage_progress: u8,
    pub applied_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobApplications {
    pub job_id: JobId,
    pub job_title: String,
    pub total_applications: usize,
    pub applications: Vec<ApplicantView>,
}

fn placement_rate(placed: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    ((placed as f64 / total as f64) * 1000.0).round() / 10.0
}

/// Applying, moving applications through their stages and the student-facing reads.
pub struct ApplicationService {
    applications: Arc<dyn ApplicationRepository>,
    jobs: Arc<dyn JobRepository>,
    profiles: Arc<dyn ProfileDirectory>,
    feed: Arc<NotificationFeed>,
}

impl ApplicationService {
    pub fn new(
        applications: Arc<dyn ApplicationRepository>,
        jobs: Arc<dyn JobRepository>,
        profiles: Arc<dyn ProfileDirectory>,
        feed: Arc<NotificationFeed>,
    ) -> Self {
        Self {
            applications,
            jobs,
            profiles,
            feed,
        }
    }

    fn job(&self, job_id: &JobId) -> Result<Job, PlacementError> {
        self.jobs.fetch(job_id)?.ok_or(PlacementError::NotFound("job"))
    }

    fn application(&self, id: &ApplicationId) -> Result<Application, PlacementError> {
        self.applications
            .fetch(id)?
            .ok_or(PlacementError::NotFound("application"))
    }

    fn company_name(&self, job: &Job) -> Result<Option<String>, PlacementError> {
        Ok(self.profiles.company(&job.company)?.map(|company| company.name))
    }

    fn job_summary(&self, job: &Job) -> Result<JobSummary, PlacementError> {
        Ok(JobSummary {
            id: job.id.clone(),
            title: job.title.clone(),
            location: job.location.clone(),
            package: job.package,
            deadline: job.deadline,
            company_name: self.company_name(job)?,
        })
    }

    /// Stage writes belong to a TPO or to the company that posted the job.
    fn authorize_actor(principal: &Principal, job: &Job) -> Result<(), PlacementError> {
        match &principal.profile {
            ProfileRef::Tpo(_) => Ok(()),
            ProfileRef::Company(company) if company == &job.company => Ok(()),
            ProfileRef::Company(_) => Err(PlacementError::forbidden(
                "only the company that posted this job can manage its applications",
            )),
            ProfileRef::Student(_) => Err(PlacementError::forbidden(
                "students cannot change application stages",
            )),
        }
    }

    pub fn apply(
        &self,
        student: &StudentId,
        job_id: &JobId,
        now: DateTime<Utc>,
    ) -> Result<Application, PlacementError> {
        if self.profiles.student(student)?.is_none() {
            return Err(PlacementError::NotFound("student"));
        }
        let mut job = self.job(job_id)?;
        close_if_due(self.jobs.as_ref(), &mut job, now)?;
        if !job.is_visible_to_students() {
            return Err(PlacementError::conflict("job is not open for applications"));
        }
        if self.applications.find(student, job_id)?.is_some() {
            return Err(PlacementError::conflict("already applied for this job"));
        }

        let application = Application::new(student.clone(), job_id.clone(), now);
        let stored = self.applications.insert(application).map_err(|error| match error {
            RepositoryError::Conflict => PlacementError::conflict("already applied for this job"),
            other => PlacementError::from(other),
        })?;
        info!(
            application_id = %stored.id,
            student_id = %student,
            job_id = %job_id,
            "application submitted"
        );
        Ok(stored)
    }

    /// Move an application to a later stage (or to Rejected) and notify the student.
    pub fn advance(
        &self,
        principal: &Principal,
        id: &ApplicationId,
        request: StageChangeRequest,
        now: DateTime<Utc>,
    ) -> Result<StageTransition, PlacementError> {
        if matches!(principal.profile, ProfileRef::Student(_)) {
            return Err(PlacementError::forbidden(
                "students cannot change application stages",
            ));
        }
        let change = StageChange::try_from(request)?;
        let mut application = self.application(id)?;
        let job = self.job(&application.job)?;
        Self::authorize_actor(principal, &job)?;

        let update = change.update.clone();
        let previous_stage = application.advance(change, now)?;
        self.applications.update(application.clone())?;
        info!(
            application_id = %application.id,
            from = previous_stage.label(),
            to = application.stage().label(),
            actor = principal.profile.id(),
            "application stage changed"
        );

        let company_name = self.company_name(&job)?;
        let notice = stage_notice(&application, &job, company_name.as_deref(), &update, now);
        let notification_delivered = self.feed.deliver(notice);
        if !notification_delivered {
            warn!(application_id = %application.id, "stage notification deferred to outbox");
        }

        Ok(StageTransition {
            application_id: application.id.clone(),
            previous_stage,
            new_stage: application.stage(),
            stage_progress: application.stage_progress(),
            next_deadline: application.next_deadline,
            notification_delivered,
        })
    }

    /// Mark a scheduled Test or Interview as having taken place.
    pub fn complete_stage(
        &self,
        principal: &Principal,
        id: &ApplicationId,
        request: CompletionRequest,
        now: DateTime<Utc>,
    ) -> Result<Application, PlacementError> {
        if matches!(principal.profile, ProfileRef::Student(_)) {
            return Err(PlacementError::forbidden(
                "students cannot change application stages",
            ));
        }
        let completion = StageCompletion::try_from(request)?;
        let mut application = self.application(id)?;
        let job = self.job(&application.job)?;
        Self::authorize_actor(principal, &job)?;

        application.complete(completion.clone(), now)?;
        self.applications.update(application.clone())?;
        info!(
            application_id = %application.id,
            stage = completion.stage().label(),
            "application stage completed"
        );
        self.feed
            .deliver(completion_notice(&application, &job, &completion, now));
        Ok(application)
    }

    fn newest_first(&self, student: &StudentId) -> Result<Vec<Application>, PlacementError> {
        let mut applications = self.applications.for_student(student)?;
        applications.sort_by(|left, right| right.applied_at.cmp(&left.applied_at));
        Ok(applications)
    }

    pub fn my_applications(&self, student: &StudentId) -> Result<MyApplications, PlacementError> {
        let mut views = Vec::new();
        for application in self.newest_first(student)? {
            let Some(job) = self.jobs.fetch(&application.job)? else {
                continue;
            };
            views.push(MyApplicationView {
                id: application.id.clone(),
                application_number: application.application_number(),
                job: self.job_summary(&job)?,
                status: application.stage(),
                status_description: status_description(application.stage()),
                stage_progress: application.stage_progress(),
                applied_at: application.applied_at,
                last_updated: application.last_updated,
                next_deadline: application.next_deadline,
            });
        }

        let by_stage = Stage::ALL
            .into_iter()
            .map(|stage| StageCount {
                stage,
                count: views.iter().filter(|view| view.status == stage).count(),
            })
            .collect();

        Ok(MyApplications {
            total_applications: views.len(),
            applications: views,
            by_stage,
        })
    }

    pub fn placement_timeline(
        &self,
        student: &StudentId,
        now: DateTime<Utc>,
    ) -> Result<PlacementTimeline, PlacementError> {
        let applications = self.newest_first(student)?;
        let total = applications.len();
        let active = applications.iter().filter(|app| app.is_active()).count();
        let placed = applications
            .iter()
            .filter(|app| app.stage() == Stage::Placed)
            .count();

        let mut cards = Vec::with_capacity(total);
        for application in applications {
            let Some(job) = self.jobs.fetch(&application.job)? else {
                continue;
            };
            let steps = timeline_steps(&application, now);
            cards.push(TimelineCard {
                application_id: application.id.clone(),
                job: self.job_summary(&job)?,
                current_stage: application.stage(),
                stage_progress: application.stage_progress(),
                applied_at: application.applied_at,
                last_updated: application.last_updated,
                next_deadline: application.next_deadline,
                overall_progress: overall_progress(&steps),
                timeline: steps,
            });
        }

        Ok(PlacementTimeline {
            timeline: cards,
            statistics: PlacementStatistics {
                total_applications: total,
                active_applications: active,
                placed_applications: placed,
                placement_rate: placement_rate(placed, total),
            },
        })
    }

    /// One application's timeline with its notifications. Visible to the owning student only.
    pub fn application_timeline(
        &self,
        student: &StudentId,
        id: &ApplicationId,
        now: DateTime<Utc>,
    ) -> Result<ApplicationTimelineView, PlacementError> {
        let application = self
            .applications
            .fetch(id)?
            .filter(|application| &application.student == student)
            .ok_or(PlacementError::NotFound("application"))?;
        let job = self.job(&application.job)?;
        let steps = timeline_steps(&application, now);
        Ok(ApplicationTimelineView {
            notifications: self.feed.for_application(student, &application.id)?,
            job: self.job_summary(&job)?,
            overall_progress: overall_progress(&steps),
            timeline: steps,
            application,
        })
    }

    pub fn job_applications(
        &self,
        principal: &Principal,
        job_id: &JobId,
    ) -> Result<JobApplications, PlacementError> {
        let job = self.job(job_id)?;
        Self::authorize_actor(principal, &job)?;

        let mut applications = self.applications.for_job(job_id)?;
        applications.sort_by(|left, right| right.applied_at.cmp(&left.applied_at));
        let mut views = Vec::with_capacity(applications.len());
        for application in applications {
            views.push(ApplicantView {
                application_id: application.id.clone(),
                application_number: application.application_number(),
                student: self
                    .profiles
                    .student(&application.student)?
                    .map(StudentSummary::from),
                status: application.stage(),
                stage_progress: application.stage_progress(),
                applied_at: application.applied_at,
                last_updated: application.last_updated,
            });
        }

        Ok(JobApplications {
            job_id: job.id,
            job_title: job.title,
            total_applications: views.len(),
            applications: views,
        })
    }
}
