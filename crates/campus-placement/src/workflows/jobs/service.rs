use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::workflows::applications::ApplicationRepository;
use crate::workflows::error::{PlacementError, RepositoryError};
use crate::workflows::identity::{CompanyProfile, ProfileDirectory};
use crate::workflows::ids::{CompanyId, JobId, StudentId, TpoId};

use super::domain::{ApprovalStatus, Job, JobDraft, OperationalStatus};
use super::repository::JobRepository;
use super::urgency::{countdown, status_info, Countdown, StatusInfo};

const RECENT_WINDOW_DAYS: i64 = 7;

/// Company fields embedded in job views.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanySummary {
    pub id: CompanyId,
    pub name: String,
    pub email: String,
    pub industry: Option<String>,
    pub website: Option<String>,
}

impl From<CompanyProfile> for CompanySummary {
    fn from(profile: CompanyProfile) -> Self {
        Self {
            id: profile.id,
            name: profile.name,
            email: profile.email,
            industry: profile.industry,
            website: profile.website,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CompanyJobView {
    #[serde(flatten)]
    pub job: Job,
    pub status_info: StatusInfo,
    pub countdown: Countdown,
    pub application_count: usize,
    pub is_expired: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompanyJobListing {
    pub total_jobs: usize,
    pub open_jobs: usize,
    pub closed_jobs: usize,
    pub expired_jobs: usize,
    pub jobs: Vec<CompanyJobView>,
}

/// Card shown on the student home page.
#[derive(Debug, Clone, Serialize)]
pub struct OpenJobView {
    pub id: JobId,
    pub title: String,
    pub company_name: Option<String>,
    pub location: String,
    pub package: f64,
    pub eligibility_criteria: Vec<String>,
    pub deadline: DateTime<Utc>,
    pub countdown: Countdown,
    pub is_applied: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentHome {
    pub total_jobs: usize,
    pub jobs: Vec<OpenJobView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentJobDetails {
    #[serde(flatten)]
    pub job: Job,
    pub company: Option<CompanySummary>,
    pub has_applied: bool,
    pub application_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewJobView {
    #[serde(flatten)]
    pub job: Job,
    pub company: Option<CompanySummary>,
    pub days_since_created: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewQueue {
    pub total: usize,
    pub jobs: Vec<ReviewJobView>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ApprovalCounts {
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ApprovalPercentages {
    pub pending: f64,
    pub approved: f64,
    pub rejected: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApprovalStats {
    pub total: ApprovalCounts,
    pub recent: ApprovalCounts,
    pub percentages: ApprovalPercentages,
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    ((part as f64 / whole as f64) * 1000.0).round() / 10.0
}

/// Close `job` in place and persist it when its online test has passed.
pub(crate) fn close_if_due(
    jobs: &dyn JobRepository,
    job: &mut Job,
    now: DateTime<Utc>,
) -> Result<bool, RepositoryError> {
    if !job.should_auto_close(now) {
        return Ok(false);
    }
    job.close(now);
    jobs.update(job.clone())?;
    info!(job_id = %job.id, title = %job.title, "job auto-closed after online test date");
    Ok(true)
}

/// Close every due job, then return the whole catalog in its post-sweep state.
pub(crate) fn swept_catalog(
    jobs: &dyn JobRepository,
    now: DateTime<Utc>,
) -> Result<(Vec<Job>, Vec<Job>), RepositoryError> {
    let mut catalog = jobs.list()?;
    let mut closed = Vec::new();
    for job in catalog.iter_mut() {
        if close_if_due(jobs, job, now)? {
            closed.push(job.clone());
        }
    }
    Ok((catalog, closed))
}

/// Catalog reads for companies and students plus the TPO approval workflow.
pub struct JobService {
    jobs: Arc<dyn JobRepository>,
    applications: Arc<dyn ApplicationRepository>,
    profiles: Arc<dyn ProfileDirectory>,
}

impl JobService {
    pub fn new(
        jobs: Arc<dyn JobRepository>,
        applications: Arc<dyn ApplicationRepository>,
        profiles: Arc<dyn ProfileDirectory>,
    ) -> Self {
        Self {
            jobs,
            applications,
            profiles,
        }
    }

    pub fn create_job(
        &self,
        company: &CompanyId,
        draft: JobDraft,
        now: DateTime<Utc>,
    ) -> Result<Job, PlacementError> {
        if self.profiles.company(company)?.is_none() {
            return Err(PlacementError::NotFound("company"));
        }
        let job = Job::from_draft(company.clone(), draft, now)?;
        let stored = self.jobs.insert(job)?;
        info!(job_id = %stored.id, company_id = %company, "job created pending approval");
        Ok(stored)
    }

    /// Close every open job whose online test is in the past. Idempotent.
    pub fn sweep_expired(&self, now: DateTime<Utc>) -> Result<Vec<Job>, PlacementError> {
        let (_, closed) = swept_catalog(self.jobs.as_ref(), now)?;
        debug!(closed = closed.len(), "auto-close sweep finished");
        Ok(closed)
    }

    fn company_summary(
        &self,
        company: &CompanyId,
    ) -> Result<Option<CompanySummary>, PlacementError> {
        Ok(self.profiles.company(company)?.map(CompanySummary::from))
    }

    fn job(&self, job_id: &JobId) -> Result<Job, PlacementError> {
        self.jobs.fetch(job_id)?.ok_or(PlacementError::NotFound("job"))
    }

    pub fn company_jobs(
        &self,
        company: &CompanyId,
        now: DateTime<Utc>,
    ) -> Result<CompanyJobListing, PlacementError> {
        self.sweep_expired(now)?;
        let mut owned: Vec<Job> = self
            .jobs
            .list()?
            .into_iter()
            .filter(|job| &job.company == company)
            .collect();
        owned.sort_by(|left, right| right.created_at.cmp(&left.created_at));

        let mut views = Vec::with_capacity(owned.len());
        for job in owned {
            let application_count = self.applications.for_job(&job.id)?.len();
            views.push(CompanyJobView {
                status_info: status_info(&job, now),
                countdown: countdown(&job, now),
                is_expired: job.deadline < now,
                application_count,
                job,
            });
        }

        Ok(CompanyJobListing {
            total_jobs: views.len(),
            open_jobs: views
                .iter()
                .filter(|view| view.job.status == OperationalStatus::Open)
                .count(),
            closed_jobs: views
                .iter()
                .filter(|view| view.job.status == OperationalStatus::Closed)
                .count(),
            expired_jobs: views.iter().filter(|view| view.is_expired).count(),
            jobs: views,
        })
    }

    /// Approved and open jobs, newest first.
    pub fn student_home(
        &self,
        student: &StudentId,
        now: DateTime<Utc>,
    ) -> Result<StudentHome, PlacementError> {
        self.sweep_expired(now)?;
        let applied: HashSet<JobId> = self
            .applications
            .for_student(student)?
            .into_iter()
            .map(|application| application.job)
            .collect();

        let mut visible: Vec<Job> = self
            .jobs
            .list()?
            .into_iter()
            .filter(Job::is_visible_to_students)
            .collect();
        visible.sort_by(|left, right| right.created_at.cmp(&left.created_at));

        let mut cards = Vec::with_capacity(visible.len());
        for job in visible {
            let company_name = self.profiles.company(&job.company)?.map(|company| company.name);
            cards.push(OpenJobView {
                countdown: countdown(&job, now),
                is_applied: applied.contains(&job.id),
                id: job.id,
                title: job.title,
                company_name,
                location: job.location,
                package: job.package,
                eligibility_criteria: job.eligibility_criteria,
                deadline: job.deadline,
            });
        }

        Ok(StudentHome {
            total_jobs: cards.len(),
            jobs: cards,
        })
    }

    pub fn student_job(
        &self,
        student: &StudentId,
        job_id: &JobId,
        now: DateTime<Utc>,
    ) -> Result<StudentJobDetails, PlacementError> {
        let mut job = self.job(job_id)?;
        close_if_due(self.jobs.as_ref(), &mut job, now)?;
        if job.approval_status != ApprovalStatus::Approved {
            return Err(PlacementError::forbidden(
                "this job is not available for viewing",
            ));
        }
        let applications = self.applications.for_job(&job.id)?;
        let has_applied = applications
            .iter()
            .any(|application| &application.student == student);
        Ok(StudentJobDetails {
            company: self.company_summary(&job.company)?,
            has_applied,
            application_count: applications.len(),
            job,
        })
    }

    fn review_queue(
        &self,
        status: ApprovalStatus,
        now: DateTime<Utc>,
    ) -> Result<ReviewQueue, PlacementError> {
        let (catalog, _) = swept_catalog(self.jobs.as_ref(), now)?;
        let mut jobs: Vec<Job> = catalog
            .into_iter()
            .filter(|job| job.approval_status == status)
            .collect();
        match status {
            ApprovalStatus::Pending => {
                jobs.sort_by(|left, right| right.created_at.cmp(&left.created_at))
            }
            ApprovalStatus::Approved => {
                jobs.sort_by(|left, right| right.approved_at.cmp(&left.approved_at))
            }
            ApprovalStatus::Rejected => {
                jobs.sort_by(|left, right| right.updated_at.cmp(&left.updated_at))
            }
        }

        let mut views = Vec::with_capacity(jobs.len());
        for job in jobs {
            views.push(self.review_view(job, now)?);
        }
        Ok(ReviewQueue {
            total: views.len(),
            jobs: views,
        })
    }

    fn review_view(&self, job: Job, now: DateTime<Utc>) -> Result<ReviewJobView, PlacementError> {
        Ok(ReviewJobView {
            company: self.company_summary(&job.company)?,
            days_since_created: (now - job.created_at).num_days(),
            job,
        })
    }

    pub fn pending_jobs(&self, now: DateTime<Utc>) -> Result<ReviewQueue, PlacementError> {
        self.review_queue(ApprovalStatus::Pending, now)
    }

    pub fn approved_jobs(&self, now: DateTime<Utc>) -> Result<ReviewQueue, PlacementError> {
        self.review_queue(ApprovalStatus::Approved, now)
    }

    pub fn rejected_jobs(&self, now: DateTime<Utc>) -> Result<ReviewQueue, PlacementError> {
        self.review_queue(ApprovalStatus::Rejected, now)
    }

    pub fn job_details(
        &self,
        job_id: &JobId,
        now: DateTime<Utc>,
    ) -> Result<ReviewJobView, PlacementError> {
        let mut job = self.job(job_id)?;
        close_if_due(self.jobs.as_ref(), &mut job, now)?;
        self.review_view(job, now)
    }

    pub fn approval_stats(&self, now: DateTime<Utc>) -> Result<ApprovalStats, PlacementError> {
        let since = now - Duration::days(RECENT_WINDOW_DAYS);
        let mut total = ApprovalCounts::default();
        let mut recent = ApprovalCounts::default();

        for job in self.jobs.list()? {
            match job.approval_status {
                ApprovalStatus::Pending => {
                    total.pending += 1;
                    if job.created_at >= since {
                        recent.pending += 1;
                    }
                }
                ApprovalStatus::Approved => {
                    total.approved += 1;
                    if job.approved_at.is_some_and(|approved_at| approved_at >= since) {
                        recent.approved += 1;
                    }
                }
                ApprovalStatus::Rejected => {
                    total.rejected += 1;
                    if job.updated_at >= since {
                        recent.rejected += 1;
                    }
                }
            }
        }
        total.total = total.pending + total.approved + total.rejected;
        recent.total = recent.pending + recent.approved + recent.rejected;

        Ok(ApprovalStats {
            percentages: ApprovalPercentages {
                pending: percentage(total.pending, total.total),
                approved: percentage(total.approved, total.total),
                rejected: percentage(total.rejected, total.total),
            },
            total,
            recent,
        })
    }

    pub fn approve(
        &self,
        reviewer: &TpoId,
        job_id: &JobId,
        now: DateTime<Utc>,
    ) -> Result<Job, PlacementError> {
        let mut job = self.job(job_id)?;
        job.approve(reviewer.clone(), now)?;
        self.jobs.update(job.clone())?;
        info!(job_id = %job.id, tpo_id = %reviewer, "job approved");
        Ok(job)
    }

    pub fn reject(
        &self,
        reviewer: &TpoId,
        job_id: &JobId,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<Job, PlacementError> {
        let mut job = self.job(job_id)?;
        job.reject(reviewer.clone(), reason, now)?;
        self.jobs.update(job.clone())?;
        info!(job_id = %job.id, tpo_id = %reviewer, "job rejected");
        Ok(job)
    }

    pub fn delete(&self, job_id: &JobId) -> Result<Job, PlacementError> {
        let removed = self
            .jobs
            .remove(job_id)?
            .ok_or(PlacementError::NotFound("job"))?;
        info!(job_id = %removed.id, "job deleted");
        Ok(removed)
    }
}
