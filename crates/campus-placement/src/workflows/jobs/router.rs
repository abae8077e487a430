use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;

use crate::http::{ApiResponse, AuthUser, PlacementState};
use crate::workflows::error::PlacementError;
use crate::workflows::ids::JobId;

use super::domain::{Job, JobDraft};
use super::service::{
    ApprovalStats, CompanyJobListing, ReviewJobView, ReviewQueue, StudentHome, StudentJobDetails,
};

#[derive(Debug, Deserialize)]
pub(crate) struct RejectionRequest {
    #[serde(alias = "rejectionReason")]
    rejection_reason: Option<String>,
}

pub fn job_routes() -> Router<PlacementState> {
    Router::new()
        .route("/company/create-job", post(create_job_handler))
        .route("/company/jobs", get(company_jobs_handler))
        .route("/student/home", get(student_home_handler))
        .route("/student/job/:job_id", get(student_job_handler))
        .route("/tpo/job-approval/pending", get(pending_handler))
        .route("/tpo/job-approval/approved", get(approved_handler))
        .route("/tpo/job-approval/rejected", get(rejected_handler))
        .route("/tpo/job-approval/stats", get(stats_handler))
        .route("/tpo/job-approval/job/:job_id", get(job_details_handler))
        .route("/tpo/job-approval/approve/:job_id", post(approve_handler))
        .route("/tpo/job-approval/reject/:job_id", post(reject_handler))
        .route("/tpo/jobs/:job_id", delete(delete_handler))
}

pub(crate) async fn create_job_handler(
    State(state): State<PlacementState>,
    AuthUser(principal): AuthUser,
    payload: Result<Json<JobDraft>, JsonRejection>,
) -> Result<ApiResponse<Job>, PlacementError> {
    let company = principal.company()?;
    let Json(draft) = payload?;
    let job = state.jobs.create_job(company, draft, Utc::now())?;
    Ok(ApiResponse::created("job created successfully", job))
}

pub(crate) async fn company_jobs_handler(
    State(state): State<PlacementState>,
    AuthUser(principal): AuthUser,
) -> Result<ApiResponse<CompanyJobListing>, PlacementError> {
    let listing = state.jobs.company_jobs(principal.company()?, Utc::now())?;
    Ok(ApiResponse::ok("jobs retrieved successfully", listing))
}

pub(crate) async fn student_home_handler(
    State(state): State<PlacementState>,
    AuthUser(principal): AuthUser,
) -> Result<ApiResponse<StudentHome>, PlacementError> {
    let home = state.jobs.student_home(principal.student()?, Utc::now())?;
    Ok(ApiResponse::ok("open jobs retrieved successfully", home))
}

pub(crate) async fn student_job_handler(
    State(state): State<PlacementState>,
    AuthUser(principal): AuthUser,
    Path(job_id): Path<String>,
) -> Result<ApiResponse<StudentJobDetails>, PlacementError> {
    let details = state.jobs.student_job(
        principal.student()?,
        &JobId::from(job_id.as_str()),
        Utc::now(),
    )?;
    Ok(ApiResponse::ok("job details retrieved successfully", details))
}

pub(crate) async fn pending_handler(
    State(state): State<PlacementState>,
    AuthUser(principal): AuthUser,
) -> Result<ApiResponse<ReviewQueue>, PlacementError> {
    principal.tpo()?;
    let queue = state.jobs.pending_jobs(Utc::now())?;
    Ok(ApiResponse::ok("pending jobs retrieved successfully", queue))
}

pub(crate) async fn approved_handler(
    State(state): State<PlacementState>,
    AuthUser(principal): AuthUser,
) -> Result<ApiResponse<ReviewQueue>, PlacementError> {
    principal.tpo()?;
    let queue = state.jobs.approved_jobs(Utc::now())?;
    Ok(ApiResponse::ok("approved jobs retrieved successfully", queue))
}

pub(crate) async fn rejected_handler(
    State(state): State<PlacementState>,
    AuthUser(principal): AuthUser,
) -> Result<ApiResponse<ReviewQueue>, PlacementError> {
    principal.tpo()?;
    let queue = state.jobs.rejected_jobs(Utc::now())?;
    Ok(ApiResponse::ok("rejected jobs retrieved successfully", queue))
}

pub(crate) async fn stats_handler(
    State(state): State<PlacementState>,
    AuthUser(principal): AuthUser,
) -> Result<ApiResponse<ApprovalStats>, PlacementError> {
    principal.tpo()?;
    let stats = state.jobs.approval_stats(Utc::now())?;
    Ok(ApiResponse::ok(
        "job approval statistics retrieved successfully",
        stats,
    ))
}

pub(crate) async fn job_details_handler(
    State(state): State<PlacementState>,
    AuthUser(principal): AuthUser,
    Path(job_id): Path<String>,
) -> Result<ApiResponse<ReviewJobView>, PlacementError> {
    principal.tpo()?;
    let view = state
        .jobs
        .job_details(&JobId::from(job_id.as_str()), Utc::now())?;
    Ok(ApiResponse::ok("job details retrieved successfully", view))
}

pub(crate) async fn approve_handler(
    State(state): State<PlacementState>,
    AuthUser(principal): AuthUser,
    Path(job_id): Path<String>,
) -> Result<ApiResponse<Job>, PlacementError> {
    let reviewer = principal.tpo()?;
    let job = state
        .jobs
        .approve(reviewer, &JobId::from(job_id.as_str()), Utc::now())?;
    Ok(ApiResponse::ok("job approved successfully", job))
}

pub(crate) async fn reject_handler(
    State(state): State<PlacementState>,
    AuthUser(principal): AuthUser,
    Path(job_id): Path<String>,
    payload: Result<Json<RejectionRequest>, JsonRejection>,
) -> Result<ApiResponse<Job>, PlacementError> {
    let reviewer = principal.tpo()?;
    let Json(request) = payload?;
    let reason = request.rejection_reason.unwrap_or_default();
    let job = state.jobs.reject(
        reviewer,
        &JobId::from(job_id.as_str()),
        &reason,
        Utc::now(),
    )?;
    Ok(ApiResponse::ok("job rejected successfully", job))
}

pub(crate) async fn delete_handler(
    State(state): State<PlacementState>,
    AuthUser(principal): AuthUser,
    Path(job_id): Path<String>,
) -> Result<ApiResponse<Job>, PlacementError> {
    principal.tpo()?;
    let job = state.jobs.delete(&JobId::from(job_id.as_str()))?;
    Ok(ApiResponse::ok("job deleted successfully", job))
}
