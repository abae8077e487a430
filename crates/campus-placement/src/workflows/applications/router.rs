use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::Utc;

use crate::http::{ApiResponse, AuthUser, PlacementState};
use crate::workflows::error::PlacementError;
use crate::workflows::ids::{ApplicationId, JobId};

use super::domain::{Application, CompletionRequest, StageChangeRequest};
use super::service::{
    ApplicationTimelineView, JobApplications, MyApplications, PlacementTimeline, StageTransition,
};

pub fn application_routes() -> Router<PlacementState> {
    Router::new()
        .route("/student/apply/:job_id", post(apply_handler))
        .route("/student/my-applications", get(my_applications_handler))
        .route("/company/applications/:job_id", get(job_applications_handler))
        .route(
            "/timeline/applications/:application_id/stage",
            put(advance_handler),
        )
        .route(
            "/timeline/applications/:application_id/complete",
            put(complete_handler),
        )
        .route("/timeline/placement-timeline", get(placement_timeline_handler))
        .route(
            "/timeline/application/:application_id",
            get(application_timeline_handler),
        )
}

pub(crate) async fn apply_handler(
    State(state): State<PlacementState>,
    AuthUser(principal): AuthUser,
    Path(job_id): Path<String>,
) -> Result<ApiResponse<Application>, PlacementError> {
    let application = state.applications.apply(
        principal.student()?,
        &JobId::from(job_id.as_str()),
        Utc::now(),
    )?;
    Ok(ApiResponse::created(
        "application submitted successfully",
        application,
    ))
}

pub(crate) async fn my_applications_handler(
    State(state): State<PlacementState>,
    AuthUser(principal): AuthUser,
) -> Result<ApiResponse<MyApplications>, PlacementError> {
    let applications = state.applications.my_applications(principal.student()?)?;
    Ok(ApiResponse::ok("applications retrieved successfully", applications))
}

pub(crate) async fn job_applications_handler(
    State(state): State<PlacementState>,
    AuthUser(principal): AuthUser,
    Path(job_id): Path<String>,
) -> Result<ApiResponse<JobApplications>, PlacementError> {
    let applications = state
        .applications
        .job_applications(&principal, &JobId::from(job_id.as_str()))?;
    Ok(ApiResponse::ok("applications retrieved successfully", applications))
}

pub(crate) async fn advance_handler(
    State(state): State<PlacementState>,
    AuthUser(principal): AuthUser,
    Path(application_id): Path<String>,
    payload: Result<Json<StageChangeRequest>, JsonRejection>,
) -> Result<ApiResponse<StageTransition>, PlacementError> {
    let Json(request) = payload?;
    let transition = state.applications.advance(
        &principal,
        &ApplicationId::from(application_id.as_str()),
        request,
        Utc::now(),
    )?;
    Ok(ApiResponse::ok(
        format!("application moved to {}", transition.new_stage.label()),
        transition,
    ))
}

pub(crate) async fn complete_handler(
    State(state): State<PlacementState>,
    AuthUser(principal): AuthUser,
    Path(application_id): Path<String>,
    payload: Result<Json<CompletionRequest>, JsonRejection>,
) -> Result<ApiResponse<Application>, PlacementError> {
    let Json(request) = payload?;
    let application = state.applications.complete_stage(
        &principal,
        &ApplicationId::from(application_id.as_str()),
        request,
        Utc::now(),
    )?;
    Ok(ApiResponse::ok("stage marked as completed", application))
}

pub(crate) async fn placement_timeline_handler(
    State(state): State<PlacementState>,
    AuthUser(principal): AuthUser,
) -> Result<ApiResponse<PlacementTimeline>, PlacementError> {
    let timeline = state
        .applications
        .placement_timeline(principal.student()?, Utc::now())?;
    Ok(ApiResponse::ok(
        "placement timeline retrieved successfully",
        timeline,
    ))
}

pub(crate) async fn application_timeline_handler(
    State(state): State<PlacementState>,
    AuthUser(principal): AuthUser,
    Path(application_id): Path<String>,
) -> Result<ApiResponse<ApplicationTimelineView>, PlacementError> {
    let view = state.applications.application_timeline(
        principal.student()?,
        &ApplicationId::from(application_id.as_str()),
        Utc::now(),
    )?;
    Ok(ApiResponse::ok(
        "application timeline retrieved successfully",
        view,
    ))
}
