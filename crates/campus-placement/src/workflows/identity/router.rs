use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;

use crate::http::{ApiResponse, AuthUser, PlacementState};
use crate::workflows::error::PlacementError;

use super::domain::{LoginRequest, Profile, RegistrationRequest, UserView};
use super::service::LoginOutcome;

pub fn identity_routes() -> Router<PlacementState> {
    Router::new()
        .route("/auth/register", post(register_handler))
        .route("/auth/login", post(login_handler))
        .route("/auth/me", get(me_handler))
}

pub(crate) async fn register_handler(
    State(state): State<PlacementState>,
    payload: Result<Json<RegistrationRequest>, JsonRejection>,
) -> Result<ApiResponse<UserView>, PlacementError> {
    let Json(request) = payload?;
    let user = state.identity.register(request, Utc::now())?;
    Ok(ApiResponse::created("user registered successfully", user))
}

pub(crate) async fn login_handler(
    State(state): State<PlacementState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<ApiResponse<LoginOutcome>, PlacementError> {
    let Json(request) = payload?;
    let outcome = state.identity.login(request, Utc::now())?;
    Ok(ApiResponse::ok("login successful", outcome))
}

pub(crate) async fn me_handler(
    State(state): State<PlacementState>,
    AuthUser(principal): AuthUser,
) -> Result<ApiResponse<Profile>, PlacementError> {
    let profile = state.identity.profile(&principal)?;
    Ok(ApiResponse::ok("profile retrieved successfully", profile))
}
