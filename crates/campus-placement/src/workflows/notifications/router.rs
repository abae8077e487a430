use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::routing::{delete, get, put};
use axum::Router;
use chrono::Utc;
use serde::Serialize;

use crate::http::{ApiResponse, AuthUser, PlacementState};
use crate::workflows::error::PlacementError;
use crate::workflows::ids::NotificationId;

use super::domain::Notification;
use super::service::{DailyUpdates, DailyUpdatesQuery};

#[derive(Debug, Serialize)]
pub(crate) struct MarkedRead {
    updated: usize,
}

pub fn notification_routes() -> Router<PlacementState> {
    Router::new()
        .route("/timeline/daily-updates", get(daily_updates_handler))
        .route("/timeline/notifications/read-all", put(mark_all_read_handler))
        .route(
            "/timeline/notifications/:notification_id/read",
            put(mark_read_handler),
        )
        .route(
            "/timeline/notifications/:notification_id",
            delete(delete_handler),
        )
}

pub(crate) async fn daily_updates_handler(
    State(state): State<PlacementState>,
    AuthUser(principal): AuthUser,
    query: Result<Query<DailyUpdatesQuery>, QueryRejection>,
) -> Result<ApiResponse<DailyUpdates>, PlacementError> {
    let student = principal.student()?;
    let Query(query) = query?;
    let updates = state
        .notifications
        .daily_updates(student, query, Utc::now())?;
    Ok(ApiResponse::ok("daily updates retrieved successfully", updates))
}

pub(crate) async fn mark_read_handler(
    State(state): State<PlacementState>,
    AuthUser(principal): AuthUser,
    Path(notification_id): Path<String>,
) -> Result<ApiResponse<Notification>, PlacementError> {
    let notification = state.notifications.mark_read(
        principal.student()?,
        &NotificationId::from(notification_id.as_str()),
        Utc::now(),
    )?;
    Ok(ApiResponse::ok("notification marked as read", notification))
}

pub(crate) async fn mark_all_read_handler(
    State(state): State<PlacementState>,
    AuthUser(principal): AuthUser,
) -> Result<ApiResponse<MarkedRead>, PlacementError> {
    let updated = state
        .notifications
        .mark_all_read(principal.student()?, Utc::now())?;
    Ok(ApiResponse::ok(
        "all notifications marked as read",
        MarkedRead { updated },
    ))
}

pub(crate) async fn delete_handler(
    State(state): State<PlacementState>,
    AuthUser(principal): AuthUser,
    Path(notification_id): Path<String>,
) -> Result<ApiResponse<()>, PlacementError> {
    state.notifications.delete(
        principal.student()?,
        &NotificationId::from(notification_id.as_str()),
        Utc::now(),
    )?;
    Ok(ApiResponse::message("notification deleted successfully"))
}
