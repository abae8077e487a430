//! HTTP surface: envelope, bearer extraction and the merged placement router.

mod auth;
mod envelope;
mod state;

use axum::Router;

use crate::workflows::applications::application_routes;
use crate::workflows::assessments::assessment_routes;
use crate::workflows::identity::identity_routes;
use crate::workflows::jobs::job_routes;
use crate::workflows::notifications::notification_routes;
use crate::workflows::ranking::ranking_routes;

pub use auth::AuthUser;
pub use envelope::ApiResponse;
pub use state::PlacementState;

/// Every placement endpoint, ready to merge into a service router.
pub fn placement_router(state: PlacementState) -> Router {
    Router::new()
        .merge(identity_routes())
        .merge(job_routes())
        .merge(application_routes())
        .merge(notification_routes())
        .merge(ranking_routes())
        .merge(assessment_routes())
        .with_state(state)
}
