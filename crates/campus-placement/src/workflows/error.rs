use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Failure taxonomy shared by every placement workflow.
#[derive(Debug, thiserror::Error)]
pub enum PlacementError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Authentication(String),
    #[error("{0}")]
    Authorization(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    StateConflict(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("internal error: {0}")]
    Internal(String),
}

impl PlacementError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::StateConflict(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Authorization(message.into())
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::Authentication(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            PlacementError::Validation(_) => StatusCode::BAD_REQUEST,
            PlacementError::Authentication(_) => StatusCode::UNAUTHORIZED,
            PlacementError::Authorization(_) => StatusCode::FORBIDDEN,
            PlacementError::NotFound(_) => StatusCode::NOT_FOUND,
            PlacementError::StateConflict(_) => StatusCode::CONFLICT,
            PlacementError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
            PlacementError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
            PlacementError::Repository(RepositoryError::Unavailable(_))
            | PlacementError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for PlacementError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            // storage details stay in the logs
            PlacementError::Repository(RepositoryError::Unavailable(detail)) => {
                tracing::error!(%detail, "repository unavailable");
                "unexpected server error".to_string()
            }
            PlacementError::Internal(detail) => {
                tracing::error!(%detail, "internal failure");
                "unexpected server error".to_string()
            }
            other => other.to_string(),
        };

        let payload = json!({
            "success": false,
            "error": message,
        });
        (status, Json(payload)).into_response()
    }
}

impl From<JsonRejection> for PlacementError {
    fn from(value: JsonRejection) -> Self {
        Self::Validation(format!("malformed request body: {}", value.body_text()))
    }
}

impl From<PathRejection> for PlacementError {
    fn from(value: PathRejection) -> Self {
        Self::Validation(format!("malformed path parameter: {}", value.body_text()))
    }
}

impl From<QueryRejection> for PlacementError {
    fn from(value: QueryRejection) -> Self {
        Self::Validation(format!("malformed query string: {}", value.body_text()))
    }
}
