use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::Utc;

use crate::workflows::error::PlacementError;
use crate::workflows::identity::Principal;

use super::state::PlacementState;

/// Extractor resolving `Authorization: Bearer <token>` into a [`Principal`].
#[derive(Debug, Clone)]
pub struct AuthUser(pub Principal);

fn bearer_token(parts: &Parts) -> Result<&str, PlacementError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or_else(|| PlacementError::unauthenticated("access denied: no token provided"))?;
    let value = header
        .to_str()
        .map_err(|_| PlacementError::unauthenticated("invalid token"))?;
    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| PlacementError::unauthenticated("access denied: no token provided"))
}

#[async_trait]
impl FromRequestParts<PlacementState> for AuthUser {
    type Rejection = PlacementError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &PlacementState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let principal = state.identity.authenticate(token, Utc::now())?;
        Ok(AuthUser(principal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        let (parts, _) = builder.body(()).expect("request").into_parts();
        parts
    }

    #[test]
    fn bearer_prefix_is_required() {
        assert_eq!(
            bearer_token(&parts_with(Some("Bearer abc.def"))).expect("token"),
            "abc.def"
        );
        assert!(bearer_token(&parts_with(Some("Basic abc"))).is_err());
        assert!(bearer_token(&parts_with(Some("Bearer   "))).is_err());
        assert!(bearer_token(&parts_with(None)).is_err());
    }
}
