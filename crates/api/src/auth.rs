//! Authenticated-user extraction.
//!
//! Real authentication lives in middleware outside this system; by the
//! time a request reaches these handlers, the user's identity arrives in
//! the `x-user-id` header. A missing or malformed header is rejected as
//! unauthorized.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use common::UserId;
use uuid::Uuid;

use crate::error::ApiError;

/// The authenticated user making the request.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub UserId);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get("x-user-id")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Uuid::parse_str(value).ok())
            .ok_or(ApiError::Unauthorized)?;

        Ok(AuthUser(UserId::from_uuid(user_id)))
    }
}
