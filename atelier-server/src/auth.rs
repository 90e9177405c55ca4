use atelier_core::Data;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::error::ServerError;

/// Resolves the request's bearer token to an authenticated user id through
/// the session seam. Handlers taking this argument reject unauthenticated
/// requests with 401 before doing any other work.
pub struct CurrentUser(pub i64);

#[axum::async_trait]
impl FromRequestParts<Data> for CurrentUser {
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &Data) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "));

        match token.and_then(|token| state.sessions.resolve(token)) {
            Some(user_id) => Ok(Self(user_id)),
            None => Err(ServerError::Unauthorized),
        }
    }
}
