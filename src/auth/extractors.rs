use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::warn;

use super::cookies::{read_cookie, ACCESS_COOKIE};
use super::jwt::JwtKeys;
use super::tokens::verify_access;
use crate::error::ApiError;
use crate::state::AppState;
use crate::users::PublicUser;

/// Authenticated caller, resolved from the `accessToken` cookie or a bearer header.
pub struct AuthUser(pub PublicUser);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = read_cookie(&parts.headers, ACCESS_COOKIE).or_else(|| {
            parts
                .headers
                .get(AUTHORIZATION)
                .and_then(|h| h.to_str().ok())
                .and_then(|h| h.strip_prefix("Bearer ").or_else(|| h.strip_prefix("bearer ")))
                .map(|t| t.trim().to_string())
        });

        let keys = JwtKeys::from_ref(state);
        let claims = verify_access(&keys, token.as_deref())?;

        let user = state
            .users
            .find_public_by_id(claims.sub)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "load authenticated user failed");
                ApiError::internal("internal server error")
            })?
            .ok_or_else(|| {
                warn!(user_id = %claims.sub, "access token for unknown user");
                ApiError::unauthorized("invalid access token")
            })?;

        Ok(AuthUser(user))
    }
}
