use axum::extract::FromRef;
use serde::Serialize;
use tracing::{error, info};
use uuid::Uuid;

use super::claims::{Claims, ProfileClaims};
use super::jwt::JwtKeys;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Mint a fresh access/refresh pair for `user_id` and store the refresh token
/// on the user, replacing whatever was there.
pub async fn issue_pair(st: &AppState, user_id: Uuid) -> ApiResult<TokenPair> {
    match try_issue_pair(st, user_id).await {
        Ok(pair) => {
            info!(%user_id, "token pair issued");
            Ok(pair)
        }
        Err(e) => {
            error!(error = %e, %user_id, "token issuance failed");
            Err(ApiError::internal("error while generating tokens"))
        }
    }
}

async fn try_issue_pair(st: &AppState, user_id: Uuid) -> anyhow::Result<TokenPair> {
    let user = st
        .users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("user {} not found", user_id))?;

    let keys = JwtKeys::from_ref(st);
    let refresh_token = keys.sign_refresh(user.id)?;
    let access_token = keys.sign_access(
        user.id,
        ProfileClaims {
            username: user.username,
            email: user.email,
            full_name: user.full_name,
        },
    )?;

    st.users
        .set_refresh_token(user.id, Some(refresh_token.as_str()))
        .await?;

    Ok(TokenPair {
        access_token,
        refresh_token,
    })
}

/// Decode a presented refresh token; anything wrong with it is `Unauthorized`.
pub fn verify_refresh(keys: &JwtKeys, token: Option<&str>) -> ApiResult<Claims> {
    let token = token
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::unauthorized("unauthorized request"))?;
    keys.verify_refresh(token).map_err(|e| {
        tracing::warn!(error = %e, "refresh token rejected");
        ApiError::unauthorized("invalid refresh token")
    })
}

/// Decode a presented access token; anything wrong with it is `Unauthorized`.
pub fn verify_access(keys: &JwtKeys, token: Option<&str>) -> ApiResult<Claims> {
    let token = token
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::unauthorized("unauthorized request"))?;
    keys.verify_access(token).map_err(|e| {
        tracing::warn!(error = %e, "access token rejected");
        ApiError::unauthorized("invalid access token")
    })
}
