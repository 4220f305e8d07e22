use axum::extract::FromRef;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::dto::{LoginRequest, LoginResponse, RegisterInput};
use super::jwt::JwtKeys;
use super::tokens::{issue_pair, verify_refresh, TokenPair};
use crate::error::{ApiError, ApiResult};
use crate::media::upload_staged;
use crate::state::AppState;
use crate::users::{NewUser, PublicUser, RepoError};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Trimmed value of a text field, `None` when absent or blank.
fn non_blank(field: Option<&str>) -> Option<&str> {
    field.map(str::trim).filter(|v| !v.is_empty())
}

fn normalize_identity(field: Option<&str>) -> Option<String> {
    non_blank(field).map(str::to_lowercase)
}

fn store_error(e: anyhow::Error) -> ApiError {
    error!(error = %e, "user store failure");
    ApiError::internal("internal server error")
}

/// Create an account. Staged files are cleaned up whatever the outcome.
pub async fn register(st: &AppState, input: RegisterInput) -> ApiResult<PublicUser> {
    let res = register_inner(st, &input).await;
    input.discard_staged().await;
    res
}

async fn register_inner(st: &AppState, input: &RegisterInput) -> ApiResult<PublicUser> {
    let (Some(username), Some(email), Some(full_name), Some(password)) = (
        normalize_identity(input.username.as_deref()),
        normalize_identity(input.email.as_deref()),
        non_blank(input.full_name.as_deref()),
        // the password itself is used untrimmed
        input.password.as_deref().filter(|p| !p.trim().is_empty()),
    ) else {
        warn!("register with missing fields");
        return Err(ApiError::validation("all fields are required"));
    };

    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(ApiError::validation("invalid email"));
    }

    let existing = st
        .users
        .find_by_identity(Some(username.as_str()), Some(email.as_str()))
        .await
        .map_err(store_error)?;
    if existing.is_some() {
        warn!(username = %username, email = %email, "username or email already registered");
        return Err(ApiError::conflict("user with email/username already exists"));
    }

    let Some(avatar_file) = input.avatar.as_ref() else {
        return Err(ApiError::validation("avatar file is required"));
    };

    let avatar = upload_staged(st, Some(avatar_file), "avatars").await;
    let cover_image = upload_staged(st, input.cover_image.as_ref(), "covers").await;
    let Some(avatar) = avatar else {
        return Err(ApiError::validation("avatar file is required"));
    };

    let new_user = NewUser::new(
        username,
        email,
        full_name.to_string(),
        password,
        avatar.url,
        cover_image.map(|c| c.url).unwrap_or_default(),
    )
    .map_err(|e| {
        error!(error = %e, "password hashing failed");
        ApiError::internal("error creating user")
    })?;

    let created = st
        .users
        .create(new_user)
        .await
        .map_err(|e| match e {
            RepoError::Duplicate => {
                warn!("unique constraint rejected new user");
                ApiError::conflict("user with email/username already exists")
            }
            RepoError::Other(e) => {
                error!(error = %e, "create user failed");
                ApiError::internal("error creating user")
            }
        })?;

    let user = st
        .users
        .find_public_by_id(created.id)
        .await
        .map_err(store_error)?
        .ok_or_else(|| {
            error!(user_id = %created.id, "created user missing on re-fetch");
            ApiError::internal("error creating user")
        })?;

    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok(user)
}

pub async fn login(st: &AppState, req: LoginRequest) -> ApiResult<LoginResponse> {
    let username = normalize_identity(req.username.as_deref());
    let email = normalize_identity(req.email.as_deref());
    if username.is_none() && email.is_none() {
        return Err(ApiError::validation("username or email is required"));
    }
    let Some(password) = req.password.as_deref().filter(|p| !p.is_empty()) else {
        return Err(ApiError::validation("password is required"));
    };

    let user = st
        .users
        .find_by_identity(username.as_deref(), email.as_deref())
        .await
        .map_err(store_error)?
        .ok_or_else(|| {
            warn!(username = ?username, email = ?email, "login for unknown user");
            ApiError::not_found("user not found")
        })?;

    let ok = user.is_password_correct(password).map_err(|e| {
        error!(error = %e, user_id = %user.id, "password check failed");
        ApiError::internal("internal server error")
    })?;
    if !ok {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ApiError::unauthorized("invalid credentials"));
    }

    let tokens = issue_pair(st, user.id).await?;

    let user = st
        .users
        .find_public_by_id(user.id)
        .await
        .map_err(store_error)?
        .ok_or_else(|| ApiError::internal("error fetching user"))?;

    info!(user_id = %user.id, "user logged in");
    Ok(LoginResponse { user, tokens })
}

pub async fn logout(st: &AppState, user_id: Uuid) -> ApiResult<()> {
    st.users
        .set_refresh_token(user_id, None)
        .await
        .map_err(store_error)?;
    info!(%user_id, "user logged out");
    Ok(())
}

/// Exchange a refresh token for a new pair. Every failure is `Unauthorized`.
pub async fn refresh(st: &AppState, presented: Option<&str>) -> ApiResult<TokenPair> {
    refresh_inner(st, presented)
        .await
        .map_err(ApiError::into_unauthorized)
}

async fn refresh_inner(st: &AppState, presented: Option<&str>) -> ApiResult<TokenPair> {
    let keys = JwtKeys::from_ref(st);
    let claims = verify_refresh(&keys, presented)?;

    let user = st
        .users
        .find_by_id(claims.sub)
        .await
        .map_err(store_error)?
        .ok_or_else(|| ApiError::unauthorized("invalid refresh token"))?;

    if user.refresh_token.as_deref() != presented {
        warn!(user_id = %user.id, "stale refresh token presented");
        return Err(ApiError::unauthorized("refresh token is expired or used"));
    }

    let pair = issue_pair(st, user.id).await?;
    info!(user_id = %user.id, "access token refreshed");
    Ok(pair)
}
