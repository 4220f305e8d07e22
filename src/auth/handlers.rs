use std::path::Path;

use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::JsonRejection,
        DefaultBodyLimit, Multipart, State,
    },
    http::HeaderMap,
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{error, instrument};

use super::{
    cookies::{cleared_cookies, read_cookie, token_cookies, REFRESH_COOKIE},
    dto::{LoginRequest, LoginResponse, RefreshRequest, RegisterInput},
    extractors::AuthUser,
    services,
    tokens::TokenPair,
};
use crate::{
    error::{ApiError, ApiResult},
    media::stage_bytes,
    response::ApiResponse,
    state::AppState,
    users::PublicUser,
};

const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024; // 20MB

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/refresh-token", post(refresh))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

/// POST /register (multipart)
/// Text fields: username, email, fullName, password. Files: avatar, coverImage.
#[instrument(skip(state, mp))]
pub async fn register(
    State(state): State<AppState>,
    mp: Result<Multipart, MultipartRejection>,
) -> ApiResult<ApiResponse<PublicUser>> {
    let mut mp = mp.map_err(|e| ApiError::validation(e.body_text()))?;

    let mut input = RegisterInput::default();
    let dir = Path::new(&state.config.upload_dir);
    if let Err(e) = read_register_form(dir, &mut mp, &mut input).await {
        input.discard_staged().await;
        return Err(e);
    }

    let user = services::register(&state, input).await?;
    Ok(ApiResponse::created(user, "user created successfully"))
}

async fn read_register_form(
    dir: &Path,
    mp: &mut Multipart,
    input: &mut RegisterInput,
) -> ApiResult<()> {
    let bad_body = |e: axum::extract::multipart::MultipartError| {
        ApiError::validation(format!("invalid multipart body: {}", e))
    };

    while let Some(field) = mp.next_field().await.map_err(bad_body)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "avatar" | "coverImage" => {
                let slot = if name == "avatar" {
                    &mut input.avatar
                } else {
                    &mut input.cover_image
                };
                if slot.is_some() {
                    return Err(ApiError::validation(format!("unexpected field: {}", name)));
                }
                let file_name = field.file_name().map(str::to_string);
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let body = field.bytes().await.map_err(bad_body)?;
                // browsers send an empty part when no file was chosen
                if body.is_empty() {
                    continue;
                }
                let staged = stage_bytes(dir, file_name.as_deref(), &content_type, body)
                    .await
                    .map_err(|e| {
                        error!(error = %e, field = %name, "staging upload failed");
                        ApiError::internal("failed to stage upload")
                    })?;
                *slot = Some(staged);
            }
            "username" | "email" | "fullName" | "password" => {
                let value = field.text().await.map_err(bad_body)?;
                let slot = match name.as_str() {
                    "username" => &mut input.username,
                    "email" => &mut input.email,
                    "fullName" => &mut input.full_name,
                    _ => &mut input.password,
                };
                *slot = Some(value);
            }
            _ if field.file_name().is_some() => {
                return Err(ApiError::validation(format!("unexpected field: {}", name)));
            }
            _ => {}
        }
    }
    Ok(())
}

/// POST /login { username?, email?, password }
#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<ApiResponse<LoginResponse>> {
    let Json(payload) = payload.map_err(|e| ApiError::validation(e.body_text()))?;

    let res = services::login(&state, payload).await?;
    let cookies = token_cookies(&res.tokens)?;
    Ok(ApiResponse::ok(res, "user logged in successfully").with_headers(cookies))
}

/// POST /logout (authenticated)
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn logout(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<ApiResponse<Value>> {
    services::logout(&state, user.id).await?;
    Ok(ApiResponse::ok(json!({}), "user logged out").with_headers(cleared_cookies()))
}

/// POST /refresh-token; token from the `refreshToken` cookie or `{ refreshToken }` body.
#[instrument(skip(state, headers, body))]
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Option<Json<RefreshRequest>>,
) -> ApiResult<ApiResponse<TokenPair>> {
    let presented = read_cookie(&headers, REFRESH_COOKIE)
        .or_else(|| body.and_then(|Json(b)| b.refresh_token));

    let pair = services::refresh(&state, presented.as_deref()).await?;
    let cookies = token_cookies(&pair).map_err(ApiError::into_unauthorized)?;
    Ok(ApiResponse::ok(pair, "access token refreshed").with_headers(cookies))
}
