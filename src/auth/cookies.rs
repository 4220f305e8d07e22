use axum::http::{
    header::{COOKIE, SET_COOKIE},
    HeaderMap, HeaderValue,
};

use super::tokens::TokenPair;
use crate::error::{ApiError, ApiResult};

pub const ACCESS_COOKIE: &str = "accessToken";
pub const REFRESH_COOKIE: &str = "refreshToken";

const OPTIONS: &str = "Path=/; HttpOnly; Secure";
const EXPIRED: &str = "Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT";

fn header(raw: String) -> ApiResult<HeaderValue> {
    HeaderValue::from_str(&raw).map_err(|e| {
        tracing::error!(error = %e, "invalid cookie header value");
        ApiError::internal("failed to set cookies")
    })
}

/// `Set-Cookie` headers delivering both tokens as HTTP-only, secure cookies.
pub fn token_cookies(pair: &TokenPair) -> ApiResult<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.append(
        SET_COOKIE,
        header(format!("{}={}; {}", ACCESS_COOKIE, pair.access_token, OPTIONS))?,
    );
    headers.append(
        SET_COOKIE,
        header(format!("{}={}; {}", REFRESH_COOKIE, pair.refresh_token, OPTIONS))?,
    );
    Ok(headers)
}

/// `Set-Cookie` headers that make the client drop both token cookies.
pub fn cleared_cookies() -> HeaderMap {
    let mut headers = HeaderMap::new();
    for name in [ACCESS_COOKIE, REFRESH_COOKIE] {
        headers.append(
            SET_COOKIE,
            HeaderValue::from_str(&format!("{}=; {}; {}", name, OPTIONS, EXPIRED))
                .unwrap_or_else(|_| HeaderValue::from_static("")),
        );
    }
    headers
}

/// Value of the named cookie from the request's `Cookie` headers, if non-empty.
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v.trim().trim_matches('"').to_string())
        .filter(|v| !v.is_empty())
}
