use serde::{Deserialize, Serialize};

use super::tokens::TokenPair;
use crate::media::StagedFile;
use crate::users::PublicUser;

/// Register form collected from the multipart body.
#[derive(Debug, Default)]
pub struct RegisterInput {
    pub username: Option<String>,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub password: Option<String>,
    pub avatar: Option<StagedFile>,
    pub cover_image: Option<StagedFile>,
}

impl RegisterInput {
    /// Drop any files still sitting in the staging directory.
    pub async fn discard_staged(&self) {
        for file in [&self.avatar, &self.cover_image].into_iter().flatten() {
            file.discard().await;
        }
    }
}

/// Request body for login. Either identifier may be used.
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Request body for token refresh when the cookie is not available.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

/// Response payload returned after login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: PublicUser,
    #[serde(flatten)]
    pub tokens: TokenPair,
}
