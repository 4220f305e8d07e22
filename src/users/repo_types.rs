use anyhow::anyhow;
use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password_hash: String, // argon2 PHC string
    pub avatar: String,
    pub cover_image: String,
    pub refresh_token: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// User without credential fields, safe to return to clients.
#[derive(Debug, Clone, Serialize, FromRow, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar: String,
    pub cover_image: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl User {
    /// Check a login attempt against the stored salted hash.
    /// `Ok(false)` is a mismatch; an unreadable stored hash is an error.
    pub fn is_password_correct(&self, plain: &str) -> anyhow::Result<bool> {
        let stored = PasswordHash::new(&self.password_hash)
            .map_err(|e| anyhow!("stored hash for user {} is malformed: {}", self.id, e))?;
        match Argon2::default().verify_password(plain.as_bytes(), &stored) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(anyhow!("argon2 verify: {}", e)),
        }
    }
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            full_name: u.full_name,
            avatar: u.avatar,
            cover_image: u.cover_image,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

/// Insert payload; username and email are expected to be normalized already.
/// The plaintext password never reaches the store, only its argon2 PHC string.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub full_name: String,
    password_hash: String,
    pub avatar: String,
    pub cover_image: String,
}

impl NewUser {
    pub fn new(
        username: String,
        email: String,
        full_name: String,
        password: &str,
        avatar: String,
        cover_image: String,
    ) -> anyhow::Result<Self> {
        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow!("argon2 hash: {}", e))?
            .to_string();
        Ok(Self {
            username,
            email,
            full_name,
            password_hash,
            avatar,
            cover_image,
        })
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }
}
