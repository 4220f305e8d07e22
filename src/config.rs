use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

/// S3-compatible media host (MinIO in development).
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub endpoint: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
    pub public_base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub jwt: JwtConfig,
    pub storage: StorageConfig,
    pub upload_dir: String,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

/// Longest lifetime accepted for either token kind (one year).
const MAX_TTL_MINUTES: i64 = 60 * 24 * 365;

fn ttl_minutes(key: &str, default: i64) -> anyhow::Result<i64> {
    let minutes = env_parsed(key, default);
    if !(1..=MAX_TTL_MINUTES).contains(&minutes) {
        anyhow::bail!(
            "{} must be between 1 and {} minutes, got {}",
            key,
            MAX_TTL_MINUTES,
            minutes
        );
    }
    Ok(minutes)
}

fn env_required(key: &str) -> anyhow::Result<String> {
    std::env::var(key).with_context(|| format!("missing env var {}", key))
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env_required("DATABASE_URL")?;
        let jwt = JwtConfig {
            access_secret: env_required("ACCESS_TOKEN_SECRET")?,
            refresh_secret: env_required("REFRESH_TOKEN_SECRET")?,
            issuer: env_or("JWT_ISSUER", "userauth"),
            audience: env_or("JWT_AUDIENCE", "userauth-users"),
            ttl_minutes: ttl_minutes("ACCESS_TOKEN_TTL_MINUTES", 15)?,
            refresh_ttl_minutes: ttl_minutes("REFRESH_TOKEN_TTL_MINUTES", 60 * 24 * 14)?,
        };

        let endpoint = env_required("MINIO_ENDPOINT")?;
        let bucket = env_required("MINIO_BUCKET")?;
        let public_base_url = std::env::var("MEDIA_PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("{}/{}", endpoint.trim_end_matches('/'), bucket));
        let storage = StorageConfig {
            access_key: env_required("MINIO_ACCESS_KEY")?,
            secret_key: env_required("MINIO_SECRET_KEY")?,
            region: env_or("MINIO_REGION", "us-east-1"),
            endpoint,
            bucket,
            public_base_url,
        };

        Ok(Self {
            database_url,
            max_connections: env_parsed("DATABASE_MAX_CONNECTIONS", 10),
            jwt,
            storage,
            upload_dir: env_or("UPLOAD_DIR", "./public/temp"),
        })
    }
}
