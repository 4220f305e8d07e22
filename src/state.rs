use crate::config::AppConfig;
use crate::db;
use crate::storage::{Storage, StorageClient};
use crate::users::{PgUserRepo, UserRepo};
use std::sync::Arc;

/// Process-scoped context shared by every request.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepo>,
    pub config: Arc<AppConfig>,
    pub storage: Arc<dyn StorageClient>,
    #[cfg(test)]
    pub(crate) scratch: Option<Arc<tempfile::TempDir>>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let pool = db::connect(&config).await?;
        db::migrate(&pool).await?;
        let users = Arc::new(PgUserRepo::new(pool)) as Arc<dyn UserRepo>;

        let storage = Arc::new(Storage::new(&config.storage).await?) as Arc<dyn StorageClient>;

        tokio::fs::create_dir_all(&config.upload_dir).await?;

        Ok(Self::from_parts(users, config, storage))
    }

    pub fn from_parts(
        users: Arc<dyn UserRepo>,
        config: Arc<AppConfig>,
        storage: Arc<dyn StorageClient>,
    ) -> Self {
        Self {
            users,
            config,
            storage,
            #[cfg(test)]
            scratch: None,
        }
    }

    pub async fn shutdown(&self) {
        self.users.close().await;
        tracing::info!("state shut down");
    }
}
