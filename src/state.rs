use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::AppConfig;
use crate::db;
use crate::storage::{BlobStorage, LocalStorage, StorageClient};

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<AppConfig>,
    pub local_storage: Arc<dyn StorageClient>,
    pub blob_storage: Option<Arc<dyn StorageClient>>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let db = db::connect(&config.database_url).await?;

        let blob_storage = match &config.blob {
            Some(cfg) => {
                tracing::info!(endpoint = %cfg.endpoint, bucket = %cfg.bucket, "blob storage enabled");
                Some(Arc::new(BlobStorage::new(cfg).await?) as Arc<dyn StorageClient>)
            }
            None => None,
        };
        let local_storage =
            Arc::new(LocalStorage::new(&config.uploads_dir)) as Arc<dyn StorageClient>;

        Ok(Self {
            db,
            config,
            local_storage,
            blob_storage,
        })
    }

    pub fn from_parts(
        db: SqlitePool,
        config: Arc<AppConfig>,
        local_storage: Arc<dyn StorageClient>,
        blob_storage: Option<Arc<dyn StorageClient>>,
    ) -> Self {
        Self {
            db,
            config,
            local_storage,
            blob_storage,
        }
    }
}
