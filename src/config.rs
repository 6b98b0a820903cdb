use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub ttl_hours: i64,
    pub cookie_secure: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_hours: 24,
            cookie_secure: false,
        }
    }
}

/// Credentials used to create the admin account when it does not exist yet.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminBootstrap {
    pub username: String,
    pub password: Option<String>,
}

/// S3-compatible blob store used for uploads when configured.
#[derive(Debug, Clone, Deserialize)]
pub struct BlobConfig {
    pub endpoint: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
    pub public_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub session: SessionConfig,
    pub admin: AdminBootstrap,
    pub uploads_dir: PathBuf,
    pub backups_dir: PathBuf,
    pub blob: Option<BlobConfig>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://data/lbh.db".into());
        let session = SessionConfig {
            ttl_hours: std::env::var("SESSION_TTL_HOURS")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .filter(|h| *h > 0)
                .unwrap_or(24),
            cookie_secure: std::env::var("COOKIE_SECURE")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        };
        let admin = AdminBootstrap {
            username: std::env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".into()),
            password: std::env::var("ADMIN_PASSWORD").ok().filter(|p| !p.is_empty()),
        };
        Ok(Self {
            database_url,
            session,
            admin,
            uploads_dir: std::env::var("UPLOADS_DIR")
                .unwrap_or_else(|_| "public/uploads".into())
                .into(),
            backups_dir: std::env::var("BACKUPS_DIR")
                .unwrap_or_else(|_| "backups".into())
                .into(),
            blob: blob_from_env(),
        })
    }
}

fn blob_from_env() -> Option<BlobConfig> {
    let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
    Some(BlobConfig {
        endpoint: var("BLOB_ENDPOINT")?,
        bucket: var("BLOB_BUCKET")?,
        access_key: var("BLOB_ACCESS_KEY")?,
        secret_key: var("BLOB_SECRET_KEY")?,
        region: var("BLOB_REGION").unwrap_or_else(|| "us-east-1".into()),
        public_url: var("BLOB_PUBLIC_URL"),
    })
}
