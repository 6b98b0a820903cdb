use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Serialize;
use sqlx::{Connection, SqliteConnection, SqlitePool};
use time::{macros::format_description, OffsetDateTime};
use tracing::{info, warn};

use crate::{
    auth::services::ensure_admin,
    config::AppConfig,
    db::{self, TABLES},
    error::AppError,
};

pub const UNSUPPORTED_MESSAGE: &str = "Backup database tidak tersedia untuk database ini";
pub const NOT_FOUND_MESSAGE: &str = "File backup tidak ditemukan";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupFile {
    pub name: String,
    pub size: u64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Fails with `Unsupported` unless the database is a file on local disk.
pub fn ensure_supported(config: &AppConfig) -> Result<PathBuf, AppError> {
    db::sqlite_file_path(&config.database_url)
        .ok_or_else(|| AppError::Unsupported(UNSUPPORTED_MESSAGE.into()))
}

/// Plain `*.db` file names only; anything that could leave the backup
/// directory is rejected.
pub fn validate_file_name(name: &str) -> Result<&str, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::validation("Nama file harus diisi"));
    }
    if name.contains(['/', '\\']) || name.starts_with('.') || !name.ends_with(".db") {
        return Err(AppError::validation("Nama file tidak valid"));
    }
    Ok(name)
}

pub fn backup_name(at: OffsetDateTime) -> anyhow::Result<String> {
    let stamp = at.format(format_description!(
        "[year]-[month]-[day]T[hour]-[minute]-[second]"
    ))?;
    Ok(format!("backup-{}.db", stamp))
}

pub async fn list(dir: &Path) -> anyhow::Result<Vec<BackupFile>> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("create backup directory {}", dir.display()))?;

    let mut files = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.ends_with(".db") {
            continue;
        }
        let meta = entry.metadata().await?;
        if !meta.is_file() {
            continue;
        }
        files.push(BackupFile {
            name,
            size: meta.len(),
            created_at: OffsetDateTime::from(meta.modified()?),
        });
    }

    files.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.name.cmp(&a.name))
    });
    Ok(files)
}

/// Writes a consistent copy of the live database into `dir`.
pub async fn create(db: &SqlitePool, dir: &Path) -> Result<String, AppError> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("create backup directory {}", dir.display()))?;

    let name = backup_name(OffsetDateTime::now_utc())?;
    let path = dir.join(&name);
    if tokio::fs::try_exists(&path).await.unwrap_or(false) {
        return Err(AppError::Conflict(format!("Backup {} sudah ada", name)));
    }

    sqlx::query("VACUUM INTO ?1")
        .bind(path.to_string_lossy().into_owned())
        .execute(db)
        .await?;

    info!(%name, "backup created");
    Ok(name)
}

async fn existing_backup(dir: &Path, name: &str) -> Result<PathBuf, AppError> {
    let path = dir.join(validate_file_name(name)?);
    if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
        return Err(AppError::not_found(NOT_FOUND_MESSAGE));
    }
    Ok(path)
}

pub async fn delete(dir: &Path, name: &str) -> Result<(), AppError> {
    let path = existing_backup(dir, name).await?;
    tokio::fs::remove_file(&path)
        .await
        .with_context(|| format!("remove backup {}", path.display()))?;
    info!(%name, "backup deleted");
    Ok(())
}

/// Replaces every application table with the contents of a backup file.
pub async fn restore(db: &SqlitePool, dir: &Path, name: &str) -> Result<(), AppError> {
    let path = existing_backup(dir, name).await?;

    let mut conn = db.acquire().await?;
    sqlx::query("ATTACH DATABASE ?1 AS backup")
        .bind(path.to_string_lossy().into_owned())
        .execute(&mut *conn)
        .await?;

    let copied = copy_from_attached(&mut conn).await;

    if let Err(e) = sqlx::query("DETACH DATABASE backup").execute(&mut *conn).await {
        warn!(error = %e, "detach after restore failed");
    }
    copied?;

    info!(%name, "database restored");
    Ok(())
}

async fn copy_from_attached(conn: &mut SqliteConnection) -> Result<(), AppError> {
    for table in TABLES {
        let present: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM backup.sqlite_master WHERE type = 'table' AND name = ?1",
        )
        .bind(*table)
        .fetch_one(&mut *conn)
        .await?;
        if present == 0 {
            return Err(AppError::validation("File backup tidak valid"));
        }
    }

    let mut tx = conn.begin().await?;
    for table in TABLES.iter().rev() {
        sqlx::query(&format!("DELETE FROM main.{}", table))
            .execute(&mut *tx)
            .await?;
    }
    for table in TABLES {
        sqlx::query(&format!(
            "INSERT INTO main.{0} SELECT * FROM backup.{0}",
            table
        ))
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;
    Ok(())
}

/// Deletes every row, then recreates the bootstrap admin when a password is
/// configured. Returns whether the admin was recreated.
pub async fn reset(db: &SqlitePool, config: &AppConfig) -> Result<bool, AppError> {
    let mut tx = db.begin().await?;
    for table in TABLES.iter().rev() {
        sqlx::query(&format!("DELETE FROM {}", table))
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;
    warn!("database reset");

    match &config.admin.password {
        Some(password) => Ok(ensure_admin(db, &config.admin.username, password).await?),
        None => Ok(false),
    }
}
