use std::collections::BTreeMap;

use serde::Serialize;
use sqlx::{FromRow, SqlitePool};
use time::OffsetDateTime;

use crate::db::now_utc;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SiteSetting {
    pub key: String,
    pub value: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: String,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

pub async fn all(db: &SqlitePool) -> Result<Vec<SiteSetting>, sqlx::Error> {
    sqlx::query_as::<_, SiteSetting>(
        "SELECT key, value, type, updated_at FROM site_settings ORDER BY key ASC",
    )
    .fetch_all(db)
    .await
}

pub async fn as_map(db: &SqlitePool) -> Result<BTreeMap<String, String>, sqlx::Error> {
    let rows: Vec<(String, String)> = sqlx::query_as("SELECT key, value FROM site_settings")
        .fetch_all(db)
        .await?;
    Ok(rows.into_iter().collect())
}

/// Writes every pair in one transaction. New keys get type `text`; existing
/// keys keep their type.
pub async fn upsert_all(db: &SqlitePool, pairs: &[(String, String)]) -> Result<(), sqlx::Error> {
    let now = now_utc();
    let mut tx = db.begin().await?;
    for (key, value) in pairs {
        sqlx::query(
            r#"
            INSERT INTO site_settings (key, value, type, updated_at)
            VALUES (?1, ?2, 'text', ?3)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(now)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await
}
