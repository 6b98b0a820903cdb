use serde::Serialize;
use sqlx::{FromRow, SqlitePool};
use time::OffsetDateTime;

#[derive(Debug, Clone)]
pub struct NewEvent {
    pub path: String,
    pub referrer: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PageCount {
    pub path: String,
    pub page_views: i64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ReferrerCount {
    pub referrer: String,
    pub page_views: i64,
}

pub async fn insert(db: &SqlitePool, event: &NewEvent, at: OffsetDateTime) -> Result<i64, sqlx::Error> {
    let res = sqlx::query(
        r#"
        INSERT INTO analytics_events (path, referrer, user_agent, created_at)
        VALUES (?1, ?2, ?3, ?4)
        "#,
    )
    .bind(&event.path)
    .bind(&event.referrer)
    .bind(&event.user_agent)
    .bind(at)
    .execute(db)
    .await?;
    Ok(res.last_insert_rowid())
}

pub async fn count_between(
    db: &SqlitePool,
    from: OffsetDateTime,
    to: OffsetDateTime,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM analytics_events WHERE created_at >= ?1 AND created_at <= ?2",
    )
    .bind(from)
    .bind(to)
    .fetch_one(db)
    .await
}

/// Most viewed paths first. `None` returns every path.
pub async fn top_pages(
    db: &SqlitePool,
    from: OffsetDateTime,
    to: OffsetDateTime,
    limit: Option<i64>,
) -> Result<Vec<PageCount>, sqlx::Error> {
    sqlx::query_as::<_, PageCount>(
        r#"
        SELECT path, COUNT(*) AS page_views
        FROM analytics_events
        WHERE created_at >= ?1 AND created_at <= ?2
        GROUP BY path
        ORDER BY page_views DESC, path ASC
        LIMIT ?3
        "#,
    )
    .bind(from)
    .bind(to)
    .bind(limit.unwrap_or(-1))
    .fetch_all(db)
    .await
}

pub async fn top_referrers(
    db: &SqlitePool,
    from: OffsetDateTime,
    to: OffsetDateTime,
    limit: Option<i64>,
) -> Result<Vec<ReferrerCount>, sqlx::Error> {
    sqlx::query_as::<_, ReferrerCount>(
        r#"
        SELECT referrer, COUNT(*) AS page_views
        FROM analytics_events
        WHERE created_at >= ?1 AND created_at <= ?2
          AND referrer IS NOT NULL AND referrer <> ''
        GROUP BY referrer
        ORDER BY page_views DESC, referrer ASC
        LIMIT ?3
        "#,
    )
    .bind(from)
    .bind(to)
    .bind(limit.unwrap_or(-1))
    .fetch_all(db)
    .await
}
