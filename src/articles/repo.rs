use sqlx::SqlitePool;
use uuid::Uuid;

use crate::articles::dto::{Article, ArticleFilter, NewArticle};
use crate::db::now_utc;

const COLUMNS: &str = "id, title, slug, excerpt, content, category, author, featured, published, image_url, read_time, created_at, updated_at";

pub async fn insert(db: &SqlitePool, new: &NewArticle) -> Result<Article, sqlx::Error> {
    sqlx::query_as::<_, Article>(&format!(
        r#"
        INSERT INTO articles
            (id, title, slug, excerpt, content, category, author, featured, published, image_url, read_time, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(&new.title)
    .bind(&new.slug)
    .bind(&new.excerpt)
    .bind(&new.content)
    .bind(&new.category)
    .bind(&new.author)
    .bind(new.featured)
    .bind(new.published)
    .bind(&new.image_url)
    .bind(&new.read_time)
    .bind(now_utc())
    .fetch_one(db)
    .await
}

/// Newest first.
pub async fn list(db: &SqlitePool, filter: &ArticleFilter) -> Result<Vec<Article>, sqlx::Error> {
    sqlx::query_as::<_, Article>(&format!(
        r#"
        SELECT {COLUMNS}
        FROM articles
        WHERE (?1 IS NULL OR category = ?1)
          AND (?2 = 0 OR featured = 1)
          AND (?3 = 0 OR published = 1)
        ORDER BY created_at DESC, rowid DESC
        LIMIT ?4
        "#
    ))
    .bind(&filter.category)
    .bind(filter.featured_only)
    .bind(filter.published_only)
    .bind(filter.limit)
    .fetch_all(db)
    .await
}

/// Every article, newest first.
pub async fn all(db: &SqlitePool) -> Result<Vec<Article>, sqlx::Error> {
    sqlx::query_as::<_, Article>(&format!(
        "SELECT {COLUMNS} FROM articles ORDER BY created_at DESC, rowid DESC"
    ))
    .fetch_all(db)
    .await
}

pub async fn find_by_id(db: &SqlitePool, id: Uuid) -> Result<Option<Article>, sqlx::Error> {
    sqlx::query_as::<_, Article>(&format!("SELECT {COLUMNS} FROM articles WHERE id = ?1"))
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn find_by_slug(db: &SqlitePool, slug: &str) -> Result<Option<Article>, sqlx::Error> {
    sqlx::query_as::<_, Article>(&format!("SELECT {COLUMNS} FROM articles WHERE slug = ?1"))
        .bind(slug)
        .fetch_optional(db)
        .await
}

/// Whether another article (other than `except`) already uses `slug`.
pub async fn slug_taken(
    db: &SqlitePool,
    slug: &str,
    except: Option<Uuid>,
) -> Result<bool, sqlx::Error> {
    let found: Option<i64> = sqlx::query_scalar(
        "SELECT 1 FROM articles WHERE slug = ?1 AND (?2 IS NULL OR id != ?2) LIMIT 1",
    )
    .bind(slug)
    .bind(except)
    .fetch_optional(db)
    .await?;
    Ok(found.is_some())
}

pub async fn save(db: &SqlitePool, a: &Article) -> Result<Article, sqlx::Error> {
    sqlx::query_as::<_, Article>(&format!(
        r#"
        UPDATE articles
        SET title = ?2, slug = ?3, excerpt = ?4, content = ?5, category = ?6, author = ?7,
            featured = ?8, published = ?9, image_url = ?10, read_time = ?11, updated_at = ?12
        WHERE id = ?1
        RETURNING {COLUMNS}
        "#
    ))
    .bind(a.id)
    .bind(&a.title)
    .bind(&a.slug)
    .bind(&a.excerpt)
    .bind(&a.content)
    .bind(&a.category)
    .bind(&a.author)
    .bind(a.featured)
    .bind(a.published)
    .bind(&a.image_url)
    .bind(&a.read_time)
    .bind(now_utc())
    .fetch_one(db)
    .await
}

pub async fn delete(db: &SqlitePool, id: Uuid) -> Result<bool, sqlx::Error> {
    let res = sqlx::query("DELETE FROM articles WHERE id = ?1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(res.rows_affected() > 0)
}

pub async fn count_published(db: &SqlitePool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM articles WHERE published = 1")
        .fetch_one(db)
        .await
}
