use sqlx::{sqlite::SqliteRow, FromRow, SqlitePool};
use uuid::Uuid;

/// Table layout of a display entity. Table and column names are compile-time
/// constants, never request input.
#[derive(Debug, Clone, Copy)]
pub struct DisplayTable {
    pub table: &'static str,
    pub columns: &'static str,
}

impl DisplayTable {
    pub async fn list<T>(&self, db: &SqlitePool, active_only: bool) -> Result<Vec<T>, sqlx::Error>
    where
        T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
    {
        sqlx::query_as::<_, T>(&format!(
            r#"
            SELECT {}
            FROM {}
            WHERE (?1 = 0 OR active = 1)
            ORDER BY sort_order ASC, created_at ASC, rowid ASC
            "#,
            self.columns, self.table
        ))
        .bind(active_only)
        .fetch_all(db)
        .await
    }

    pub async fn find<T>(&self, db: &SqlitePool, id: Uuid) -> Result<Option<T>, sqlx::Error>
    where
        T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
    {
        sqlx::query_as::<_, T>(&format!(
            "SELECT {} FROM {} WHERE id = ?1",
            self.columns, self.table
        ))
        .bind(id)
        .fetch_optional(db)
        .await
    }

    pub async fn delete(&self, db: &SqlitePool, id: Uuid) -> Result<bool, sqlx::Error> {
        let res = sqlx::query(&format!("DELETE FROM {} WHERE id = ?1", self.table))
            .bind(id)
            .execute(db)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    pub async fn count_active(&self, db: &SqlitePool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM {} WHERE active = 1",
            self.table
        ))
        .fetch_one(db)
        .await
    }
}
