use sqlx::SqlitePool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo_types::{Session, SessionWithUser, User, ADMIN_ROLE};
use crate::db::now_utc;

impl User {
    /// Find the admin account with the given username.
    pub async fn find_admin_by_username(
        db: &SqlitePool,
        username: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, name, password_hash, role, created_at
            FROM users
            WHERE username = ?1 AND role = ?2
            "#,
        )
        .bind(username)
        .bind(ADMIN_ROLE)
        .fetch_optional(db)
        .await
    }

    pub async fn find_by_id(db: &SqlitePool, id: Uuid) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, name, password_hash, role, created_at
            FROM users
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await
    }

    /// Create an admin with an already hashed password.
    pub async fn create_admin(
        db: &SqlitePool,
        username: &str,
        password_hash: &str,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, username, name, password_hash, role, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            RETURNING id, username, email, name, password_hash, role, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(username)
        .bind("Administrator")
        .bind(password_hash)
        .bind(ADMIN_ROLE)
        .bind(now_utc())
        .fetch_one(db)
        .await
    }

    pub async fn update_password(
        db: &SqlitePool,
        id: Uuid,
        password_hash: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET password_hash = ?1 WHERE id = ?2")
            .bind(password_hash)
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }
}

impl Session {
    pub async fn create(
        db: &SqlitePool,
        token: &str,
        user_id: Uuid,
        expires_at: OffsetDateTime,
    ) -> Result<Session, sqlx::Error> {
        sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions (id, user_id, expires_at, created_at)
            VALUES (?1, ?2, ?3, ?4)
            RETURNING id, user_id, expires_at, created_at
            "#,
        )
        .bind(token)
        .bind(user_id)
        .bind(expires_at)
        .bind(now_utc())
        .fetch_one(db)
        .await
    }

    pub async fn find_with_user(
        db: &SqlitePool,
        token: &str,
    ) -> Result<Option<SessionWithUser>, sqlx::Error> {
        sqlx::query_as::<_, SessionWithUser>(
            r#"
            SELECT s.id, s.user_id, u.username, u.name, u.email, s.expires_at
            FROM sessions s
            JOIN users u ON u.id = s.user_id
            WHERE s.id = ?1
            "#,
        )
        .bind(token)
        .fetch_optional(db)
        .await
    }

    /// Returns the number of rows removed (0 when the token was unknown).
    pub async fn delete(db: &SqlitePool, token: &str) -> Result<u64, sqlx::Error> {
        let res = sqlx::query("DELETE FROM sessions WHERE id = ?1")
            .bind(token)
            .execute(db)
            .await?;
        Ok(res.rows_affected())
    }
}
