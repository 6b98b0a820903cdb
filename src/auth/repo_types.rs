use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

pub const ADMIN_ROLE: &str = "admin";

/// Credential holder.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub password_hash: String, // Argon2 PHC string
    pub role: String,
    pub created_at: OffsetDateTime,
}

/// Server-side session row; `id` is the opaque cookie token.
#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub id: String,
    pub user_id: Uuid,
    pub expires_at: OffsetDateTime,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub struct SessionWithUser {
    pub id: String,
    pub user_id: Uuid,
    pub username: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub expires_at: OffsetDateTime,
}
