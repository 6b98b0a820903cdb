use axum::http::{header, HeaderMap};
use rand::{rngs::OsRng, RngCore};
use sqlx::SqlitePool;
use time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::auth::password::{hash_password, verify_password};
use crate::auth::repo_types::{Session, User};
use crate::db::now_utc;
use crate::error::AppError;

pub const SESSION_COOKIE: &str = "admin_session";
const TOKEN_BYTES: usize = 32;

/// Authenticated admin resolved from a session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentAdmin {
    pub user_id: Uuid,
    pub username: String,
    pub name: Option<String>,
    pub email: Option<String>,
}

/// 32 bytes from the OS RNG, hex encoded.
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

pub async fn login(
    db: &SqlitePool,
    username: &str,
    password: &str,
    ttl: Duration,
) -> Result<Session, AppError> {
    let Some(user) = User::find_admin_by_username(db, username).await? else {
        warn!(%username, "login unknown username");
        return Err(AppError::InvalidCredentials);
    };

    if !verify_password(password, &user.password_hash) {
        warn!(%username, user_id = %user.id, "login invalid password");
        return Err(AppError::InvalidCredentials);
    }

    let session = Session::create(db, &generate_token(), user.id, now_utc() + ttl).await?;
    info!(user_id = %user.id, %username, "admin logged in");
    Ok(session)
}

/// Resolves a token to its admin. Expired sessions are deleted on sight; there
/// is no renewal.
pub async fn validate_session(
    db: &SqlitePool,
    token: &str,
) -> Result<Option<CurrentAdmin>, AppError> {
    let Some(session) = Session::find_with_user(db, token).await? else {
        return Ok(None);
    };

    if session.expires_at <= now_utc() {
        debug!(user_id = %session.user_id, "session expired");
        Session::delete(db, &session.id).await?;
        return Ok(None);
    }

    Ok(Some(CurrentAdmin {
        user_id: session.user_id,
        username: session.username,
        name: session.name,
        email: session.email,
    }))
}

pub async fn change_password(
    db: &SqlitePool,
    user_id: Uuid,
    current: &str,
    new: &str,
) -> Result<(), AppError> {
    let user = User::find_by_id(db, user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User tidak ditemukan"))?;

    if !verify_password(current, &user.password_hash) {
        warn!(%user_id, "change password with wrong current password");
        return Err(AppError::WrongCurrentPassword);
    }

    let hash = hash_password(new)?;
    User::update_password(db, user_id, &hash).await?;
    info!(%user_id, "password changed");
    Ok(())
}

/// Deleting an unknown token is not an error.
pub async fn logout(db: &SqlitePool, token: &str) -> Result<(), AppError> {
    let removed = Session::delete(db, token).await?;
    debug!(removed, "session deleted");
    Ok(())
}

/// Creates the admin account when no admin with `username` exists. Existing
/// passwords are left untouched.
pub async fn ensure_admin(db: &SqlitePool, username: &str, password: &str) -> anyhow::Result<bool> {
    if User::find_admin_by_username(db, username).await?.is_some() {
        return Ok(false);
    }
    let hash = hash_password(password)?;
    let user = User::create_admin(db, username, &hash).await?;
    info!(user_id = %user.id, %username, "admin account created");
    Ok(true)
}

pub fn session_cookie(token: &str, max_age_secs: i64, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE, token, max_age_secs
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

pub fn clear_session_cookie(secure: bool) -> String {
    session_cookie("", 0, secure)
}

/// Reads the `admin_session` value from the request's Cookie headers.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    async fn seed_admin(db: &SqlitePool) {
        ensure_admin(db, "admin", "admin123").await.unwrap();
    }

    async fn session_count(db: &SqlitePool) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM sessions")
            .fetch_one(db)
            .await
            .unwrap()
    }

    #[test]
    fn tokens_are_64_hex_chars_and_unique() {
        let a = generate_token();
        let b = generate_token();
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn cookie_attributes() {
        assert_eq!(
            session_cookie("abc", 86400, false),
            "admin_session=abc; Path=/; HttpOnly; SameSite=Lax; Max-Age=86400"
        );
        assert!(session_cookie("abc", 86400, true).ends_with("; Secure"));
        assert!(clear_session_cookie(false).contains("Max-Age=0"));
    }

    #[test]
    fn token_is_read_from_cookie_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; admin_session=tok123; other=1"),
        );
        assert_eq!(session_token(&headers).as_deref(), Some("tok123"));

        let mut empty = HeaderMap::new();
        empty.insert(header::COOKIE, HeaderValue::from_static("admin_session="));
        assert_eq!(session_token(&empty), None);
        assert_eq!(session_token(&HeaderMap::new()), None);
    }

    #[sqlx::test]
    async fn login_creates_session_with_expiry(db: SqlitePool) {
        seed_admin(&db).await;

        let session = login(&db, "admin", "admin123", Duration::hours(24))
            .await
            .unwrap();

        assert_eq!(session.id.len(), 64);
        let remaining = session.expires_at - now_utc();
        assert!(remaining > Duration::hours(23) && remaining <= Duration::hours(24));

        let admin = validate_session(&db, &session.id).await.unwrap().unwrap();
        assert_eq!(admin.username, "admin");
        assert_eq!(admin.user_id, session.user_id);
    }

    #[sqlx::test]
    async fn login_rejects_wrong_password_and_unknown_user(db: SqlitePool) {
        seed_admin(&db).await;

        let err = login(&db, "admin", "wrong", Duration::hours(24))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));

        let err = login(&db, "ghost", "admin123", Duration::hours(24))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));

        assert_eq!(session_count(&db).await, 0);
    }

    #[sqlx::test]
    async fn login_ignores_non_admin_accounts(db: SqlitePool) {
        let hash = hash_password("editor123").unwrap();
        sqlx::query(
            "INSERT INTO users (id, username, password_hash, role, created_at) VALUES (?1, ?2, ?3, 'editor', ?4)",
        )
        .bind(Uuid::new_v4())
        .bind("editor")
        .bind(hash)
        .bind(now_utc())
        .execute(&db)
        .await
        .unwrap();

        let err = login(&db, "editor", "editor123", Duration::hours(24))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));
    }

    #[sqlx::test]
    async fn expired_session_is_removed_lazily(db: SqlitePool) {
        seed_admin(&db).await;
        let session = login(&db, "admin", "admin123", Duration::seconds(-1))
            .await
            .unwrap();
        assert_eq!(session_count(&db).await, 1);

        assert_eq!(validate_session(&db, &session.id).await.unwrap(), None);
        assert_eq!(session_count(&db).await, 0);

        // second lookup finds nothing and still reports no user
        assert_eq!(validate_session(&db, &session.id).await.unwrap(), None);
    }

    #[sqlx::test]
    async fn unknown_token_is_no_user(db: SqlitePool) {
        assert_eq!(validate_session(&db, "nope").await.unwrap(), None);
    }

    #[sqlx::test]
    async fn wrong_current_password_keeps_hash(db: SqlitePool) {
        seed_admin(&db).await;
        let before = User::find_admin_by_username(&db, "admin").await.unwrap().unwrap();

        let err = change_password(&db, before.id, "not-it", "newpass1")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::WrongCurrentPassword));

        let after = User::find_by_id(&db, before.id).await.unwrap().unwrap();
        assert_eq!(before.password_hash, after.password_hash);
    }

    #[sqlx::test]
    async fn change_password_replaces_hash(db: SqlitePool) {
        seed_admin(&db).await;
        let user = User::find_admin_by_username(&db, "admin").await.unwrap().unwrap();

        change_password(&db, user.id, "admin123", "newpass1").await.unwrap();

        assert!(login(&db, "admin", "newpass1", Duration::hours(1)).await.is_ok());
        assert!(matches!(
            login(&db, "admin", "admin123", Duration::hours(1)).await,
            Err(AppError::InvalidCredentials)
        ));
    }

    #[sqlx::test]
    async fn logout_is_idempotent(db: SqlitePool) {
        seed_admin(&db).await;
        let session = login(&db, "admin", "admin123", Duration::hours(1)).await.unwrap();

        logout(&db, &session.id).await.unwrap();
        logout(&db, &session.id).await.unwrap();
        assert_eq!(validate_session(&db, &session.id).await.unwrap(), None);
    }

    #[sqlx::test]
    async fn ensure_admin_does_not_overwrite(db: SqlitePool) {
        assert!(ensure_admin(&db, "admin", "first").await.unwrap());
        assert!(!ensure_admin(&db, "admin", "second").await.unwrap());
        assert!(login(&db, "admin", "first", Duration::hours(1)).await.is_ok());
    }
}
