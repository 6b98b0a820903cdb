use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue},
    routing::{get, post},
    Json, Router,
};
use time::Duration;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{ChangePasswordRequest, LoginRequest, SessionInfo, MIN_PASSWORD_LEN},
        extractors::AdminUser,
        services::{self, clear_session_cookie, session_cookie, session_token},
    },
    error::AppError,
    response::{non_blank, ApiResponse, AppJson},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/password", post(change_password))
        .route("/auth/session", get(current_session))
}

fn cookie_header(cookie: &str) -> Result<HeaderMap, AppError> {
    let mut headers = HeaderMap::new();
    let value = HeaderValue::from_str(cookie).map_err(|e| AppError::Internal(e.into()))?;
    headers.insert(header::SET_COOKIE, value);
    Ok(headers)
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<(HeaderMap, Json<ApiResponse<()>>), AppError> {
    let (Some(username), Some(password)) = (
        non_blank(payload.username),
        payload.password.filter(|p| !p.is_empty()),
    ) else {
        warn!("login with missing fields");
        return Err(AppError::validation("Username dan password harus diisi"));
    };

    let ttl_hours = state.config.session.ttl_hours;
    let session = services::login(&state.db, &username, &password, Duration::hours(ttl_hours)).await?;

    let headers = cookie_header(&session_cookie(
        &session.id,
        ttl_hours * 60 * 60,
        state.config.session.cookie_secure,
    ))?;
    Ok((headers, ApiResponse::ok()))
}

#[instrument(skip(state, headers))]
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<(HeaderMap, Json<ApiResponse<()>>), AppError> {
    if let Some(token) = session_token(&headers) {
        services::logout(&state.db, &token).await?;
    }
    let headers = cookie_header(&clear_session_cookie(state.config.session.cookie_secure))?;
    Ok((headers, ApiResponse::ok()))
}

#[instrument(skip(state, admin, payload), fields(user_id = %admin.user_id))]
pub async fn change_password(
    State(state): State<AppState>,
    admin: AdminUser,
    AppJson(payload): AppJson<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let not_empty = |v: Option<String>| v.filter(|s| !s.is_empty());
    let (Some(current), Some(new), Some(confirm)) = (
        not_empty(payload.current_password),
        not_empty(payload.new_password),
        not_empty(payload.confirm_password),
    ) else {
        return Err(AppError::validation("Semua field harus diisi"));
    };

    if new != confirm {
        return Err(AppError::validation("Password baru tidak cocok"));
    }
    if new.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::validation("Password minimal 6 karakter"));
    }

    services::change_password(&state.db, admin.user_id, &current, &new).await?;
    info!(username = %admin.username, "password updated");
    Ok(ApiResponse::ok())
}

#[instrument(skip(admin))]
pub async fn current_session(admin: AdminUser) -> Json<ApiResponse<SessionInfo>> {
    ApiResponse::data(SessionInfo {
        user_id: admin.user_id,
        username: admin.username,
        name: admin.name,
        email: admin.email,
    })
}

#[cfg(test)]
mod tests {
    use axum::http::{header, HeaderValue, StatusCode};
    use serde_json::{json, Value};
    use sqlx::SqlitePool;

    use crate::test_support::{admin_cookie, test_app};

    #[sqlx::test]
    async fn login_sets_http_only_cookie(db: SqlitePool) {
        let app = test_app(db.clone()).await;
        crate::auth::services::ensure_admin(&db, "admin", "admin123")
            .await
            .unwrap();

        let res = app
            .server
            .post("/api/auth/login")
            .json(&json!({ "username": "admin", "password": "admin123" }))
            .await;

        res.assert_status(StatusCode::OK);
        let cookie = res.header(header::SET_COOKIE);
        let cookie = cookie.to_str().unwrap();
        assert!(cookie.starts_with("admin_session="));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Max-Age=86400"));
        assert_eq!(res.json::<Value>(), json!({ "success": true }));
    }

    #[sqlx::test]
    async fn login_failure_sets_no_cookie(db: SqlitePool) {
        let app = test_app(db.clone()).await;
        crate::auth::services::ensure_admin(&db, "admin", "admin123")
            .await
            .unwrap();

        let res = app
            .server
            .post("/api/auth/login")
            .json(&json!({ "username": "admin", "password": "nope" }))
            .await;

        res.assert_status(StatusCode::UNAUTHORIZED);
        assert!(res.headers().get(header::SET_COOKIE).is_none());
        assert_eq!(
            res.json::<Value>(),
            json!({ "success": false, "error": "Username atau password salah" })
        );
    }

    #[sqlx::test]
    async fn login_requires_both_fields(db: SqlitePool) {
        let app = test_app(db).await;

        let res = app
            .server
            .post("/api/auth/login")
            .json(&json!({ "username": "admin" }))
            .await;

        res.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(res.json::<Value>()["error"], "Username dan password harus diisi");
    }

    #[sqlx::test]
    async fn session_endpoint_requires_cookie(db: SqlitePool) {
        let app = test_app(db.clone()).await;

        app.server
            .get("/api/auth/session")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);

        let cookie = admin_cookie(&db).await;
        let res = app
            .server
            .get("/api/auth/session")
            .add_header(header::COOKIE, cookie)
            .await;
        res.assert_status(StatusCode::OK);
        let data = &res.json::<Value>()["data"];
        assert_eq!(data["username"], "admin");
        assert_eq!(data["name"], "Administrator");
        assert_eq!(data["email"], Value::Null);
    }

    #[sqlx::test]
    async fn logout_clears_cookie_and_session(db: SqlitePool) {
        let app = test_app(db.clone()).await;
        let cookie = admin_cookie(&db).await;

        let res = app
            .server
            .post("/api/auth/logout")
            .add_header(header::COOKIE, cookie.clone())
            .await;
        res.assert_status(StatusCode::OK);
        assert!(res
            .header(header::SET_COOKIE)
            .to_str()
            .unwrap()
            .contains("Max-Age=0"));

        app.server
            .get("/api/auth/session")
            .add_header(header::COOKIE, cookie)
            .await
            .assert_status(StatusCode::UNAUTHORIZED);

        // without any cookie logout still succeeds
        app.server
            .post("/api/auth/logout")
            .await
            .assert_status(StatusCode::OK);
    }

    #[sqlx::test]
    async fn change_password_validates_input(db: SqlitePool) {
        let app = test_app(db.clone()).await;
        let cookie = admin_cookie(&db).await;

        let cases = [
            (json!({ "currentPassword": "admin123" }), "Semua field harus diisi"),
            (
                json!({ "currentPassword": "admin123", "newPassword": "abcdef", "confirmPassword": "abcdeg" }),
                "Password baru tidak cocok",
            ),
            (
                json!({ "currentPassword": "admin123", "newPassword": "abc", "confirmPassword": "abc" }),
                "Password minimal 6 karakter",
            ),
            (
                json!({ "currentPassword": "wrong", "newPassword": "abcdef", "confirmPassword": "abcdef" }),
                "Password lama tidak sesuai",
            ),
        ];

        for (body, message) in cases {
            let res = app
                .server
                .post("/api/auth/password")
                .add_header(header::COOKIE, cookie.clone())
                .json(&body)
                .await;
            res.assert_status(StatusCode::BAD_REQUEST);
            assert_eq!(res.json::<Value>()["error"], message);
        }

        let res = app
            .server
            .post("/api/auth/password")
            .add_header(header::COOKIE, cookie)
            .json(&json!({ "currentPassword": "admin123", "newPassword": "abcdef", "confirmPassword": "abcdef" }))
            .await;
        res.assert_status(StatusCode::OK);

        app.server
            .post("/api/auth/login")
            .json(&json!({ "username": "admin", "password": "abcdef" }))
            .await
            .assert_status(StatusCode::OK);
    }

    #[sqlx::test]
    async fn change_password_requires_session(db: SqlitePool) {
        let app = test_app(db).await;

        let res = app
            .server
            .post("/api/auth/password")
            .add_header(header::COOKIE, HeaderValue::from_static("admin_session=bogus"))
            .json(&json!({ "currentPassword": "a", "newPassword": "abcdef", "confirmPassword": "abcdef" }))
            .await;

        res.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(res.json::<Value>()["error"], "Tidak terautentikasi");
    }
}
