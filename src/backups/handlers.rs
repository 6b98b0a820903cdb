use axum::{extract::State, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::{
    auth::extractors::AdminUser,
    backups::services::{self, ensure_supported, BackupFile},
    error::AppError,
    response::{trimmed, ApiResponse, AppJson, AppQuery},
    state::AppState,
};

pub fn backup_routes() -> Router<AppState> {
    Router::new().route(
        "/admin/database",
        get(list).post(create).put(restore).delete(remove),
    )
}

#[derive(Debug, Serialize)]
pub struct CreatedBackup {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct RestoreRequest {
    pub filename: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    pub filename: Option<String>,
    pub action: Option<String>,
}

#[instrument(skip(state, _admin))]
pub async fn list(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<ApiResponse<Vec<BackupFile>>>, AppError> {
    ensure_supported(&state.config)?;
    let files = services::list(&state.config.backups_dir).await?;
    Ok(ApiResponse::data(files))
}

#[instrument(skip(state, _admin))]
pub async fn create(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<ApiResponse<CreatedBackup>>, AppError> {
    let source = ensure_supported(&state.config)?;
    let name = services::create(&state.db, &state.config.backups_dir).await?;
    info!(source = %source.display(), %name, "snapshot written");
    Ok(ApiResponse::with_message(
        CreatedBackup { name },
        "Backup berhasil dibuat",
    ))
}

#[instrument(skip(state, admin, payload), fields(username = %admin.username))]
pub async fn restore(
    State(state): State<AppState>,
    admin: AdminUser,
    AppJson(payload): AppJson<RestoreRequest>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    ensure_supported(&state.config)?;
    let filename = trimmed(payload.filename)
        .ok_or_else(|| AppError::validation("Nama file harus diisi"))?;
    services::restore(&state.db, &state.config.backups_dir, &filename).await?;
    Ok(ApiResponse::message("Database berhasil dipulihkan"))
}

/// `?filename=` deletes one backup; `?action=reset` wipes the database.
#[instrument(skip(state, admin), fields(username = %admin.username))]
pub async fn remove(
    State(state): State<AppState>,
    admin: AdminUser,
    AppQuery(q): AppQuery<DeleteQuery>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    ensure_supported(&state.config)?;

    if let Some(filename) = trimmed(q.filename) {
        services::delete(&state.config.backups_dir, &filename).await?;
        return Ok(ApiResponse::message("Backup berhasil dihapus"));
    }

    if q.action.as_deref() == Some("reset") {
        let admin_recreated = services::reset(&state.db, &state.config).await?;
        info!(admin_recreated, "database reset by admin");
        return Ok(ApiResponse::message("Database berhasil direset"));
    }

    Err(AppError::validation("Aksi tidak valid"))
}

#[cfg(test)]
mod tests {
    use axum::http::{header, HeaderValue, StatusCode};
    use serde_json::{json, Value};
    use sqlx::SqlitePool;

    use crate::test_support::{admin_cookie, app_with_state, test_app, test_state, TestApp};

    async fn file_backed_app() -> (TestApp, HeaderValue) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("lbh.db").display());
        let db = crate::db::connect(&url).await.unwrap();
        let cookie = admin_cookie(&db).await;
        let state = test_state(db, dir.path(), &url);
        (app_with_state(state, dir), cookie)
    }

    async fn article_slugs(db: &SqlitePool) -> Vec<String> {
        sqlx::query_scalar("SELECT slug FROM articles ORDER BY slug")
            .fetch_all(db)
            .await
            .unwrap()
    }

    async fn add_article(app: &TestApp, cookie: &HeaderValue, slug: &str) {
        app.server
            .post("/api/admin/articles")
            .add_header(header::COOKIE, cookie.clone())
            .json(&json!({
                "title": slug,
                "slug": slug,
                "excerpt": "e",
                "content": "c",
                "category": "umum",
                "author": "Tim"
            }))
            .await
            .assert_status(StatusCode::OK);
    }

    #[sqlx::test]
    async fn in_memory_database_reports_unsupported(db: SqlitePool) {
        let app = test_app(db.clone()).await;
        let cookie = admin_cookie(&db).await;

        let res = app
            .server
            .get("/api/admin/database")
            .add_header(header::COOKIE, cookie)
            .await;
        res.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(
            res.json::<Value>()["error"],
            "Backup database tidak tersedia untuk database ini"
        );
    }

    #[tokio::test]
    async fn backup_then_restore_rolls_back_changes() {
        let (app, cookie) = file_backed_app().await;
        add_article(&app, &cookie, "sebelum").await;

        let res = app
            .server
            .post("/api/admin/database")
            .add_header(header::COOKIE, cookie.clone())
            .await;
        res.assert_status(StatusCode::OK);
        let name = res.json::<Value>()["data"]["name"].as_str().unwrap().to_string();
        assert!(name.starts_with("backup-") && name.ends_with(".db"));

        let listed = app
            .server
            .get("/api/admin/database")
            .add_header(header::COOKIE, cookie.clone())
            .await
            .json::<Value>();
        assert_eq!(listed["data"][0]["name"], name.as_str());
        assert!(listed["data"][0]["size"].as_u64().unwrap() > 0);

        add_article(&app, &cookie, "sesudah").await;
        assert_eq!(article_slugs(&app.state.db).await, vec!["sebelum", "sesudah"]);

        app.server
            .put("/api/admin/database")
            .add_header(header::COOKIE, cookie.clone())
            .json(&json!({ "filename": name }))
            .await
            .assert_status(StatusCode::OK);
        assert_eq!(article_slugs(&app.state.db).await, vec!["sebelum"]);

        app.server
            .put("/api/admin/database")
            .add_header(header::COOKIE, cookie.clone())
            .json(&json!({ "filename": "backup-missing.db" }))
            .await
            .assert_status(StatusCode::NOT_FOUND);

        app.server
            .delete("/api/admin/database")
            .add_query_param("filename", &name)
            .add_header(header::COOKIE, cookie.clone())
            .await
            .assert_status(StatusCode::OK);
        assert!(!app.state.config.backups_dir.join(&name).exists());
    }

    #[tokio::test]
    async fn delete_validates_filename_and_action() {
        let (app, cookie) = file_backed_app().await;

        let res = app
            .server
            .delete("/api/admin/database")
            .add_header(header::COOKIE, cookie.clone())
            .await;
        res.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(res.json::<Value>()["error"], "Aksi tidak valid");

        app.server
            .delete("/api/admin/database")
            .add_query_param("filename", "../lbh.db")
            .add_header(header::COOKIE, cookie.clone())
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        app.server
            .delete("/api/admin/database")
            .add_query_param("filename", "backup-none.db")
            .add_header(header::COOKIE, cookie)
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn reset_wipes_content_and_recreates_admin() {
        let (app, cookie) = file_backed_app().await;
        add_article(&app, &cookie, "hilang").await;

        app.server
            .delete("/api/admin/database")
            .add_query_param("action", "reset")
            .add_header(header::COOKIE, cookie.clone())
            .await
            .assert_status(StatusCode::OK);

        assert!(article_slugs(&app.state.db).await.is_empty());

        // old sessions are gone, the bootstrap account works again
        app.server
            .get("/api/auth/session")
            .add_header(header::COOKIE, cookie)
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
        app.server
            .post("/api/auth/login")
            .json(&json!({ "username": "admin", "password": "admin123" }))
            .await
            .assert_status(StatusCode::OK);
    }
}
