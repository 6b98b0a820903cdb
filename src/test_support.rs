use std::path::Path;
use std::sync::Arc;

use axum::http::HeaderValue;
use axum_test::TestServer;
use sqlx::SqlitePool;
use tempfile::TempDir;
use time::Duration;

use crate::app::build_app;
use crate::auth::services::{ensure_admin, login, SESSION_COOKIE};
use crate::config::{AdminBootstrap, AppConfig, SessionConfig};
use crate::state::AppState;
use crate::storage::{LocalStorage, StorageClient};

pub(crate) struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    // keeps upload and backup directories alive for the test
    pub dir: TempDir,
}

pub(crate) fn test_config(dir: &Path, database_url: &str) -> AppConfig {
    AppConfig {
        database_url: database_url.to_string(),
        session: SessionConfig::default(),
        admin: AdminBootstrap {
            username: "admin".into(),
            password: Some("admin123".into()),
        },
        uploads_dir: dir.join("uploads"),
        backups_dir: dir.join("backups"),
        blob: None,
    }
}

pub(crate) fn test_state(db: SqlitePool, dir: &Path, database_url: &str) -> AppState {
    let config = Arc::new(test_config(dir, database_url));
    let local = Arc::new(LocalStorage::new(&config.uploads_dir)) as Arc<dyn StorageClient>;
    AppState::from_parts(db, config, local, None)
}

/// Router over `db` with an in-memory database URL, so backup endpoints report
/// themselves unavailable.
pub(crate) async fn test_app(db: SqlitePool) -> TestApp {
    let dir = tempfile::tempdir().expect("tempdir");
    let state = test_state(db, dir.path(), "sqlite::memory:");
    app_with_state(state, dir)
}

pub(crate) fn app_with_state(state: AppState, dir: TempDir) -> TestApp {
    let server = TestServer::new(build_app(state.clone())).expect("test server");
    TestApp { server, state, dir }
}

/// Cookie header value for a freshly logged-in `admin`/`admin123` account.
pub(crate) async fn admin_cookie(db: &SqlitePool) -> HeaderValue {
    ensure_admin(db, "admin", "admin123").await.expect("seed admin");
    let session = login(db, "admin", "admin123", Duration::hours(24))
        .await
        .expect("login");
    HeaderValue::from_str(&format!("{}={}", SESSION_COOKIE, session.id)).expect("cookie value")
}
