use lbh_site::{app, auth, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "lbh_site=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let app_state = AppState::init().await?;

    match app_state.config.admin.password.as_deref() {
        Some(password) => {
            auth::services::ensure_admin(&app_state.db, &app_state.config.admin.username, password)
                .await?;
        }
        None => tracing::warn!("ADMIN_PASSWORD not set; skipping admin bootstrap"),
    }

    let router = app::build_app(app_state);
    app::serve(router).await
}
