use std::collections::BTreeMap;

use axum::{extract::State, routing::get, Json, Router};
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, instrument};

use crate::{
    auth::extractors::AdminUser,
    error::AppError,
    response::{ApiResponse, AppJson},
    settings::repo::{self, SiteSetting},
    state::AppState,
};

pub fn settings_routes() -> Router<AppState> {
    Router::new()
        .route("/settings", get(public_settings))
        .route("/admin/settings", get(list).post(save))
}

#[derive(Debug, Deserialize)]
pub struct SaveSettingsRequest {
    pub settings: Option<Value>,
}

/// Stored values are text; anything that is not already a string is kept as
/// its JSON rendering.
fn stringify(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

#[instrument(skip(state))]
pub async fn public_settings(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<BTreeMap<String, String>>>, AppError> {
    Ok(ApiResponse::data(repo::as_map(&state.db).await?))
}

#[instrument(skip(state, _admin))]
pub async fn list(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<ApiResponse<Vec<SiteSetting>>>, AppError> {
    Ok(ApiResponse::data(repo::all(&state.db).await?))
}

#[instrument(skip(state, _admin, payload))]
pub async fn save(
    State(state): State<AppState>,
    _admin: AdminUser,
    AppJson(payload): AppJson<SaveSettingsRequest>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let Some(Value::Object(settings)) = payload.settings else {
        return Err(AppError::validation("Settings object is required"));
    };

    let pairs: Vec<(String, String)> = settings
        .into_iter()
        .map(|(k, v)| (k, stringify(v)))
        .collect();
    repo::upsert_all(&state.db, &pairs).await?;

    info!(count = pairs.len(), "settings saved");
    Ok(ApiResponse::message("Settings saved successfully"))
}

#[cfg(test)]
mod tests {
    use axum::http::{header, StatusCode};
    use serde_json::{json, Value};
    use sqlx::SqlitePool;

    use super::stringify;
    use crate::test_support::{admin_cookie, test_app};

    #[test]
    fn non_string_values_are_stringified() {
        assert_eq!(stringify(json!("Jl. Merdeka")), "Jl. Merdeka");
        assert_eq!(stringify(json!(42)), "42");
        assert_eq!(stringify(json!(true)), "true");
    }

    #[sqlx::test]
    async fn upsert_overwrites_and_public_map_reflects_it(db: SqlitePool) {
        let app = test_app(db.clone()).await;
        let cookie = admin_cookie(&db).await;

        for phone in ["0811", "0812"] {
            app.server
                .post("/api/admin/settings")
                .add_header(header::COOKIE, cookie.clone())
                .json(&json!({ "settings": { "phone": phone, "year": 2024 } }))
                .await
                .assert_status(StatusCode::OK);
        }

        let public = app.server.get("/api/settings").await.json::<Value>();
        assert_eq!(public["data"], json!({ "phone": "0812", "year": "2024" }));

        let admin = app
            .server
            .get("/api/admin/settings")
            .add_header(header::COOKIE, cookie)
            .await
            .json::<Value>();
        let rows = admin["data"].as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["key"], "phone");
        assert_eq!(rows[0]["type"], "text");
    }

    #[sqlx::test]
    async fn settings_object_is_required(db: SqlitePool) {
        let app = test_app(db.clone()).await;
        let cookie = admin_cookie(&db).await;

        for body in [json!({}), json!({ "settings": "nope" }), json!({ "settings": [1, 2] })] {
            let res = app
                .server
                .post("/api/admin/settings")
                .add_header(header::COOKIE, cookie.clone())
                .json(&body)
                .await;
            res.assert_status(StatusCode::BAD_REQUEST);
            assert_eq!(res.json::<Value>()["error"], "Settings object is required");
        }
    }
}
