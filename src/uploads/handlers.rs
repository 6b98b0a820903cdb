use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{info, instrument};

use crate::{
    auth::extractors::AdminUser,
    error::AppError,
    response::AppQuery,
    state::AppState,
    storage::StorageKind,
    uploads::services::{
        drive_file_id, drive_view_url, object_key, parse_target, sanitize_file_name,
        sanitize_folder, store_upload,
    },
};

const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub fn upload_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/upload",
            post(upload).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/drive-image", get(drive_image))
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub url: String,
    pub storage: StorageKind,
}

struct UploadedFile {
    name: String,
    content_type: String,
    body: Bytes,
}

fn bad_multipart(e: axum::extract::multipart::MultipartError) -> AppError {
    AppError::validation(format!("Failed to parse multipart data: {}", e.body_text()))
}

#[instrument(skip(state, _admin, multipart))]
pub async fn upload(
    State(state): State<AppState>,
    _admin: AdminUser,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut file: Option<UploadedFile> = None;
    let mut folder: Option<String> = None;
    let mut target: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().unwrap_or_default().to_string();
                let body = field.bytes().await.map_err(bad_multipart)?;
                file = Some(UploadedFile {
                    name,
                    content_type,
                    body,
                });
            }
            "folder" => folder = Some(field.text().await.map_err(bad_multipart)?),
            "target" => target = Some(field.text().await.map_err(bad_multipart)?),
            _ => {}
        }
    }

    let file = file.ok_or_else(|| AppError::validation("No file provided"))?;
    if !file.content_type.starts_with("image/") {
        return Err(AppError::validation("Only image uploads are allowed"));
    }

    let key = object_key(
        &sanitize_folder(folder.as_deref()),
        &sanitize_file_name(&file.name),
        OffsetDateTime::now_utc(),
    );
    let stored = store_upload(
        &state,
        parse_target(target.as_deref()),
        &key,
        file.body,
        &file.content_type,
    )
    .await?;

    info!(%key, storage = ?stored.storage, "file uploaded");
    Ok(Json(UploadResponse {
        success: true,
        url: stored.url,
        storage: stored.storage,
    }))
}

#[derive(Debug, Deserialize)]
pub struct DriveImageQuery {
    pub id: Option<String>,
}

#[instrument]
pub async fn drive_image(
    AppQuery(q): AppQuery<DriveImageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let id = q
        .id
        .as_deref()
        .and_then(drive_file_id)
        .ok_or_else(|| AppError::validation("missing id"))?;
    Ok((StatusCode::FOUND, [(header::LOCATION, drive_view_url(&id))]))
}
