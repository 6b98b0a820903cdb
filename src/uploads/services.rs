use bytes::Bytes;
use lazy_static::lazy_static;
use regex::Regex;
use time::OffsetDateTime;
use tracing::warn;
use url::Url;

use crate::state::AppState;
use crate::storage::StorageKind;

pub const DEFAULT_FOLDER: &str = "team";
const FALLBACK_NAME: &str = "upload.jpg";

lazy_static! {
    static ref UNSAFE_NAME_CHARS: Regex = Regex::new(r"[^A-Za-z0-9._-]").unwrap();
    static ref UNSAFE_FOLDER_CHARS: Regex = Regex::new(r"[^A-Za-z0-9_-]").unwrap();
    static ref DRIVE_ID: Regex = Regex::new(r"^[A-Za-z0-9_-]{10,}$").unwrap();
}

/// Base name of an uploaded file with anything outside `[A-Za-z0-9._-]`
/// replaced by `_`.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned = UNSAFE_NAME_CHARS.replace_all(base, "_");
    if cleaned.trim_matches(['.', '_']).is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        cleaned.into_owned()
    }
}

/// Folders are a single path segment; separators and dots never survive.
pub fn sanitize_folder(folder: Option<&str>) -> String {
    let cleaned = UNSAFE_FOLDER_CHARS
        .replace_all(folder.unwrap_or_default().trim(), "_")
        .into_owned();
    if cleaned.trim_matches('_').is_empty() {
        DEFAULT_FOLDER.to_string()
    } else {
        cleaned
    }
}

pub fn object_key(folder: &str, file_name: &str, at: OffsetDateTime) -> String {
    let millis = at.unix_timestamp_nanos() / 1_000_000;
    format!("{}/{}-{}", folder, millis, file_name)
}

/// `local` and `blob` select a backend; anything else means "use the default".
pub fn parse_target(raw: Option<&str>) -> Option<StorageKind> {
    match raw.map(str::trim) {
        Some("local") => Some(StorageKind::Local),
        Some("blob") => Some(StorageKind::Blob),
        _ => None,
    }
}

pub struct StoredUpload {
    pub url: String,
    pub storage: StorageKind,
}

/// Writes to the blob store when it is selected and configured, falling back
/// to local disk when it is missing or the write fails.
pub async fn store_upload(
    state: &AppState,
    target: Option<StorageKind>,
    key: &str,
    body: Bytes,
    content_type: &str,
) -> anyhow::Result<StoredUpload> {
    let wants_blob = match target {
        Some(kind) => kind == StorageKind::Blob,
        None => state.blob_storage.is_some(),
    };

    if wants_blob {
        match &state.blob_storage {
            Some(blob) => match blob.put_object(key, body.clone(), content_type).await {
                Ok(url) => {
                    return Ok(StoredUpload {
                        url,
                        storage: blob.kind(),
                    })
                }
                Err(e) => warn!(error = %e, %key, "blob upload failed, storing locally"),
            },
            None => warn!(%key, "blob storage not configured, storing locally"),
        }
    }

    let url = state.local_storage.put_object(key, body, content_type).await?;
    Ok(StoredUpload {
        url,
        storage: state.local_storage.kind(),
    })
}

/// Accepts a bare Drive file id or any Drive/share URL carrying one.
pub fn drive_file_id(id_or_url: &str) -> Option<String> {
    let raw = id_or_url.trim();
    if DRIVE_ID.is_match(raw) {
        return Some(raw.to_string());
    }

    let url = Url::parse(raw).ok()?;
    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    if url.host_str().is_some_and(|h| h.contains("drive.google.com")) {
        if let Some(pos) = segments.iter().position(|s| *s == "d") {
            if let Some(id) = segments.get(pos + 1) {
                return Some(id.to_string());
            }
        }
        if let Some((_, id)) = url.query_pairs().find(|(k, _)| k == "id") {
            if !id.is_empty() {
                return Some(id.into_owned());
            }
        }
    }

    segments
        .iter()
        .rev()
        .find(|s| DRIVE_ID.is_match(s))
        .map(|s| s.to_string())
}

pub fn drive_view_url(id: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(id.as_bytes()).collect();
    format!("https://drive.google.com/uc?export=view&id={}", encoded)
}
