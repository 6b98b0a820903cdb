use axum::{extract::FromRequest, extract::FromRequestParts, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// `Json` extractor whose rejection uses the shared error envelope.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// `Query` extractor whose rejection uses the shared error envelope.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct AppQuery<T>(pub T);

/// Success envelope shared by every JSON endpoint.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn data(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            message: None,
        })
    }

    pub fn with_message(data: T, message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            message: Some(message.into()),
        })
    }
}

impl ApiResponse<()> {
    pub fn ok() -> Json<Self> {
        Json(Self {
            success: true,
            data: None,
            message: None,
        })
    }

    pub fn message(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: true,
            data: None,
            message: Some(message.into()),
        })
    }
}

/// Treats blank strings from form submissions as missing. Non-blank values
/// are returned as sent.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Like [`non_blank`], but trims the value. For identifiers, paths and names
/// typed into query strings.
pub fn trimmed(value: Option<String>) -> Option<String> {
    non_blank(value).map(|v| v.trim().to_string())
}

/// `?id=` for delete endpoints.
#[derive(Debug, Deserialize)]
pub struct IdParam {
    pub id: Option<String>,
}

impl IdParam {
    pub fn require(self) -> Result<Uuid, AppError> {
        let raw = trimmed(self.id).ok_or_else(|| AppError::validation("ID is required"))?;
        Uuid::parse_str(&raw).map_err(|_| AppError::validation("ID tidak valid"))
    }
}

/// Lenient `?limit=` parsing: anything unparsable or non-positive falls back
/// to `default`.
pub fn parse_limit(raw: Option<&str>, default: i64) -> i64 {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(default)
}

/// Query flags are only on when spelled `true`.
pub fn flag(raw: Option<&str>) -> bool {
    raw == Some("true")
}
