//! Legal service offerings shown on the services page.

use axum::{extract::State, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use time::OffsetDateTime;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::extractors::AdminUser,
    db::now_utc,
    display::repo::DisplayTable,
    error::AppError,
    response::{non_blank, ApiResponse, AppJson, AppQuery, IdParam},
    state::AppState,
};

pub const TABLE: DisplayTable = DisplayTable {
    table: "services",
    columns: "id, title, description, icon, sort_order, active, created_at, updated_at",
};

pub const DEFAULT_ICON: &str = "MessageSquare";

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ServiceItem {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub icon: String,
    #[sqlx(rename = "sort_order")]
    pub order: i64,
    pub active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Default, Deserialize)]
pub struct ServiceItemRequest {
    pub id: Option<Uuid>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub order: Option<i64>,
    pub active: Option<bool>,
}

impl ServiceItemRequest {
    fn into_new(self) -> Result<ServiceItem, AppError> {
        let (Some(title), Some(description)) = (non_blank(self.title), non_blank(self.description))
        else {
            return Err(AppError::validation("Missing required fields"));
        };
        let now = now_utc();
        Ok(ServiceItem {
            id: Uuid::new_v4(),
            title,
            description,
            icon: non_blank(self.icon).unwrap_or_else(|| DEFAULT_ICON.to_string()),
            order: self.order.unwrap_or(0),
            active: self.active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        })
    }

    fn apply(self, mut s: ServiceItem) -> ServiceItem {
        if let Some(v) = non_blank(self.title) {
            s.title = v;
        }
        if let Some(v) = non_blank(self.description) {
            s.description = v;
        }
        if let Some(v) = non_blank(self.icon) {
            s.icon = v;
        }
        if let Some(v) = self.order {
            s.order = v;
        }
        if let Some(v) = self.active {
            s.active = v;
        }
        s
    }
}

async fn insert(db: &SqlitePool, s: &ServiceItem) -> Result<ServiceItem, sqlx::Error> {
    sqlx::query_as::<_, ServiceItem>(&format!(
        r#"
        INSERT INTO services
            (id, title, description, icon, sort_order, active, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        RETURNING {}
        "#,
        TABLE.columns
    ))
    .bind(s.id)
    .bind(&s.title)
    .bind(&s.description)
    .bind(&s.icon)
    .bind(s.order)
    .bind(s.active)
    .bind(s.created_at)
    .bind(s.updated_at)
    .fetch_one(db)
    .await
}

async fn save(db: &SqlitePool, s: &ServiceItem) -> Result<ServiceItem, sqlx::Error> {
    sqlx::query_as::<_, ServiceItem>(&format!(
        r#"
        UPDATE services
        SET title = ?2, description = ?3, icon = ?4, sort_order = ?5, active = ?6, updated_at = ?7
        WHERE id = ?1
        RETURNING {}
        "#,
        TABLE.columns
    ))
    .bind(s.id)
    .bind(&s.title)
    .bind(&s.description)
    .bind(&s.icon)
    .bind(s.order)
    .bind(s.active)
    .bind(now_utc())
    .fetch_one(db)
    .await
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/services", get(public_list)).route(
        "/admin/services",
        get(admin_list).post(create).put(update).delete(remove),
    )
}

#[instrument(skip(state))]
pub async fn public_list(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<ServiceItem>>>, AppError> {
    Ok(ApiResponse::data(TABLE.list(&state.db, true).await?))
}

#[instrument(skip(state, _admin))]
pub async fn admin_list(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<ApiResponse<Vec<ServiceItem>>>, AppError> {
    Ok(ApiResponse::data(TABLE.list(&state.db, false).await?))
}

#[instrument(skip(state, _admin, payload))]
pub async fn create(
    State(state): State<AppState>,
    _admin: AdminUser,
    AppJson(payload): AppJson<ServiceItemRequest>,
) -> Result<Json<ApiResponse<ServiceItem>>, AppError> {
    let row = insert(&state.db, &payload.into_new()?).await?;
    info!(id = %row.id, title = %row.title, "service created");
    Ok(ApiResponse::data(row))
}

#[instrument(skip(state, _admin, payload))]
pub async fn update(
    State(state): State<AppState>,
    _admin: AdminUser,
    AppJson(payload): AppJson<ServiceItemRequest>,
) -> Result<Json<ApiResponse<ServiceItem>>, AppError> {
    let id = payload.id.ok_or_else(|| AppError::validation("ID is required"))?;
    let existing: ServiceItem = TABLE
        .find(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("Service not found"))?;
    Ok(ApiResponse::data(save(&state.db, &payload.apply(existing)).await?))
}

#[instrument(skip(state, _admin))]
pub async fn remove(
    State(state): State<AppState>,
    _admin: AdminUser,
    AppQuery(param): AppQuery<IdParam>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let id = param.require()?;
    if !TABLE.delete(&state.db, id).await? {
        return Err(AppError::not_found("Service not found"));
    }
    Ok(ApiResponse::message("Service deleted"))
}
