//! Hero carousel on the home page.

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
    table: "slides",
    columns: "id, title, subtitle, description, button_text, button_url, image_url, sort_order, active, created_at, updated_at",
};

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Slide {
    pub id: Uuid,
    pub title: String,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub button_text: Option<String>,
    pub button_url: Option<String>,
    pub image_url: Option<String>,
    #[sqlx(rename = "sort_order")]
    pub order: i64,
    pub active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideRequest {
    pub id: Option<Uuid>,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub button_text: Option<String>,
    pub button_url: Option<String>,
    pub image_url: Option<String>,
    pub order: Option<i64>,
    pub active: Option<bool>,
}

impl SlideRequest {
    fn into_new(self) -> Result<Slide, AppError> {
        let title = non_blank(self.title).ok_or_else(|| AppError::validation("Title is required"))?;
        let now = now_utc();
        Ok(Slide {
            id: Uuid::new_v4(),
            title,
            subtitle: non_blank(self.subtitle),
            description: non_blank(self.description),
            button_text: non_blank(self.button_text),
            button_url: non_blank(self.button_url),
            image_url: non_blank(self.image_url),
            order: self.order.unwrap_or(0),
            active: self.active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        })
    }

    /// Optional text fields present in the body replace the stored value; an
    /// empty string clears it.
    fn apply(self, mut s: Slide) -> Slide {
        if let Some(v) = non_blank(self.title) {
            s.title = v;
        }
        for (incoming, slot) in [
            (self.subtitle, &mut s.subtitle),
            (self.description, &mut s.description),
            (self.button_text, &mut s.button_text),
            (self.button_url, &mut s.button_url),
            (self.image_url, &mut s.image_url),
        ] {
            if incoming.is_some() {
                *slot = non_blank(incoming);
            }
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

async fn insert(db: &SqlitePool, s: &Slide) -> Result<Slide, sqlx::Error> {
    sqlx::query_as::<_, Slide>(&format!(
        r#"
        INSERT INTO slides
            (id, title, subtitle, description, button_text, button_url, image_url,
             sort_order, active, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        RETURNING {}
        "#,
        TABLE.columns
    ))
    .bind(s.id)
    .bind(&s.title)
    .bind(&s.subtitle)
    .bind(&s.description)
    .bind(&s.button_text)
    .bind(&s.button_url)
    .bind(&s.image_url)
    .bind(s.order)
    .bind(s.active)
    .bind(s.created_at)
    .bind(s.updated_at)
    .fetch_one(db)
    .await
}

async fn save(db: &SqlitePool, s: &Slide) -> Result<Slide, sqlx::Error> {
    sqlx::query_as::<_, Slide>(&format!(
        r#"
        UPDATE slides
        SET title = ?2, subtitle = ?3, description = ?4, button_text = ?5, button_url = ?6,
            image_url = ?7, sort_order = ?8, active = ?9, updated_at = ?10
        WHERE id = ?1
        RETURNING {}
        "#,
        TABLE.columns
    ))
    .bind(s.id)
    .bind(&s.title)
    .bind(&s.subtitle)
    .bind(&s.description)
    .bind(&s.button_text)
    .bind(&s.button_url)
    .bind(&s.image_url)
    .bind(s.order)
    .bind(s.active)
    .bind(now_utc())
    .fetch_one(db)
    .await
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/slides", get(public_list)).route(
        "/admin/slides",
        get(admin_list).post(create).put(update).delete(remove),
    )
}

#[instrument(skip(state))]
pub async fn public_list(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Slide>>>, AppError> {
    Ok(ApiResponse::data(TABLE.list(&state.db, true).await?))
}

#[instrument(skip(state, _admin))]
pub async fn admin_list(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<ApiResponse<Vec<Slide>>>, AppError> {
    Ok(ApiResponse::data(TABLE.list(&state.db, false).await?))
}

#[instrument(skip(state, _admin, payload))]
pub async fn create(
    State(state): State<AppState>,
    _admin: AdminUser,
    AppJson(payload): AppJson<SlideRequest>,
) -> Result<Json<ApiResponse<Slide>>, AppError> {
    let row = insert(&state.db, &payload.into_new()?).await?;
    info!(id = %row.id, "slide created");
    Ok(ApiResponse::data(row))
}

#[instrument(skip(state, _admin, payload))]
pub async fn update(
    State(state): State<AppState>,
    _admin: AdminUser,
    AppJson(payload): AppJson<SlideRequest>,
) -> Result<Json<ApiResponse<Slide>>, AppError> {
    let id = payload.id.ok_or_else(|| AppError::validation("ID is required"))?;
    let existing: Slide = TABLE
        .find(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("Slide not found"))?;
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
        return Err(AppError::not_found("Slide not found"));
    }
    Ok(ApiResponse::message("Slide deleted"))
}
