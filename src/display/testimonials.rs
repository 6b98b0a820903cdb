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
    table: "testimonials",
    columns: "id, name, role, content, rating, sort_order, active, created_at, updated_at",
};

const DEFAULT_RATING: i64 = 5;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Testimonial {
    pub id: Uuid,
    pub name: String,
    pub role: String,
    pub content: String,
    pub rating: i64,
    #[sqlx(rename = "sort_order")]
    pub order: i64,
    pub active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Default, Deserialize)]
pub struct TestimonialRequest {
    pub id: Option<Uuid>,
    pub name: Option<String>,
    pub role: Option<String>,
    pub content: Option<String>,
    pub rating: Option<i64>,
    pub order: Option<i64>,
    pub active: Option<bool>,
}

fn check_rating(rating: i64) -> Result<i64, AppError> {
    if (1..=5).contains(&rating) {
        Ok(rating)
    } else {
        Err(AppError::validation("Rating must be between 1 and 5"))
    }
}

impl TestimonialRequest {
    fn into_new(self) -> Result<Testimonial, AppError> {
        let (Some(name), Some(role), Some(content)) = (
            non_blank(self.name),
            non_blank(self.role),
            non_blank(self.content),
        ) else {
            return Err(AppError::validation("Missing required fields"));
        };
        let now = now_utc();
        Ok(Testimonial {
            id: Uuid::new_v4(),
            name,
            role,
            content,
            rating: check_rating(self.rating.unwrap_or(DEFAULT_RATING))?,
            order: self.order.unwrap_or(0),
            active: self.active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        })
    }

    fn apply(self, mut t: Testimonial) -> Result<Testimonial, AppError> {
        if let Some(v) = non_blank(self.name) {
            t.name = v;
        }
        if let Some(v) = non_blank(self.role) {
            t.role = v;
        }
        if let Some(v) = non_blank(self.content) {
            t.content = v;
        }
        if let Some(v) = self.rating {
            t.rating = check_rating(v)?;
        }
        if let Some(v) = self.order {
            t.order = v;
        }
        if let Some(v) = self.active {
            t.active = v;
        }
        Ok(t)
    }
}

async fn insert(db: &SqlitePool, t: &Testimonial) -> Result<Testimonial, sqlx::Error> {
    sqlx::query_as::<_, Testimonial>(&format!(
        r#"
        INSERT INTO testimonials
            (id, name, role, content, rating, sort_order, active, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        RETURNING {}
        "#,
        TABLE.columns
    ))
    .bind(t.id)
    .bind(&t.name)
    .bind(&t.role)
    .bind(&t.content)
    .bind(t.rating)
    .bind(t.order)
    .bind(t.active)
    .bind(t.created_at)
    .bind(t.updated_at)
    .fetch_one(db)
    .await
}

async fn save(db: &SqlitePool, t: &Testimonial) -> Result<Testimonial, sqlx::Error> {
    sqlx::query_as::<_, Testimonial>(&format!(
        r#"
        UPDATE testimonials
        SET name = ?2, role = ?3, content = ?4, rating = ?5, sort_order = ?6,
            active = ?7, updated_at = ?8
        WHERE id = ?1
        RETURNING {}
        "#,
        TABLE.columns
    ))
    .bind(t.id)
    .bind(&t.name)
    .bind(&t.role)
    .bind(&t.content)
    .bind(t.rating)
    .bind(t.order)
    .bind(t.active)
    .bind(now_utc())
    .fetch_one(db)
    .await
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/testimonials", get(public_list))
        .route(
            "/admin/testimonials",
            get(admin_list).post(create).put(update).delete(remove),
        )
}

#[instrument(skip(state))]
pub async fn public_list(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Testimonial>>>, AppError> {
    Ok(ApiResponse::data(TABLE.list(&state.db, true).await?))
}

#[instrument(skip(state, _admin))]
pub async fn admin_list(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<ApiResponse<Vec<Testimonial>>>, AppError> {
    Ok(ApiResponse::data(TABLE.list(&state.db, false).await?))
}

#[instrument(skip(state, _admin, payload))]
pub async fn create(
    State(state): State<AppState>,
    _admin: AdminUser,
    AppJson(payload): AppJson<TestimonialRequest>,
) -> Result<Json<ApiResponse<Testimonial>>, AppError> {
    let row = insert(&state.db, &payload.into_new()?).await?;
    info!(id = %row.id, "testimonial created");
    Ok(ApiResponse::data(row))
}

#[instrument(skip(state, _admin, payload))]
pub async fn update(
    State(state): State<AppState>,
    _admin: AdminUser,
    AppJson(payload): AppJson<TestimonialRequest>,
) -> Result<Json<ApiResponse<Testimonial>>, AppError> {
    let id = payload.id.ok_or_else(|| AppError::validation("ID is required"))?;
    let existing: Testimonial = TABLE
        .find(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("Testimonial not found"))?;
    let row = save(&state.db, &payload.apply(existing)?).await?;
    Ok(ApiResponse::data(row))
}

#[instrument(skip(state, _admin))]
pub async fn remove(
    State(state): State<AppState>,
    _admin: AdminUser,
    AppQuery(param): AppQuery<IdParam>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let id = param.require()?;
    if !TABLE.delete(&state.db, id).await? {
        return Err(AppError::not_found("Testimonial not found"));
    }
    Ok(ApiResponse::message("Testimonial deleted"))
}
