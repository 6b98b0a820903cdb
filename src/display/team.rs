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
    response::{non_blank, trimmed, ApiResponse, AppJson, AppQuery, IdParam},
    state::AppState,
};

pub const TABLE: DisplayTable = DisplayTable {
    table: "team_members",
    columns: "id, name, role, description, education, image_url, sort_order, active, created_at, updated_at",
};

const DEFAULT_DESCRIPTION: &str = "Pengurus Yayasan";
const DEFAULT_EDUCATION: &str = "-";

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    pub id: Uuid,
    pub name: String,
    pub role: String,
    pub description: String,
    pub education: String,
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
pub struct TeamMemberRequest {
    pub id: Option<Uuid>,
    pub name: Option<String>,
    pub role: Option<String>,
    pub description: Option<String>,
    pub education: Option<String>,
    pub image_url: Option<String>,
    pub order: Option<i64>,
    pub active: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct NewTeamMember {
    pub name: String,
    pub role: String,
    pub description: String,
    pub education: String,
    pub image_url: Option<String>,
    pub order: i64,
    pub active: bool,
}

impl TryFrom<TeamMemberRequest> for NewTeamMember {
    type Error = AppError;

    fn try_from(req: TeamMemberRequest) -> Result<Self, Self::Error> {
        let (Some(name), Some(role), Some(description), Some(education)) = (
            non_blank(req.name),
            non_blank(req.role),
            non_blank(req.description),
            non_blank(req.education),
        ) else {
            return Err(AppError::validation("Missing required fields"));
        };
        Ok(Self {
            name,
            role,
            description,
            education,
            image_url: non_blank(req.image_url),
            order: req.order.unwrap_or(0),
            active: req.active.unwrap_or(true),
        })
    }
}

impl TeamMemberRequest {
    fn apply(self, mut m: TeamMember) -> TeamMember {
        if let Some(v) = non_blank(self.name) {
            m.name = v;
        }
        if let Some(v) = non_blank(self.role) {
            m.role = v;
        }
        if let Some(v) = non_blank(self.description) {
            m.description = v;
        }
        if let Some(v) = non_blank(self.education) {
            m.education = v;
        }
        if let Some(v) = self.image_url {
            m.image_url = non_blank(Some(v));
        }
        if let Some(v) = self.order {
            m.order = v;
        }
        if let Some(v) = self.active {
            m.active = v;
        }
        m
    }
}

/// One row of a bulk import; only `name` and `role` are required.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkMember {
    pub name: Option<String>,
    pub role: Option<String>,
    pub description: Option<String>,
    pub education: Option<String>,
    pub image_url: Option<String>,
    pub order: Option<i64>,
    pub active: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkImportRequest {
    pub members: Option<Vec<BulkMember>>,
    #[serde(default)]
    pub replace_all: bool,
}

#[derive(Debug, Serialize)]
pub struct BulkImportResult {
    pub count: usize,
}

fn bulk_rows(members: Vec<BulkMember>) -> Result<Vec<NewTeamMember>, AppError> {
    members
        .into_iter()
        .enumerate()
        .map(|(idx, m)| {
            let (Some(name), Some(role)) = (trimmed(m.name), trimmed(m.role)) else {
                return Err(AppError::validation(format!(
                    "members[{idx}] requires name and role"
                )));
            };
            Ok(NewTeamMember {
                name,
                role,
                description: non_blank(m.description)
                    .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
                education: non_blank(m.education).unwrap_or_else(|| DEFAULT_EDUCATION.to_string()),
                image_url: non_blank(m.image_url),
                order: m.order.unwrap_or(idx as i64),
                active: m.active.unwrap_or(true),
            })
        })
        .collect()
}

async fn insert<'e, E>(executor: E, new: &NewTeamMember) -> Result<TeamMember, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    sqlx::query_as::<_, TeamMember>(&format!(
        r#"
        INSERT INTO team_members
            (id, name, role, description, education, image_url, sort_order, active, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
        RETURNING {}
        "#,
        TABLE.columns
    ))
    .bind(Uuid::new_v4())
    .bind(&new.name)
    .bind(&new.role)
    .bind(&new.description)
    .bind(&new.education)
    .bind(&new.image_url)
    .bind(new.order)
    .bind(new.active)
    .bind(now_utc())
    .fetch_one(executor)
    .await
}

async fn save(db: &SqlitePool, m: &TeamMember) -> Result<TeamMember, sqlx::Error> {
    sqlx::query_as::<_, TeamMember>(&format!(
        r#"
        UPDATE team_members
        SET name = ?2, role = ?3, description = ?4, education = ?5, image_url = ?6,
            sort_order = ?7, active = ?8, updated_at = ?9
        WHERE id = ?1
        RETURNING {}
        "#,
        TABLE.columns
    ))
    .bind(m.id)
    .bind(&m.name)
    .bind(&m.role)
    .bind(&m.description)
    .bind(&m.education)
    .bind(&m.image_url)
    .bind(m.order)
    .bind(m.active)
    .bind(now_utc())
    .fetch_one(db)
    .await
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/team", get(public_list)).route(
        "/admin/team",
        get(admin_list)
            .post(create)
            .put(update)
            .delete(remove)
            .patch(bulk_import),
    )
}

#[instrument(skip(state))]
pub async fn public_list(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<TeamMember>>>, AppError> {
    Ok(ApiResponse::data(TABLE.list(&state.db, true).await?))
}

#[instrument(skip(state, _admin))]
pub async fn admin_list(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<ApiResponse<Vec<TeamMember>>>, AppError> {
    Ok(ApiResponse::data(TABLE.list(&state.db, false).await?))
}

#[instrument(skip(state, _admin, payload))]
pub async fn create(
    State(state): State<AppState>,
    _admin: AdminUser,
    AppJson(payload): AppJson<TeamMemberRequest>,
) -> Result<Json<ApiResponse<TeamMember>>, AppError> {
    let new = NewTeamMember::try_from(payload)?;
    let member = insert(&state.db, &new).await?;
    info!(id = %member.id, "team member created");
    Ok(ApiResponse::data(member))
}

#[instrument(skip(state, _admin, payload))]
pub async fn update(
    State(state): State<AppState>,
    _admin: AdminUser,
    AppJson(payload): AppJson<TeamMemberRequest>,
) -> Result<Json<ApiResponse<TeamMember>>, AppError> {
    let id = payload.id.ok_or_else(|| AppError::validation("ID is required"))?;
    let existing: TeamMember = TABLE
        .find(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("Team member not found"))?;
    let member = save(&state.db, &payload.apply(existing)).await?;
    Ok(ApiResponse::data(member))
}

#[instrument(skip(state, _admin))]
pub async fn remove(
    State(state): State<AppState>,
    _admin: AdminUser,
    AppQuery(param): AppQuery<IdParam>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let id = param.require()?;
    if !TABLE.delete(&state.db, id).await? {
        return Err(AppError::not_found("Team member not found"));
    }
    Ok(ApiResponse::message("Team member deleted"))
}

/// Inserts many members in one transaction, optionally replacing all rows.
#[instrument(skip(state, _admin, payload))]
pub async fn bulk_import(
    State(state): State<AppState>,
    _admin: AdminUser,
    AppJson(payload): AppJson<BulkImportRequest>,
) -> Result<Json<ApiResponse<BulkImportResult>>, AppError> {
    let members = payload
        .members
        .filter(|m| !m.is_empty())
        .ok_or_else(|| AppError::validation("members array is required"))?;
    let rows = bulk_rows(members)?;

    let mut tx = state.db.begin().await?;
    if payload.replace_all {
        sqlx::query("DELETE FROM team_members").execute(&mut *tx).await?;
    }
    for row in &rows {
        insert(&mut *tx, row).await?;
    }
    tx.commit().await?;

    info!(count = rows.len(), replace_all = payload.replace_all, "team imported");
    Ok(ApiResponse::data(BulkImportResult { count: rows.len() }))
}

#[cfg(test)]
mod tests {
    use axum::http::{header, StatusCode};
    use serde_json::{json, Value};
    use sqlx::SqlitePool;

    use crate::test_support::{admin_cookie, test_app};

    fn names(body: &Value) -> Vec<String> {
        body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["name"].as_str().unwrap().to_string())
            .collect()
    }

    #[sqlx::test]
    async fn order_and_active_drive_listings(db: SqlitePool) {
        let app = test_app(db.clone()).await;
        let cookie = admin_cookie(&db).await;

        let mut ids = Vec::new();
        for (name, order) in [("Ani", 2), ("Bayu", 1), ("Cici", 3)] {
            let res = app
                .server
                .post("/api/admin/team")
                .add_header(header::COOKIE, cookie.clone())
                .json(&json!({
                    "name": name,
                    "role": "Advokat",
                    "description": "Pendamping hukum",
                    "education": "S.H.",
                    "order": order
                }))
                .await;
            res.assert_status(StatusCode::OK);
            ids.push(res.json::<Value>()["data"]["id"].clone());
        }

        let public = app.server.get("/api/team").await.json::<Value>();
        assert_eq!(names(&public), vec!["Bayu", "Ani", "Cici"]);

        // move Cici to the front and hide Ani
        app.server
            .put("/api/admin/team")
            .add_header(header::COOKIE, cookie.clone())
            .json(&json!({ "id": ids[2], "order": 0 }))
            .await
            .assert_status(StatusCode::OK);
        app.server
            .put("/api/admin/team")
            .add_header(header::COOKIE, cookie.clone())
            .json(&json!({ "id": ids[0], "active": false }))
            .await
            .assert_status(StatusCode::OK);

        let public = app.server.get("/api/team").await.json::<Value>();
        assert_eq!(names(&public), vec!["Cici", "Bayu"]);

        let admin = app
            .server
            .get("/api/admin/team")
            .add_header(header::COOKIE, cookie)
            .await
            .json::<Value>();
        assert_eq!(names(&admin), vec!["Cici", "Bayu", "Ani"]);
        assert_eq!(admin["data"][2]["active"], false);
        assert_eq!(admin["data"][0]["order"], 0);
    }

    #[sqlx::test]
    async fn create_requires_fields(db: SqlitePool) {
        let app = test_app(db.clone()).await;
        let cookie = admin_cookie(&db).await;

        let res = app
            .server
            .post("/api/admin/team")
            .add_header(header::COOKIE, cookie)
            .json(&json!({ "name": "Dedi" }))
            .await;
        res.assert_status(StatusCode::BAD_REQUEST);
    }

    #[sqlx::test]
    async fn bulk_import_replaces_and_defaults(db: SqlitePool) {
        let app = test_app(db.clone()).await;
        let cookie = admin_cookie(&db).await;

        app.server
            .post("/api/admin/team")
            .add_header(header::COOKIE, cookie.clone())
            .json(&json!({ "name": "Lama", "role": "Ketua", "description": "d", "education": "e" }))
            .await
            .assert_status(StatusCode::OK);

        let res = app
            .server
            .patch("/api/admin/team")
            .add_header(header::COOKIE, cookie.clone())
            .json(&json!({
                "replaceAll": true,
                "members": [
                    { "name": "Pembina", "role": "Pembina" },
                    { "name": "Ketua", "role": "Ketua", "education": "M.H." }
                ]
            }))
            .await;
        res.assert_status(StatusCode::OK);
        assert_eq!(res.json::<Value>()["data"]["count"], 2);

        let admin = app
            .server
            .get("/api/admin/team")
            .add_header(header::COOKIE, cookie.clone())
            .await
            .json::<Value>();
        assert_eq!(names(&admin), vec!["Pembina", "Ketua"]);
        assert_eq!(admin["data"][0]["description"], "Pengurus Yayasan");
        assert_eq!(admin["data"][0]["education"], "-");
        assert_eq!(admin["data"][1]["order"], 1);

        app.server
            .patch("/api/admin/team")
            .add_header(header::COOKIE, cookie)
            .json(&json!({ "members": [] }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }
}
