use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::{
    analytics::{
        repo::{self, NewEvent},
        services::{self, export_file_name, render_csv, AnalyticsReport, Period},
    },
    articles::repo as articles_repo,
    auth::extractors::AdminUser,
    consultations::{dto::ConsultationStatus, repo as consultations_repo},
    db::now_utc,
    display::team,
    error::AppError,
    response::{trimmed, ApiResponse, AppQuery},
    state::AppState,
};

pub fn analytics_routes() -> Router<AppState> {
    Router::new()
        .route("/analytics/track", post(track))
        .route("/admin/analytics", get(report))
        .route("/admin/analytics/export", get(export))
        .route("/admin/stats", get(stats))
}

#[derive(Debug, Default, Deserialize)]
pub struct TrackBody {
    pub path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TrackQuery {
    pub path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PeriodQuery {
    pub days: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub articles: i64,
    pub consultations: i64,
    pub pending_consultations: i64,
    pub team_members: i64,
}

fn header_text(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .filter(|v| !v.is_empty())
}

/// Records a page view. The body is optional and may be any JSON; a missing
/// path falls back to `?path=` and then `/`.
#[instrument(skip(state, headers, body))]
pub async fn track(
    State(state): State<AppState>,
    AppQuery(q): AppQuery<TrackQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let from_body = serde_json::from_slice::<TrackBody>(&body)
        .unwrap_or_default()
        .path;
    let path = trimmed(from_body)
        .or_else(|| trimmed(q.path))
        .unwrap_or_else(|| "/".to_string());

    let event = NewEvent {
        path,
        referrer: header_text(&headers, header::REFERER),
        user_agent: header_text(&headers, header::USER_AGENT),
    };
    let id = repo::insert(&state.db, &event, now_utc()).await?;
    debug!(id, path = %event.path, "page view");
    Ok(ApiResponse::ok())
}

#[instrument(skip(state, _admin))]
pub async fn report(
    State(state): State<AppState>,
    _admin: AdminUser,
    AppQuery(q): AppQuery<PeriodQuery>,
) -> Result<Json<ApiResponse<AnalyticsReport>>, AppError> {
    let period = Period::from_days(q.days.as_deref(), now_utc());
    Ok(ApiResponse::data(
        services::dashboard_report(&state.db, period).await?,
    ))
}

#[instrument(skip(state, _admin))]
pub async fn export(
    State(state): State<AppState>,
    _admin: AdminUser,
    AppQuery(q): AppQuery<PeriodQuery>,
) -> Result<impl IntoResponse, AppError> {
    let now = now_utc();
    let period = Period::from_days(q.days.as_deref(), now);
    let report = services::full_report(&state.db, period).await?;

    let disposition = format!("attachment; filename=\"{}\"", export_file_name(now));
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        render_csv(&report, now),
    ))
}

#[instrument(skip(state, _admin))]
pub async fn stats(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<ApiResponse<DashboardStats>>, AppError> {
    let (articles, consultations, pending_consultations, team_members) = tokio::try_join!(
        articles_repo::count_published(&state.db),
        consultations_repo::count(&state.db, None),
        consultations_repo::count(&state.db, Some(ConsultationStatus::Pending)),
        team::TABLE.count_active(&state.db),
    )?;
    Ok(ApiResponse::data(DashboardStats {
        articles,
        consultations,
        pending_consultations,
        team_members,
    }))
}
