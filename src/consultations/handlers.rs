use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::extractors::AdminUser,
    consultations::{
        dto::{ConsultationStatus, Konsultasi, KonsultasiRequest, ListQuery, SubmittedKonsultasi, UpdateKonsultasiRequest},
        repo,
        services::{apply_update, validate_new},
    },
    error::AppError,
    response::{parse_limit, trimmed, ApiResponse, AppJson, AppQuery, IdParam},
    state::AppState,
};

pub fn public_routes() -> Router<AppState> {
    Router::new().route("/konsultasi", post(submit))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new().route(
        "/admin/consultations",
        get(list).post(create).put(update).delete(remove),
    )
}

/// Public contact form.
#[instrument(skip(state, payload))]
pub async fn submit(
    State(state): State<AppState>,
    AppJson(payload): AppJson<KonsultasiRequest>,
) -> Result<Json<ApiResponse<SubmittedKonsultasi>>, AppError> {
    // visitors cannot pick a status or attach internal notes
    let lead = validate_new(KonsultasiRequest {
        status: None,
        notes: None,
        ..payload
    })
    .inspect_err(|e| warn!(error = %e, "consultation rejected"))?;

    let row = repo::insert(&state.db, &lead).await?;
    info!(id = %row.id, jenis = %row.jenis_permasalahan, "consultation submitted");

    Ok(ApiResponse::with_message(
        SubmittedKonsultasi {
            id: row.id,
            created_at: row.created_at,
        },
        "Permintaan konsultasi berhasil dikirim",
    ))
}

#[instrument(skip(state, _admin))]
pub async fn list(
    State(state): State<AppState>,
    _admin: AdminUser,
    AppQuery(q): AppQuery<ListQuery>,
) -> Result<Json<ApiResponse<Vec<Konsultasi>>>, AppError> {
    // an empty `?status=` means no filter
    let status = trimmed(q.status)
        .map(|s| {
            s.parse::<ConsultationStatus>()
                .map_err(|_| AppError::validation("Status tidak valid"))
        })
        .transpose()?;
    let rows = repo::list(&state.db, status, parse_limit(q.limit.as_deref(), 10)).await?;
    Ok(ApiResponse::data(rows))
}

#[instrument(skip(state, _admin, payload))]
pub async fn create(
    State(state): State<AppState>,
    _admin: AdminUser,
    AppJson(payload): AppJson<KonsultasiRequest>,
) -> Result<Json<ApiResponse<Konsultasi>>, AppError> {
    let lead = validate_new(payload)?;
    let row = repo::insert(&state.db, &lead).await?;
    Ok(ApiResponse::data(row))
}

#[instrument(skip(state, _admin, payload))]
pub async fn update(
    State(state): State<AppState>,
    _admin: AdminUser,
    AppJson(payload): AppJson<UpdateKonsultasiRequest>,
) -> Result<Json<ApiResponse<Konsultasi>>, AppError> {
    let id = payload.id.ok_or_else(|| AppError::validation("ID is required"))?;
    let existing = repo::find(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("Consultation not found"))?;

    let row = repo::save(&state.db, &apply_update(existing, payload)?).await?;
    info!(%id, status = ?row.status, "consultation updated");
    Ok(ApiResponse::data(row))
}

#[instrument(skip(state, _admin))]
pub async fn remove(
    State(state): State<AppState>,
    _admin: AdminUser,
    AppQuery(param): AppQuery<IdParam>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let id = param.require()?;
    if !repo::delete(&state.db, id).await? {
        return Err(AppError::not_found("Consultation not found"));
    }
    Ok(ApiResponse::message("Consultation deleted successfully"))
}
