//! Image uploads for admin forms and the Google Drive image redirect.

use crate::state::AppState;
use axum::Router;

pub mod handlers;
pub mod services;

pub fn router() -> Router<AppState> {
    handlers::upload_routes()
}
