//! Snapshots of the SQLite database file, restore and full reset.
//!
//! Only available when the configured database lives in a local file.
//! A restore running alongside other requests is not serialized against
//! them; rows written mid-restore may be lost.

use crate::state::AppState;
use axum::Router;

pub mod handlers;
pub mod services;

pub fn router() -> Router<AppState> {
    handlers::backup_routes()
}
