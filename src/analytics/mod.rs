//! Page-view tracking, traffic/SEO reports and the dashboard counters.

use crate::state::AppState;
use axum::Router;

pub mod handlers;
pub mod repo;
pub mod services;

pub fn router() -> Router<AppState> {
    handlers::analytics_routes()
}
