//! Ordered, independently toggleable content shown on the public site: team
//! members, testimonials, services and hero slides.
//!
//! Admin lists return every row; public feeds return active rows only. Both
//! are sorted by `order` ascending.

use crate::state::AppState;
use axum::Router;

pub mod repo;
pub mod service_items;
pub mod slides;
pub mod team;
pub mod testimonials;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(team::routes())
        .merge(testimonials::routes())
        .merge(service_items::routes())
        .merge(slides::routes())
}
