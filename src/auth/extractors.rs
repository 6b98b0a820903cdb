use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use super::services::{session_token, validate_session};
use crate::error::AppError;
use crate::state::AppState;

/// Admin resolved from the `admin_session` cookie. Rejects with 401.
#[derive(Debug, Clone)]
pub struct AdminUser {
    pub user_id: Uuid,
    pub username: String,
    pub name: Option<String>,
    pub email: Option<String>,
}

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers).ok_or(AppError::Unauthenticated)?;

        let admin = validate_session(&state.db, &token)
            .await?
            .ok_or(AppError::Unauthenticated)?;

        Ok(AdminUser {
            user_id: admin.user_id,
            username: admin.username,
            name: admin.name,
            email: admin.email,
        })
    }
}
