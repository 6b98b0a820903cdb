use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request body for login. Fields are optional so that missing values get the
/// same error as empty ones.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
    pub confirm_password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub user_id: Uuid,
    pub username: String,
    pub name: Option<String>,
    pub email: Option<String>,
}

pub const MIN_PASSWORD_LEN: usize = 6;
