use serde::{Deserialize, Serialize};

use crate::users::User;

/// Request body for user registration. Fields are optional so a missing
/// field is reported by the handler rather than by the JSON extractor.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Request body for login.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Payload returned after login or register.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthPayload {
    pub user: User,
    pub token: String,
}

/// Treats absent and empty strings alike.
pub(crate) fn present(field: Option<String>) -> Option<String> {
    field.filter(|s| !s.is_empty())
}
