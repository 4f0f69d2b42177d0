use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{
    auth::CurrentUser,
    envelope::ApiResponse,
    error::{internal, AppError},
    state::AppState,
    users::{Theme, UserSettings},
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SettingsView {
    pub show_lunar: bool,
    pub push_enabled: bool,
    pub theme: Theme,
}

impl Default for SettingsView {
    fn default() -> Self {
        Self {
            show_lunar: false,
            push_enabled: true,
            theme: Theme::System,
        }
    }
}

impl From<UserSettings> for SettingsView {
    fn from(s: UserSettings) -> Self {
        Self {
            show_lunar: s.show_lunar,
            push_enabled: s.push_enabled,
            theme: s.theme,
        }
    }
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn get_settings(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<ApiResponse<SettingsView>>, AppError> {
    let settings = state
        .users
        .find_settings(user.id)
        .await
        .map_err(internal("failed to load settings"))?
        .map(SettingsView::from)
        .unwrap_or_default();
    Ok(Json(ApiResponse::ok(settings)))
}
