use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{auth::CurrentUser, envelope::ApiResponse};

/// Reminder subscription as the client renders it. The list endpoint is a
/// placeholder and always returns an empty collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: uuid::Uuid,
    pub user_id: uuid::Uuid,
    pub title: String,
    pub reminder_time: String,
    pub is_enabled: bool,
    pub push_channel: String,
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn list_subscriptions(
    CurrentUser(user): CurrentUser,
) -> Json<ApiResponse<Vec<Subscription>>> {
    Json(ApiResponse::ok(Vec::new()))
}
