use axum::Json;
use tracing::{info, instrument};

use crate::{auth::CurrentUser, envelope::ApiResponse};

pub const AVATAR_UPLOAD_PENDING: &str = "avatar upload is not available yet";

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn upload_avatar(CurrentUser(user): CurrentUser) -> Json<ApiResponse<()>> {
    info!("avatar upload requested");
    Json(ApiResponse::message(AVATAR_UPLOAD_PENDING))
}
