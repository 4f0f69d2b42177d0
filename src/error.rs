use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::envelope::ApiResponse;

/// Request-level failure. The `String` is the exact text sent to the client,
/// so nothing implementation-specific may end up in it.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation: {0}")]
    Validation(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn public_message(self) -> String {
        match self {
            AppError::Validation(m)
            | AppError::Conflict(m)
            | AppError::Unauthorized(m)
            | AppError::Internal(m) => m,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(ApiResponse::error(self.public_message()))).into_response()
    }
}

/// Logs the cause and replaces it with a generic client-facing message.
pub fn internal<E>(public: &'static str) -> impl FnOnce(E) -> AppError
where
    E: Into<anyhow::Error>,
{
    move |e| {
        let e: anyhow::Error = e.into();
        tracing::error!(error = ?e, "{public}");
        AppError::Internal(public.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn renders_envelope_with_status() {
        let res = AppError::Conflict("email already registered".into()).into_response();
        assert_eq!(res.status(), StatusCode::CONFLICT);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "email already registered");
    }

    #[test]
    fn internal_hides_the_cause() {
        let err = internal::<anyhow::Error>("login failed")(anyhow::anyhow!("pool timed out"));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message(), "login failed");
    }
}
