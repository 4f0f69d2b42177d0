use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::{
    error::{internal, AppError},
    state::AppState,
    users::User,
};

pub const NO_TOKEN: &str = "no token provided";
pub const MALFORMED_TOKEN: &str = "malformed token";
pub const INVALID_TOKEN: &str = "invalid or expired token";
pub const USER_NOT_FOUND: &str = "user not found";

/// The user resolved by [`require_auth`] for the current request.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Pulls the bearer token out of the `Authorization` header.
fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let header = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized(NO_TOKEN.into()))?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized(NO_TOKEN.into()))?
        .trim();

    if token.is_empty() || token.contains(char::is_whitespace) {
        return Err(AppError::Unauthorized(MALFORMED_TOKEN.into()));
    }
    Ok(token)
}

/// Verifies the bearer token and loads the user it names. One attempt, no caching.
pub async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<User, AppError> {
    let token = bearer_token(headers).inspect_err(|e| warn!(reason = %e, "rejected request"))?;

    let claims = state.tokens.verify(token).map_err(|e| {
        warn!(error = %e, "invalid or expired token");
        AppError::Unauthorized(INVALID_TOKEN.into())
    })?;

    match state.users.find_by_id(claims.user_id).await {
        Ok(Some(user)) => Ok(user),
        Ok(None) => {
            warn!(user_id = %claims.user_id, "token for unknown user");
            Err(AppError::Unauthorized(USER_NOT_FOUND.into()))
        }
        Err(e) => Err(internal("authentication failed")(e)),
    }
}

/// Middleware guarding protected routes; stores [`CurrentUser`] in the request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = authenticate(&state, request.headers()).await?;
    request.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(request).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized(NO_TOKEN.into()))
    }
}
