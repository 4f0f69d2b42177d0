use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::{present, AuthPayload, LoginRequest, RegisterRequest},
        password::{hash_password, verify_password},
    },
    envelope::ApiResponse,
    error::{internal, AppError},
    state::AppState,
    users::{CreateUserError, NewUser},
    validation::{is_valid_email, is_valid_password, is_valid_username},
};

pub const REGISTER_MISSING: &str = "email, username and password are required";
pub const INVALID_EMAIL: &str = "invalid email format";
pub const INVALID_USERNAME: &str =
    "invalid username (2-20 characters: letters, digits, underscore or CJK)";
pub const INVALID_PASSWORD: &str = "password must be at least 6 characters";
pub const EMAIL_TAKEN: &str = "email already registered";
pub const USERNAME_TAKEN: &str = "username already taken";
pub const REGISTER_FAILED: &str = "registration failed";

pub const LOGIN_MISSING: &str = "email and password are required";
/// Shared by unknown email and wrong password.
pub const INVALID_CREDENTIALS: &str = "invalid email or password";
pub const LOGIN_FAILED: &str = "login failed";

pub const INVALID_BODY: &str = "invalid request body";

type AuthResult = Result<(StatusCode, Json<ApiResponse<AuthPayload>>), AppError>;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
}

fn reject_body(rejection: JsonRejection) -> AppError {
    warn!(error = %rejection, "unreadable request body");
    AppError::Validation(INVALID_BODY.into())
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> AuthResult {
    let Json(payload) = payload.map_err(reject_body)?;

    let (Some(email), Some(username), Some(password)) = (
        present(payload.email.map(|e| e.trim().to_string())),
        present(payload.username),
        present(payload.password),
    ) else {
        warn!("register with missing fields");
        return Err(AppError::Validation(REGISTER_MISSING.into()));
    };

    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(AppError::Validation(INVALID_EMAIL.into()));
    }
    if !is_valid_username(&username) {
        warn!(username = %username, "invalid username");
        return Err(AppError::Validation(INVALID_USERNAME.into()));
    }
    if !is_valid_password(&password) {
        warn!("password too short");
        return Err(AppError::Validation(INVALID_PASSWORD.into()));
    }

    let password_hash = hash_password(password)
        .await
        .map_err(internal(REGISTER_FAILED))?;

    let new_user = NewUser {
        id: Uuid::new_v4(),
        email,
        username,
        password_hash,
    };

    let user = match state.users.create(new_user).await {
        Ok(u) => u,
        Err(CreateUserError::EmailTaken) => {
            warn!("email already registered");
            return Err(AppError::Conflict(EMAIL_TAKEN.into()));
        }
        Err(CreateUserError::UsernameTaken) => {
            warn!("username already taken");
            return Err(AppError::Conflict(USERNAME_TAKEN.into()));
        }
        Err(CreateUserError::Other(e)) => return Err(internal(REGISTER_FAILED)(e)),
    };

    let token = state.tokens.issue(&user).map_err(internal(REGISTER_FAILED))?;

    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(AuthPayload { user, token }).with_message("registration successful")),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> AuthResult {
    let Json(payload) = payload.map_err(reject_body)?;

    let (Some(email), Some(password)) = (
        present(payload.email.map(|e| e.trim().to_string())),
        present(payload.password),
    ) else {
        warn!("login with missing fields");
        return Err(AppError::Validation(LOGIN_MISSING.into()));
    };

    let record = match state.users.find_by_email(&email).await {
        Ok(Some(r)) => r,
        Ok(None) => {
            warn!("login unknown email");
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
        }
        Err(e) => return Err(internal(LOGIN_FAILED)(e)),
    };

    let ok = verify_password(password, record.password_hash.clone())
        .await
        .map_err(internal(LOGIN_FAILED))?;
    if !ok {
        warn!(user_id = %record.id, "login invalid password");
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
    }

    let user = record.into_public();
    let token = state.tokens.issue(&user).map_err(internal(LOGIN_FAILED))?;

    info!(user_id = %user.id, "user logged in");
    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok(AuthPayload { user, token }).with_message("login successful")),
    ))
}
