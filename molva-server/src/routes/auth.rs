use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use molva_shared::errors::{AppError, AppResult, ErrorCode};
use molva_shared::types::auth::PublicUser;
use molva_shared::types::ApiResponse;

use crate::services::{auth_service, message_service, user_service};
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    pub username: String,
    #[validate(email(message = "invalid email format"))]
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SessionTokenRequest {
    pub session_token: String,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub logged_out: bool,
}

#[derive(Debug, Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<PublicUser>,
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> AppResult<Json<ApiResponse<auth_service::LoginSuccess>>> {
    if req.username.trim().is_empty() || req.email.trim().is_empty() || req.password.is_empty() {
        return Err(AppError::new(
            ErrorCode::ValidationError,
            "username, email and password required",
        ));
    }
    req.validate()
        .map_err(|e| AppError::new(ErrorCode::ValidationError, e.to_string()))?;
    if req.password.len() < 6 {
        return Err(AppError::new(
            ErrorCode::PasswordTooShort,
            "password must be at least 6 characters",
        ));
    }

    if user_service::get_user_by_username(&state.db, &req.username)?.is_some() {
        return Err(AppError::new(ErrorCode::UsernameTaken, "username already exists"));
    }
    if user_service::get_user_by_email(&state.db, &req.email)?.is_some() {
        return Err(AppError::new(ErrorCode::EmailTaken, "email already exists"));
    }

    let user_id = user_service::create_user(&state.db, &req.username, &req.email, &req.password, None)?;
    message_service::seed_default_avatar(&state, user_id)?;

    let login = auth_service::login(&state, &req.username, &req.password)?;

    Ok(Json(ApiResponse::ok_with_message(login, "registration successful")))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<auth_service::LoginSuccess>>> {
    if req.username.trim().is_empty() || req.password.is_empty() {
        return Err(AppError::new(
            ErrorCode::ValidationError,
            "username and password required",
        ));
    }

    let login = auth_service::login(&state, &req.username, &req.password)?;
    Ok(Json(ApiResponse::ok(login)))
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SessionTokenRequest>,
) -> AppResult<Json<ApiResponse<LogoutResponse>>> {
    if req.session_token.is_empty() {
        return Err(AppError::new(ErrorCode::ValidationError, "session token required"));
    }

    let logged_out = auth_service::logout(&state, &req.session_token)?;
    Ok(Json(ApiResponse::ok(LogoutResponse { logged_out })))
}

pub async fn validate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SessionTokenRequest>,
) -> AppResult<Json<ApiResponse<ValidateResponse>>> {
    if req.session_token.is_empty() {
        return Err(AppError::new(ErrorCode::ValidationError, "session token required"));
    }

    let user = auth_service::validate_session(&state, &req.session_token)?;
    Ok(Json(ApiResponse::ok(ValidateResponse {
        valid: user.is_some(),
        user,
    })))
}
