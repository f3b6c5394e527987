use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use molva_shared::errors::{AppError, AppResult, ErrorCode};
use molva_shared::types::auth::UserRole;
use molva_shared::types::pagination::{PageParams, ACTIVITY_PAGE_LIMIT};
use molva_shared::types::ApiResponse;

use crate::middleware::AdminUser;
use crate::models::{ActivityLogEntry, User};
use crate::services::{activity_service, user_service};
use crate::AppState;

// --- Request / Response types ---

#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    pub username: String,
    #[validate(email(message = "invalid email format"))]
    pub email: String,
    pub password: String,
    pub role: Option<UserRole>,
}

#[derive(Debug, Deserialize)]
pub struct SetActiveRequest {
    pub is_active: bool,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct CreatedUserResponse {
    pub user_id: i64,
}

#[derive(Debug, Serialize)]
pub struct UpdatedResponse {
    pub updated: bool,
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub deleted: bool,
}

// --- Handlers (all admin-only) ---

/// GET /api/users - every account, newest first
pub async fn list_users(
    _admin: AdminUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<User>>>> {
    let users = user_service::list_users(&state.db)?;
    Ok(Json(ApiResponse::ok(users)))
}

/// POST /api/users - create an account, optionally with a role
pub async fn create_user(
    _admin: AdminUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateUserRequest>,
) -> AppResult<Json<ApiResponse<CreatedUserResponse>>> {
    if req.username.trim().is_empty() || req.email.trim().is_empty() || req.password.is_empty() {
        return Err(AppError::new(
            ErrorCode::ValidationError,
            "username, email and password required",
        ));
    }
    req.validate()
        .map_err(|e| AppError::new(ErrorCode::ValidationError, e.to_string()))?;

    if user_service::get_user_by_username(&state.db, &req.username)?.is_some() {
        return Err(AppError::new(ErrorCode::UsernameTaken, "username already exists"));
    }
    if user_service::get_user_by_email(&state.db, &req.email)?.is_some() {
        return Err(AppError::new(ErrorCode::EmailTaken, "email already exists"));
    }

    let user_id =
        user_service::create_user(&state.db, &req.username, &req.email, &req.password, req.role)?;

    Ok(Json(ApiResponse::ok(CreatedUserResponse { user_id })))
}

/// PATCH /api/users/:id - flip the active flag
pub async fn set_active(
    _admin: AdminUser,
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
    Json(req): Json<SetActiveRequest>,
) -> AppResult<Json<ApiResponse<UpdatedResponse>>> {
    let updated = if req.is_active {
        user_service::activate_user(&state.db, user_id)?
    } else {
        user_service::deactivate_user(&state.db, user_id)?
    };

    Ok(Json(ApiResponse::ok(UpdatedResponse { updated })))
}

/// PATCH /api/users/:id/password
pub async fn change_password(
    _admin: AdminUser,
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
    Json(req): Json<ChangePasswordRequest>,
) -> AppResult<Json<ApiResponse<UpdatedResponse>>> {
    if req.password.is_empty() {
        return Err(AppError::new(ErrorCode::ValidationError, "password required"));
    }
    if req.password.len() < 6 {
        return Err(AppError::new(
            ErrorCode::PasswordTooShort,
            "password must be at least 6 characters",
        ));
    }

    let updated = user_service::change_password(&state.db, user_id, &req.password)?;
    Ok(Json(ApiResponse::ok(UpdatedResponse { updated })))
}

/// DELETE /api/users/:id - hard delete
pub async fn delete_user(
    _admin: AdminUser,
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> AppResult<Json<ApiResponse<DeletedResponse>>> {
    let deleted = user_service::delete_user(&state.db, user_id)?;
    Ok(Json(ApiResponse::ok(DeletedResponse { deleted })))
}

/// GET /api/users/:id/activity - one user's audit trail, newest first
pub async fn user_activity(
    _admin: AdminUser,
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
    Query(params): Query<PageParams>,
) -> AppResult<Json<ApiResponse<Vec<ActivityLogEntry>>>> {
    let (limit, offset) = params.clamp(ACTIVITY_PAGE_LIMIT);
    let entries = activity_service::user_activity(&state.db, user_id, limit, offset)?;
    Ok(Json(ApiResponse::ok(entries)))
}

/// GET /api/users/activity/system - system-level entries (no owning user)
pub async fn system_activity(
    _admin: AdminUser,
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageParams>,
) -> AppResult<Json<ApiResponse<Vec<ActivityLogEntry>>>> {
    let (limit, offset) = params.clamp(ACTIVITY_PAGE_LIMIT);
    let entries = activity_service::system_activity(&state.db, limit, offset)?;
    Ok(Json(ApiResponse::ok(entries)))
}
