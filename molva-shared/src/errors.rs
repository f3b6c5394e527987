use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use diesel::result::DatabaseErrorKind;
use serde::{Deserialize, Serialize};

use crate::types::ApiErrorResponse;

/// Application error codes following the pattern E{area}{sequence}
///
/// Ranges:
/// - E0xxx: Shared/infrastructure errors
/// - E1xxx: Auth/session errors
/// - E2xxx: User errors
/// - E3xxx: Message errors
/// - E4xxx: File storage errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Shared (E0xxx)
    InternalError,
    ValidationError,
    NotFound,
    Unauthorized,
    Forbidden,
    BadRequest,
    PayloadTooLarge,
    Conflict,

    // Auth (E1xxx)
    InvalidCredentials,
    SessionInvalid,
    PasswordTooShort,
    UsernameTaken,
    EmailTaken,

    // Users (E2xxx)
    UserNotFound,

    // Messages (E3xxx)
    MessageNotFound,
    NotMessageAuthor,

    // Files (E4xxx)
    FileNotFound,
    UploadFailed,
}

impl ErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            // Shared
            Self::InternalError => "E0001",
            Self::ValidationError => "E0002",
            Self::NotFound => "E0003",
            Self::Unauthorized => "E0004",
            Self::Forbidden => "E0005",
            Self::BadRequest => "E0006",
            Self::PayloadTooLarge => "E0007",
            Self::Conflict => "E0008",

            // Auth
            Self::InvalidCredentials => "E1001",
            Self::SessionInvalid => "E1002",
            Self::PasswordTooShort => "E1003",
            Self::UsernameTaken => "E1004",
            Self::EmailTaken => "E1005",

            // Users
            Self::UserNotFound => "E2001",

            // Messages
            Self::MessageNotFound => "E3001",
            Self::NotMessageAuthor => "E3002",

            // Files
            Self::FileNotFound => "E4001",
            Self::UploadFailed => "E4002",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ValidationError | Self::BadRequest | Self::PasswordTooShort
            | Self::UploadFailed => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::NotFound | Self::UserNotFound | Self::MessageNotFound
            | Self::FileNotFound => StatusCode::NOT_FOUND,
            Self::Unauthorized | Self::InvalidCredentials | Self::SessionInvalid => {
                StatusCode::UNAUTHORIZED
            }
            Self::Forbidden | Self::NotMessageAuthor => StatusCode::FORBIDDEN,
            Self::Conflict | Self::UsernameTaken | Self::EmailTaken => StatusCode::CONFLICT,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    Known {
        code: ErrorCode,
        message: String,
        details: Option<serde_json::Value>,
    },

    #[error("internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Known {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(code: ErrorCode, message: impl Into<String>, details: serde_json::Value) -> Self {
        Self::Known {
            code,
            message: message.into(),
            details: Some(details),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

/// The store's unique constraints are the authoritative uniqueness guard;
/// a violation surfaces as the matching duplicate error rather than a 500.
fn map_unique_violation(info: &dyn diesel::result::DatabaseErrorInformation) -> ApiErrorResponse {
    let constraint = info.constraint_name().unwrap_or_default();
    if constraint.contains("username") {
        ApiErrorResponse::new(ErrorCode::UsernameTaken.code(), "username already exists")
    } else if constraint.contains("email") {
        ApiErrorResponse::new(ErrorCode::EmailTaken.code(), "email already exists")
    } else {
        ApiErrorResponse::new(ErrorCode::Conflict.code(), "duplicate value")
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_response) = match &self {
            AppError::Known { code, message, details } => {
                let status = code.status_code();
                let mut resp = ApiErrorResponse::new(code.code(), message);
                if let Some(d) = details {
                    resp = resp.with_details(d.clone());
                }
                (status, resp)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiErrorResponse::new("E0001", "internal server error"),
                )
            }
            AppError::Database(err) => match err {
                diesel::result::Error::NotFound => (
                    StatusCode::NOT_FOUND,
                    ApiErrorResponse::new("E0003", "resource not found"),
                ),
                diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                    tracing::warn!(constraint = ?info.constraint_name(), "unique constraint violation");
                    (StatusCode::CONFLICT, map_unique_violation(info.as_ref()))
                }
                _ => {
                    tracing::error!(error = %err, "database error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ApiErrorResponse::new("E0001", "database error"),
                    )
                }
            },
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ApiErrorResponse::new("E0002", msg),
            ),
        };

        (status, Json(error_response)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_unique() {
        let codes = [
            ErrorCode::InternalError,
            ErrorCode::ValidationError,
            ErrorCode::NotFound,
            ErrorCode::Unauthorized,
            ErrorCode::Forbidden,
            ErrorCode::BadRequest,
            ErrorCode::PayloadTooLarge,
            ErrorCode::Conflict,
            ErrorCode::InvalidCredentials,
            ErrorCode::SessionInvalid,
            ErrorCode::PasswordTooShort,
            ErrorCode::UsernameTaken,
            ErrorCode::EmailTaken,
            ErrorCode::UserNotFound,
            ErrorCode::MessageNotFound,
            ErrorCode::NotMessageAuthor,
            ErrorCode::FileNotFound,
            ErrorCode::UploadFailed,
        ];
        let mut seen = std::collections::HashSet::new();
        for code in codes {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn status_mapping() {
        assert_eq!(ErrorCode::ValidationError.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::InvalidCredentials.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ErrorCode::SessionInvalid.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ErrorCode::NotMessageAuthor.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ErrorCode::FileNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::UsernameTaken.status_code(), StatusCode::CONFLICT);
        assert_eq!(ErrorCode::PayloadTooLarge.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(ErrorCode::InternalError.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
