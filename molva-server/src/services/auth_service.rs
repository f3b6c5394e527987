use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use diesel::prelude::*;
use rand::Rng;
use serde::Serialize;

use molva_shared::errors::{AppError, AppResult, ErrorCode};
use molva_shared::types::auth::PublicUser;

use crate::models::{NewSession, Session, User};
use crate::schema::{sessions, users};
use crate::services::{activity_service, user_service};
use crate::AppState;

/// Every login failure shares this one external error; the distinction
/// between unknown user, disabled account and wrong password lives in the
/// activity log only.
fn invalid_credentials() -> AppError {
    AppError::new(ErrorCode::InvalidCredentials, "invalid username or password")
}

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::internal(format!("password hashing failed: {e}")))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AppError::internal(format!("invalid password hash: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Opaque bearer credential: 32 random bytes, hex encoded.
pub fn generate_session_token() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    hex::encode(bytes)
}

#[derive(Debug, Serialize)]
pub struct LoginSuccess {
    pub session_token: String,
    pub user: PublicUser,
}

pub fn login(state: &AppState, username: &str, password: &str) -> AppResult<LoginSuccess> {
    let user = user_service::get_user_by_username(&state.db, username)?;

    let Some(user) = user else {
        activity_service::log_system_activity(
            &state.db,
            "login_attempt",
            &format!("failed login: user {username} not found"),
        );
        return Err(invalid_credentials());
    };

    if !user.is_active {
        activity_service::log_user_activity(
            &state.db,
            user.id,
            "login_attempt",
            "login attempt on a deactivated account",
        );
        return Err(invalid_credentials());
    }

    if !verify_password(password, &user.password_hash)? {
        activity_service::log_user_activity(
            &state.db,
            user.id,
            "login_attempt",
            "wrong password on login attempt",
        );
        return Err(invalid_credentials());
    }

    let token = generate_session_token();
    let expires_at = Utc::now() + Duration::days(state.config.session_ttl_days);

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;
    diesel::insert_into(sessions::table)
        .values(&NewSession {
            user_id: user.id,
            session_token: token.clone(),
            expires_at,
        })
        .execute(&mut conn)?;

    activity_service::log_user_activity(&state.db, user.id, "login_success", "logged in");
    tracing::info!(user_id = user.id, username = %user.username, "user logged in");

    Ok(LoginSuccess {
        session_token: token,
        user: user.to_public(),
    })
}

/// Resolve a bearer token to its user. Requires an unexpired session and an
/// active account; anything else is `None`. Each hit leaves a
/// `session_validation` audit row.
pub fn validate_session(state: &AppState, token: &str) -> AppResult<Option<PublicUser>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let row: Option<(Session, User)> = sessions::table
        .inner_join(users::table)
        .filter(sessions::session_token.eq(token))
        .filter(sessions::expires_at.gt(Utc::now()))
        .filter(users::is_active.eq(true))
        .first::<(Session, User)>(&mut conn)
        .optional()?;

    let Some((_, user)) = row else {
        return Ok(None);
    };

    activity_service::log_user_activity(&state.db, user.id, "session_validation", "session validated");

    Ok(Some(user.to_public()))
}

/// Delete the session row for a token. Idempotent: returns false when the
/// token was not known.
pub fn logout(state: &AppState, token: &str) -> AppResult<bool> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let user_id: Option<i64> = diesel::delete(sessions::table.filter(sessions::session_token.eq(token)))
        .returning(sessions::user_id)
        .get_result(&mut conn)
        .optional()?;

    match user_id {
        Some(user_id) => {
            activity_service::log_user_activity(&state.db, user_id, "logout", "logged out");
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Bulk-delete expired sessions. No scheduler lives in this process; the
/// deployment decides when to trigger the sweep (it also runs once at
/// startup).
pub fn cleanup_expired_sessions(state: &AppState) -> AppResult<usize> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let deleted = diesel::delete(sessions::table.filter(sessions::expires_at.le(Utc::now())))
        .execute(&mut conn)?;

    if deleted > 0 {
        activity_service::log_system_activity(
            &state.db,
            "session_cleanup",
            &format!("removed {deleted} expired sessions"),
        );
    }

    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_token_is_64_hex_chars() {
        let token = generate_session_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn session_tokens_are_distinct() {
        let mut seen = std::collections::HashSet::new();
        for _ in 0..100 {
            assert!(seen.insert(generate_session_token()));
        }
    }

    #[test]
    fn password_hash_round_trips() {
        let hash = hash_password("secret1").unwrap();
        assert!(verify_password("secret1", &hash).unwrap());
        assert!(!verify_password("secret2", &hash).unwrap());
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash_password("secret1").unwrap();
        let b = hash_password("secret1").unwrap();
        assert_ne!(a, b);
    }
}
