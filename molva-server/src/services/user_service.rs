use chrono::Utc;
use diesel::prelude::*;

use molva_shared::errors::{AppError, AppResult};
use molva_shared::types::auth::UserRole;

use crate::models::{NewUser, User, UserChanges};
use crate::schema::users;
use crate::services::{activity_service, auth_service};
use crate::DbPool;

/// Insert a new user. Callers pre-check username/email availability for a
/// friendly error, but the unique constraints remain the authoritative
/// guard; their violation is mapped at the error layer.
pub fn create_user(
    pool: &DbPool,
    username: &str,
    email: &str,
    password: &str,
    role: Option<UserRole>,
) -> AppResult<i64> {
    let password_hash = auth_service::hash_password(password)?;
    let mut conn = pool.get().map_err(|e| AppError::internal(e.to_string()))?;

    let new_user = NewUser {
        username: username.to_string(),
        email: email.to_string(),
        password_hash,
        role: role.unwrap_or(UserRole::User).to_string(),
        is_active: true,
    };

    let id: i64 = diesel::insert_into(users::table)
        .values(&new_user)
        .returning(users::id)
        .get_result(&mut conn)?;

    activity_service::log_system_activity(
        pool,
        "user_created",
        &format!("created user {username} ({email})"),
    );
    tracing::info!(user_id = id, username, "user created");

    Ok(id)
}

/// Apply field changes; false when nothing was requested or the row does
/// not exist.
pub fn update_user(pool: &DbPool, id: i64, mut changes: UserChanges) -> AppResult<bool> {
    if changes.is_empty() {
        return Ok(false);
    }
    changes.updated_at = Some(Utc::now());

    let mut conn = pool.get().map_err(|e| AppError::internal(e.to_string()))?;

    let action = match changes.is_active {
        Some(true) => "user_activated",
        Some(false) => "user_deactivated",
        None => "user_updated",
    };

    let rows = diesel::update(users::table.find(id))
        .set(&changes)
        .execute(&mut conn)?;

    if rows > 0 {
        activity_service::log_user_activity(pool, id, action, "user record updated");
    }

    Ok(rows > 0)
}

pub fn activate_user(pool: &DbPool, id: i64) -> AppResult<bool> {
    update_user(pool, id, UserChanges { is_active: Some(true), ..Default::default() })
}

pub fn deactivate_user(pool: &DbPool, id: i64) -> AppResult<bool> {
    update_user(pool, id, UserChanges { is_active: Some(false), ..Default::default() })
}

pub fn change_password(pool: &DbPool, id: i64, new_password: &str) -> AppResult<bool> {
    let password_hash = auth_service::hash_password(new_password)?;
    let mut conn = pool.get().map_err(|e| AppError::internal(e.to_string()))?;

    let rows = diesel::update(users::table.find(id))
        .set((
            users::password_hash.eq(password_hash),
            users::updated_at.eq(Utc::now()),
        ))
        .execute(&mut conn)?;

    if rows > 0 {
        activity_service::log_user_activity(pool, id, "password_changed", "password changed");
    }

    Ok(rows > 0)
}

/// Hard delete, explicit admin action only. Sessions and related rows go
/// with the user via ON DELETE CASCADE.
pub fn delete_user(pool: &DbPool, id: i64) -> AppResult<bool> {
    let user = get_user_by_id(pool, id)?;

    let mut conn = pool.get().map_err(|e| AppError::internal(e.to_string()))?;
    let rows = diesel::delete(users::table.find(id)).execute(&mut conn)?;

    if rows > 0 {
        let username = user.map(|u| u.username).unwrap_or_default();
        activity_service::log_system_activity(
            pool,
            "user_deleted",
            &format!("deleted user {username} (id {id})"),
        );
    }

    Ok(rows > 0)
}

pub fn get_user_by_id(pool: &DbPool, id: i64) -> AppResult<Option<User>> {
    let mut conn = pool.get().map_err(|e| AppError::internal(e.to_string()))?;
    let user = users::table.find(id).first::<User>(&mut conn).optional()?;
    Ok(user)
}

pub fn get_user_by_username(pool: &DbPool, username: &str) -> AppResult<Option<User>> {
    let mut conn = pool.get().map_err(|e| AppError::internal(e.to_string()))?;
    let user = users::table
        .filter(users::username.eq(username))
        .first::<User>(&mut conn)
        .optional()?;
    Ok(user)
}

pub fn get_user_by_email(pool: &DbPool, email: &str) -> AppResult<Option<User>> {
    let mut conn = pool.get().map_err(|e| AppError::internal(e.to_string()))?;
    let user = users::table
        .filter(users::email.eq(email))
        .first::<User>(&mut conn)
        .optional()?;
    Ok(user)
}

pub fn list_users(pool: &DbPool) -> AppResult<Vec<User>> {
    let mut conn = pool.get().map_err(|e| AppError::internal(e.to_string()))?;
    let users = users::table
        .order(users::created_at.desc())
        .load::<User>(&mut conn)?;
    Ok(users)
}
