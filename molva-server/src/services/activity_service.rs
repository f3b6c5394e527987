//! Append-only audit trail. Writes are best-effort by contract: a failed
//! log insert must never fail the operation being logged, so both entry
//! points swallow their own errors after emitting a warning.

use diesel::prelude::*;

use molva_shared::errors::{AppError, AppResult};

use crate::models::{ActivityLogEntry, NewActivityLogEntry};
use crate::schema::activity_log;
use crate::DbPool;

pub fn log_user_activity(pool: &DbPool, user_id: i64, action: &str, description: &str) {
    insert(pool, NewActivityLogEntry {
        user_id: Some(user_id),
        action: action.to_string(),
        description: description.to_string(),
    });
}

/// System-level entry: no owning user (`user_id` stays NULL).
pub fn log_system_activity(pool: &DbPool, action: &str, description: &str) {
    insert(pool, NewActivityLogEntry {
        user_id: None,
        action: action.to_string(),
        description: description.to_string(),
    });
}

fn insert(pool: &DbPool, entry: NewActivityLogEntry) {
    let result = pool
        .get()
        .map_err(|e| e.to_string())
        .and_then(|mut conn| {
            diesel::insert_into(activity_log::table)
                .values(&entry)
                .execute(&mut conn)
                .map_err(|e| e.to_string())
        });

    if let Err(e) = result {
        tracing::warn!(action = %entry.action, error = %e, "activity log write failed");
    }
}

pub fn user_activity(
    pool: &DbPool,
    user_id: i64,
    limit: i64,
    offset: i64,
) -> AppResult<Vec<ActivityLogEntry>> {
    let mut conn = pool.get().map_err(|e| AppError::internal(e.to_string()))?;
    let entries = activity_log::table
        .filter(activity_log::user_id.eq(user_id))
        .order(activity_log::created_at.desc())
        .offset(offset)
        .limit(limit)
        .load::<ActivityLogEntry>(&mut conn)?;
    Ok(entries)
}

pub fn system_activity(
    pool: &DbPool,
    limit: i64,
    offset: i64,
) -> AppResult<Vec<ActivityLogEntry>> {
    let mut conn = pool.get().map_err(|e| AppError::internal(e.to_string()))?;
    let entries = activity_log::table
        .filter(activity_log::user_id.is_null())
        .order(activity_log::created_at.desc())
        .offset(offset)
        .limit(limit)
        .load::<ActivityLogEntry>(&mut conn)?;
    Ok(entries)
}
