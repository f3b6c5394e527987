use chrono::Utc;
use diesel::prelude::*;

use molva_shared::errors::{AppError, AppResult};
use crate::models::{Message, MessageChanges, MessageType, MessageView, NewMessage, NewUserAvatar};
use crate::schema::{messages, user_avatars, users};
use crate::services::{activity_service, file_service};
use crate::AppState;

/// Metadata of a stored attachment, produced by the file service.
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub path: String,
    pub name: String,
    pub size: i64,
    pub mime_type: String,
}

#[derive(Debug)]
pub struct NewMessageData {
    pub user_id: i64,
    pub content: String,
    pub message_type: MessageType,
    pub language: Option<String>,
    pub file: Option<StoredFile>,
}

pub fn create_message(state: &AppState, data: NewMessageData) -> AppResult<i64> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let new_message = NewMessage {
        user_id: data.user_id,
        content: data.content,
        message_type: data.message_type.to_string(),
        language: data.language,
        file_path: data.file.as_ref().map(|f| f.path.clone()),
        file_name: data.file.as_ref().map(|f| f.name.clone()),
        file_size: data.file.as_ref().map(|f| f.size),
        mime_type: data.file.as_ref().map(|f| f.mime_type.clone()),
    };

    let id: i64 = diesel::insert_into(messages::table)
        .values(&new_message)
        .returning(messages::id)
        .get_result(&mut conn)?;

    activity_service::log_user_activity(
        &state.db,
        data.user_id,
        "message_sent",
        &format!("sent a {} message", data.message_type),
    );

    Ok(id)
}

/// One scrollback block. The store is queried newest-first with
/// LIMIT/OFFSET, then the page is reversed so callers can append it to the
/// view in chronological order: offset N*10 is always the N-th most recent
/// block of 10, internally oldest-to-newest.
pub fn get_messages(state: &AppState, limit: i64, offset: i64) -> AppResult<Vec<MessageView>> {
    let limit = limit.clamp(1, 100);
    let offset = offset.max(0);

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let mut rows: Vec<(Message, Option<String>, Option<String>)> = messages::table
        .left_join(users::table)
        .left_join(user_avatars::table.on(user_avatars::user_id.eq(messages::user_id)))
        .order(messages::created_at.desc())
        .offset(offset)
        .limit(limit)
        .select((
            messages::all_columns,
            users::username.nullable(),
            user_avatars::avatar_path.nullable(),
        ))
        .load(&mut conn)?;

    rows.reverse();

    Ok(rows
        .into_iter()
        .map(|(message, username, avatar_path)| MessageView {
            message,
            username,
            avatar_path,
        })
        .collect())
}

pub fn get_message_view(state: &AppState, id: i64) -> AppResult<Option<MessageView>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let row: Option<(Message, Option<String>, Option<String>)> = messages::table
        .left_join(users::table)
        .left_join(user_avatars::table.on(user_avatars::user_id.eq(messages::user_id)))
        .filter(messages::id.eq(id))
        .select((
            messages::all_columns,
            users::username.nullable(),
            user_avatars::avatar_path.nullable(),
        ))
        .first(&mut conn)
        .optional()?;

    Ok(row.map(|(message, username, avatar_path)| MessageView {
        message,
        username,
        avatar_path,
    }))
}

pub fn get_message(state: &AppState, id: i64) -> AppResult<Option<Message>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;
    let message = messages::table.find(id).first::<Message>(&mut conn).optional()?;
    Ok(message)
}

/// Author-only check; role has no bearing on message edit/delete rights.
pub fn can_edit_message(message: &Message, user_id: i64) -> bool {
    message.user_id == user_id
}

/// Apply an edit. The edited flag is set on every successful call, even
/// when no field value actually changed.
pub fn update_message(
    state: &AppState,
    id: i64,
    content: Option<String>,
    message_type: Option<MessageType>,
    language: Option<String>,
) -> AppResult<bool> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let changes = MessageChanges {
        content,
        message_type: message_type.map(|t| t.to_string()),
        language,
        is_edited: true,
        updated_at: Utc::now(),
    };

    let rows = diesel::update(messages::table.find(id))
        .set(&changes)
        .execute(&mut conn)?;

    Ok(rows > 0)
}

/// Remove a message; when it carried an attachment, the blob is unlinked
/// best-effort (a failed unlink is logged and otherwise ignored).
pub async fn delete_message(state: &AppState, id: i64) -> AppResult<bool> {
    let Some(message) = get_message(state, id)? else {
        return Ok(false);
    };

    let rows = {
        let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;
        diesel::delete(messages::table.find(id)).execute(&mut conn)?
    };

    if rows == 0 {
        return Ok(false);
    }

    if let Some(file_path) = &message.file_path {
        if let Err(e) = file_service::remove_file(&state.config.uploads_dir, file_path).await {
            tracing::warn!(message_id = id, file = %file_path, error = %e, "attachment unlink failed");
        }
    }

    activity_service::log_user_activity(&state.db, message.user_id, "message_deleted", "message deleted");

    Ok(true)
}

/// One avatar row per user: insert or update in place.
pub fn set_user_avatar(
    state: &AppState,
    user_id: i64,
    avatar_path: &str,
    mime_type: &str,
    file_size: i64,
) -> AppResult<()> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    diesel::insert_into(user_avatars::table)
        .values(&NewUserAvatar {
            user_id,
            avatar_path: avatar_path.to_string(),
            mime_type: mime_type.to_string(),
            file_size,
        })
        .on_conflict(user_avatars::user_id)
        .do_update()
        .set((
            user_avatars::avatar_path.eq(avatar_path),
            user_avatars::mime_type.eq(mime_type),
            user_avatars::file_size.eq(file_size),
            user_avatars::updated_at.eq(Utc::now()),
        ))
        .execute(&mut conn)?;

    activity_service::log_user_activity(&state.db, user_id, "avatar_updated", "avatar updated");

    Ok(())
}

/// Registration seed: point a fresh account at the bundled default avatar
/// without touching an existing row or the activity log.
pub fn seed_default_avatar(state: &AppState, user_id: i64) -> AppResult<()> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    diesel::insert_into(user_avatars::table)
        .values(&NewUserAvatar {
            user_id,
            avatar_path: "avatars/default_avatar.png".to_string(),
            mime_type: "image/png".to_string(),
            file_size: 0,
        })
        .on_conflict_do_nothing()
        .execute(&mut conn)?;

    Ok(())
}

