use axum::extract::{Multipart, Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use molva_shared::errors::{AppError, AppResult, ErrorCode};
use molva_shared::types::pagination::{PageParams, MESSAGE_PAGE_LIMIT};
use molva_shared::types::ApiResponse;

use crate::media;
use crate::middleware::AuthUser;
use crate::models::{MessageType, MessageView};
use crate::services::message_service::{NewMessageData, StoredFile};
use crate::services::{file_service, message_service};
use crate::AppState;

// --- Request / Response types ---

#[derive(Debug, Serialize)]
pub struct MessageListResponse {
    pub messages: Vec<MessageView>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMessageRequest {
    pub content: Option<String>,
    pub message_type: Option<MessageType>,
    pub language: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub deleted: bool,
}

#[derive(Debug, Serialize)]
pub struct AvatarUploadResponse {
    pub avatar_path: String,
}

// --- Handlers ---

/// GET /api/messages?limit&offset - one scrollback block, oldest first
/// within the block (see message_service::get_messages for the ordering
/// contract).
pub async fn list_messages(
    _user: AuthUser,
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageParams>,
) -> AppResult<Json<ApiResponse<MessageListResponse>>> {
    let (limit, offset) = params.clamp(MESSAGE_PAGE_LIMIT);
    let messages = message_service::get_messages(&state, limit, offset)?;
    Ok(Json(ApiResponse::ok(MessageListResponse { messages })))
}

/// POST /api/messages - multipart create with an optional single file.
///
/// The stored message type follows the uploaded MIME when a file is
/// present; the declared type only decides the fallback extension for
/// extensionless uploads (browser media recordings).
pub async fn create_message(
    AuthUser(user): AuthUser,
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> AppResult<Json<ApiResponse<MessageView>>> {
    let mut content: Option<String> = None;
    let mut declared_type: Option<MessageType> = None;
    let mut language: Option<String> = None;
    let mut upload: Option<(String, String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::new(ErrorCode::ValidationError, format!("multipart error: {e}")))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "content" => {
                content = Some(field.text().await.unwrap_or_default());
            }
            "message_type" => {
                let val = field.text().await.unwrap_or_default();
                declared_type = val.parse::<MessageType>().ok();
            }
            "language" => {
                let val = field.text().await.unwrap_or_default();
                if !val.trim().is_empty() {
                    language = Some(val);
                }
            }
            "file" => {
                let file_name = field.file_name().unwrap_or("file").to_string();
                let mime = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field.bytes().await.map_err(|e| {
                    AppError::new(ErrorCode::UploadFailed, format!("failed to read file: {e}"))
                })?;
                upload = Some((file_name, mime, data.to_vec()));
            }
            _ => {}
        }
    }

    let has_content = content.as_deref().map_or(false, |c| !c.trim().is_empty());
    if !has_content && upload.is_none() {
        return Err(AppError::new(
            ErrorCode::ValidationError,
            "content or file required",
        ));
    }

    let file = match &upload {
        Some((file_name, mime, data)) => {
            let declared = declared_type.unwrap_or(MessageType::File);
            let path = file_service::save_file(
                &state.config.uploads_dir,
                user.id,
                file_name,
                declared,
                data,
            )
            .await?;
            Some(StoredFile {
                path,
                name: file_name.clone(),
                size: data.len() as i64,
                mime_type: mime.clone(),
            })
        }
        None => None,
    };

    let message_type = match &upload {
        Some((_, mime, _)) => MessageType::from_mime(mime),
        None => declared_type.unwrap_or(MessageType::Text),
    };

    let id = message_service::create_message(
        &state,
        NewMessageData {
            user_id: user.id,
            // caption only; the display name stays in file_name
            content: content.unwrap_or_default(),
            message_type,
            language,
            file,
        },
    )?;

    let view = message_service::get_message_view(&state, id)?
        .ok_or_else(|| AppError::internal("message missing after insert"))?;

    Ok(Json(ApiResponse::ok(view)))
}

/// PATCH /api/messages/:id - author-only edit; always marks the message
/// edited.
pub async fn update_message(
    AuthUser(user): AuthUser,
    State(state): State<Arc<AppState>>,
    Path(message_id): Path<i64>,
    Json(req): Json<UpdateMessageRequest>,
) -> AppResult<Json<ApiResponse<MessageView>>> {
    let message = message_service::get_message(&state, message_id)?
        .ok_or_else(|| AppError::new(ErrorCode::MessageNotFound, "message not found"))?;

    if !message_service::can_edit_message(&message, user.id) {
        return Err(AppError::new(
            ErrorCode::NotMessageAuthor,
            "you can only edit your own messages",
        ));
    }

    message_service::update_message(&state, message_id, req.content, req.message_type, req.language)?;

    let view = message_service::get_message_view(&state, message_id)?
        .ok_or_else(|| AppError::new(ErrorCode::MessageNotFound, "message not found"))?;

    Ok(Json(ApiResponse::ok(view)))
}

/// DELETE /api/messages/:id - author-only; removes the backing file
/// best-effort.
pub async fn delete_message(
    AuthUser(user): AuthUser,
    State(state): State<Arc<AppState>>,
    Path(message_id): Path<i64>,
) -> AppResult<Json<ApiResponse<DeletedResponse>>> {
    let message = message_service::get_message(&state, message_id)?
        .ok_or_else(|| AppError::new(ErrorCode::MessageNotFound, "message not found"))?;

    if !message_service::can_edit_message(&message, user.id) {
        return Err(AppError::new(
            ErrorCode::NotMessageAuthor,
            "you can only delete your own messages",
        ));
    }

    let deleted = message_service::delete_message(&state, message_id).await?;
    Ok(Json(ApiResponse::ok(DeletedResponse { deleted })))
}

/// POST /api/messages/avatar - multipart avatar upload + row upsert
pub async fn upload_avatar(
    AuthUser(user): AuthUser,
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> AppResult<Json<ApiResponse<AvatarUploadResponse>>> {
    let field = multipart
        .next_field()
        .await
        .map_err(|e| AppError::new(ErrorCode::UploadFailed, format!("failed to read multipart: {e}")))?
        .ok_or_else(|| AppError::new(ErrorCode::ValidationError, "avatar file required"))?;

    let file_name = field.file_name().unwrap_or("avatar").to_string();
    let mime = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();
    let data = field
        .bytes()
        .await
        .map_err(|e| AppError::new(ErrorCode::UploadFailed, format!("failed to read file data: {e}")))?;

    let avatar_path =
        file_service::save_avatar(&state.config.uploads_dir, user.id, &file_name, &data).await?;

    message_service::set_user_avatar(&state, user.id, &avatar_path, &mime, data.len() as i64)?;

    Ok(Json(ApiResponse::ok(AvatarUploadResponse { avatar_path })))
}

/// GET /api/messages/file/*path - raw attachment bytes, content type
/// sniffed from the extension table
pub async fn get_file(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
) -> AppResult<Response> {
    let data = file_service::read_file(&state.config.uploads_dir, &path).await?;

    let file_name = path.rsplit('/').next().unwrap_or(path.as_str()).to_string();
    let mime = media::mime_for_path(&file_name).unwrap_or("application/octet-stream");

    Ok((
        [
            (header::CONTENT_TYPE, mime.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("inline; filename=\"{file_name}\""),
            ),
        ],
        data,
    )
        .into_response())
}

/// GET /api/messages/avatar/*path - avatar bytes; avatars are images, so
/// the fallback content type is JPEG
pub async fn get_avatar(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
) -> AppResult<Response> {
    let data = file_service::read_file(&state.config.uploads_dir, &path).await?;

    let mime = media::mime_for_path(&path).unwrap_or("image/jpeg");

    Ok(([(header::CONTENT_TYPE, mime.to_string())], data).into_response())
}
