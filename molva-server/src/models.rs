use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use molva_shared::types::auth::{PublicUser, UserRole};

use crate::schema::{activity_log, messages, sessions, user_avatars, users};

// --- User ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = users)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn role(&self) -> UserRole {
        self.role.parse::<UserRole>().unwrap_or(UserRole::User)
    }

    pub fn to_public(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            role: self.role(),
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub is_active: bool,
}

#[derive(Debug, Default, AsChangeset)]
#[diesel(table_name = users)]
pub struct UserChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub is_active: Option<bool>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.email.is_none() && self.is_active.is_none()
    }
}

// --- Session ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = sessions)]
pub struct Session {
    pub id: i64,
    pub user_id: i64,
    pub session_token: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = sessions)]
pub struct NewSession {
    pub user_id: i64,
    pub session_token: String,
    pub expires_at: DateTime<Utc>,
}

// --- Message ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Text,
    Image,
    Video,
    Audio,
    File,
    Code,
}

impl MessageType {
    /// Bucket an uploaded file by its declared MIME type.
    pub fn from_mime(mime: &str) -> Self {
        if mime.starts_with("image/") {
            MessageType::Image
        } else if mime.starts_with("video/") {
            MessageType::Video
        } else if mime.starts_with("audio/") {
            MessageType::Audio
        } else {
            MessageType::File
        }
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageType::Text => write!(f, "text"),
            MessageType::Image => write!(f, "image"),
            MessageType::Video => write!(f, "video"),
            MessageType::Audio => write!(f, "audio"),
            MessageType::File => write!(f, "file"),
            MessageType::Code => write!(f, "code"),
        }
    }
}

impl std::str::FromStr for MessageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(MessageType::Text),
            "image" => Ok(MessageType::Image),
            "video" => Ok(MessageType::Video),
            "audio" => Ok(MessageType::Audio),
            "file" => Ok(MessageType::File),
            "code" => Ok(MessageType::Code),
            _ => Err(format!("unknown message type: {s}")),
        }
    }
}

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = messages)]
pub struct Message {
    pub id: i64,
    pub user_id: i64,
    pub content: String,
    pub message_type: String,
    pub language: Option<String>,
    pub file_path: Option<String>,
    pub file_name: Option<String>,
    pub file_size: Option<i64>,
    pub mime_type: Option<String>,
    pub is_edited: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = messages)]
pub struct NewMessage {
    pub user_id: i64,
    pub content: String,
    pub message_type: String,
    pub language: Option<String>,
    pub file_path: Option<String>,
    pub file_name: Option<String>,
    pub file_size: Option<i64>,
    pub mime_type: Option<String>,
}

/// Edit changeset. `is_edited` is not optional: any successful update call
/// marks the message edited, whether or not a field actually changed.
#[derive(Debug, AsChangeset)]
#[diesel(table_name = messages)]
pub struct MessageChanges {
    pub content: Option<String>,
    pub message_type: Option<String>,
    pub language: Option<String>,
    pub is_edited: bool,
    pub updated_at: DateTime<Utc>,
}

/// A message row joined with its author's username and avatar, the shape
/// the scrollback renders.
#[derive(Debug, Serialize)]
pub struct MessageView {
    #[serde(flatten)]
    pub message: Message,
    pub username: Option<String>,
    pub avatar_path: Option<String>,
}

// --- UserAvatar ---

#[derive(Debug, Insertable)]
#[diesel(table_name = user_avatars)]
pub struct NewUserAvatar {
    pub user_id: i64,
    pub avatar_path: String,
    pub mime_type: String,
    pub file_size: i64,
}

// --- ActivityLogEntry ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = activity_log)]
pub struct ActivityLogEntry {
    pub id: i64,
    pub user_id: Option<i64>,
    pub action: String,
    pub description: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = activity_log)]
pub struct NewActivityLogEntry {
    pub user_id: Option<i64>,
    pub action: String,
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_type_round_trips() {
        for t in [
            MessageType::Text,
            MessageType::Image,
            MessageType::Video,
            MessageType::Audio,
            MessageType::File,
            MessageType::Code,
        ] {
            let parsed: MessageType = t.to_string().parse().unwrap();
            assert_eq!(parsed, t);
        }
        assert!("sticker".parse::<MessageType>().is_err());
    }

    #[test]
    fn mime_buckets() {
        assert_eq!(MessageType::from_mime("image/png"), MessageType::Image);
        assert_eq!(MessageType::from_mime("video/webm"), MessageType::Video);
        assert_eq!(MessageType::from_mime("audio/ogg"), MessageType::Audio);
        assert_eq!(MessageType::from_mime("application/pdf"), MessageType::File);
        assert_eq!(MessageType::from_mime("text/plain"), MessageType::File);
    }

    #[test]
    fn user_changes_empty_detection() {
        assert!(UserChanges::default().is_empty());
        let changes = UserChanges {
            is_active: Some(false),
            ..Default::default()
        };
        assert!(!changes.is_empty());
    }
}
