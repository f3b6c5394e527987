//! Blob storage on local disk. Message files land under a per-user
//! subdirectory with a collision-proofed name; avatars live at one fixed
//! path per user and are overwritten on re-upload.

use std::path::{Component, Path, PathBuf};

use chrono::Utc;
use rand::Rng;

use molva_shared::errors::{AppError, AppResult, ErrorCode};

use crate::models::MessageType;

const SUFFIX_LEN: usize = 6;
const SUFFIX_CHARS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// ASCII letters/digits, Cyrillic letters, dot, underscore and hyphen pass
/// through; everything else becomes an underscore.
fn is_allowed_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(c, '.' | '_' | '-')
        || ('а'..='я').contains(&c)
        || ('А'..='Я').contains(&c)
}

pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| if is_allowed_char(c) { c } else { '_' })
        .collect()
}

/// Split `photo.tar.gz` into (`photo.tar`, Some(`gz`)). Leading-dot names
/// and names without a dot have no extension.
pub fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rfind('.') {
        Some(idx) if idx > 0 && idx < name.len() - 1 => (&name[..idx], Some(&name[idx + 1..])),
        _ => (name, None),
    }
}

/// Fallback extension when the client sent a name without one. Browser
/// media recordings arrive as WebM.
pub fn default_extension(message_type: MessageType) -> &'static str {
    match message_type {
        MessageType::Audio | MessageType::Video => ".webm",
        _ => ".file",
    }
}

pub fn random_suffix() -> String {
    let mut rng = rand::thread_rng();
    (0..SUFFIX_LEN)
        .map(|_| SUFFIX_CHARS[rng.gen_range(0..SUFFIX_CHARS.len())] as char)
        .collect()
}

/// `<sanitized base>_<unix millis>_<suffix><ext>`.
pub fn storage_file_name(
    original_name: &str,
    declared_type: MessageType,
    timestamp_millis: i64,
    suffix: &str,
) -> String {
    let (base, ext) = split_extension(original_name);
    let ext = match ext {
        Some(e) => format!(".{}", sanitize_file_name(e)),
        None => default_extension(declared_type).to_string(),
    };
    format!("{}_{}_{}{}", sanitize_file_name(base), timestamp_millis, suffix, ext)
}

fn resolve(uploads_dir: &str, relative: &str) -> AppResult<PathBuf> {
    let rel_path = Path::new(relative);
    // reject traversal components in client-supplied paths
    if relative.is_empty() || rel_path.components().any(|c| !matches!(c, Component::Normal(_))) {
        return Err(AppError::new(
            ErrorCode::FileNotFound,
            format!("file not found: {relative}"),
        ));
    }
    Ok(Path::new(uploads_dir).join(rel_path))
}

fn upload_failed(err: std::io::Error) -> AppError {
    AppError::new(ErrorCode::UploadFailed, format!("file write failed: {err}"))
}

/// Store a message attachment, returning its path relative to the uploads
/// root (`user_<id>/<name>`).
pub async fn save_file(
    uploads_dir: &str,
    user_id: i64,
    original_name: &str,
    declared_type: MessageType,
    data: &[u8],
) -> AppResult<String> {
    let user_dir = format!("user_{user_id}");
    let dir = Path::new(uploads_dir).join(&user_dir);
    tokio::fs::create_dir_all(&dir).await.map_err(upload_failed)?;

    let file_name = storage_file_name(
        original_name,
        declared_type,
        Utc::now().timestamp_millis(),
        &random_suffix(),
    );
    tokio::fs::write(dir.join(&file_name), data)
        .await
        .map_err(upload_failed)?;

    tracing::debug!(user_id, file = %file_name, "file saved");
    Ok(format!("{user_dir}/{file_name}"))
}

/// Store a user's avatar at its fixed name, overwriting any previous one.
/// A re-upload with a different extension leaves the old file behind.
pub async fn save_avatar(
    uploads_dir: &str,
    user_id: i64,
    original_name: &str,
    data: &[u8],
) -> AppResult<String> {
    let dir = Path::new(uploads_dir).join("avatars");
    tokio::fs::create_dir_all(&dir).await.map_err(upload_failed)?;

    let (_, ext) = split_extension(original_name);
    let ext = ext
        .map(|e| format!(".{}", sanitize_file_name(e)))
        .unwrap_or_else(|| ".jpg".to_string());
    let file_name = format!("avatar_{user_id}{ext}");

    tokio::fs::write(dir.join(&file_name), data)
        .await
        .map_err(upload_failed)?;

    tracing::debug!(user_id, file = %file_name, "avatar saved");
    Ok(format!("avatars/{file_name}"))
}

pub async fn read_file(uploads_dir: &str, relative: &str) -> AppResult<Vec<u8>> {
    let path = resolve(uploads_dir, relative)?;

    if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
        return Err(AppError::new(
            ErrorCode::FileNotFound,
            format!("file not found: {relative}"),
        ));
    }

    tokio::fs::read(&path)
        .await
        .map_err(|e| AppError::internal(format!("file read failed: {e}")))
}

/// Used for cascade deletion of message attachments; the caller decides
/// whether a failure matters.
pub async fn remove_file(uploads_dir: &str, relative: &str) -> std::io::Result<()> {
    tokio::fs::remove_file(Path::new(uploads_dir).join(relative)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_keeps_ascii_and_cyrillic() {
        assert_eq!(sanitize_file_name("report-2024_v1.txt"), "report-2024_v1.txt");
        assert_eq!(sanitize_file_name("отчёт"), "отч_т"); // ё is outside а-я
        assert_eq!(sanitize_file_name("Договор"), "Договор");
    }

    #[test]
    fn sanitize_replaces_everything_else() {
        assert_eq!(sanitize_file_name("résumé"), "r_sum_");
        assert_eq!(sanitize_file_name("a b/c\\d"), "a_b_c_d");
        assert_eq!(sanitize_file_name("漢字"), "__");
    }

    #[test]
    fn split_extension_cases() {
        assert_eq!(split_extension("résumé.pdf"), ("résumé", Some("pdf")));
        assert_eq!(split_extension("photo.tar.gz"), ("photo.tar", Some("gz")));
        assert_eq!(split_extension("noext"), ("noext", None));
        assert_eq!(split_extension(".hidden"), (".hidden", None));
        assert_eq!(split_extension("trailing."), ("trailing.", None));
    }

    #[test]
    fn storage_name_shape() {
        let name = storage_file_name("résumé.pdf", MessageType::File, 1700000000000, "a1b2c3");
        assert_eq!(name, "r_sum__1700000000000_a1b2c3.pdf");
    }

    #[test]
    fn missing_extension_inferred_from_type() {
        let name = storage_file_name("voice-note", MessageType::Audio, 1, "zzzzzz");
        assert!(name.ends_with(".webm"));
        let name = storage_file_name("recording", MessageType::Video, 1, "zzzzzz");
        assert!(name.ends_with(".webm"));
        let name = storage_file_name("blob", MessageType::File, 1, "zzzzzz");
        assert!(name.ends_with(".file"));
    }

    #[test]
    fn random_suffix_is_base36() {
        for _ in 0..20 {
            let suffix = random_suffix();
            assert_eq!(suffix.len(), SUFFIX_LEN);
            assert!(suffix.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
        }
    }

    #[tokio::test]
    async fn save_and_read_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = dir.path().to_str().unwrap();

        let rel = save_file(uploads, 7, "résumé.pdf", MessageType::File, b"%PDF-")
            .await
            .unwrap();
        assert!(rel.starts_with("user_7/r_sum__"));
        assert!(rel.ends_with(".pdf"));

        let data = read_file(uploads, &rel).await.unwrap();
        assert_eq!(data, b"%PDF-");
    }

    #[tokio::test]
    async fn avatar_overwrites_previous() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = dir.path().to_str().unwrap();

        let first = save_avatar(uploads, 3, "me.png", b"v1").await.unwrap();
        let second = save_avatar(uploads, 3, "other.png", b"v2").await.unwrap();
        assert_eq!(first, "avatars/avatar_3.png");
        assert_eq!(first, second);
        assert_eq!(read_file(uploads, &first).await.unwrap(), b"v2");
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = dir.path().to_str().unwrap();
        assert!(read_file(uploads, "user_1/absent.txt").await.is_err());
    }

    #[tokio::test]
    async fn traversal_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = dir.path().to_str().unwrap();
        assert!(read_file(uploads, "../etc/passwd").await.is_err());
        assert!(read_file(uploads, "").await.is_err());
    }
}
