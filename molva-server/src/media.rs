//! The single extension <-> MIME type table. Every handler that needs to
//! guess a content type from a stored file name goes through here.

/// Known extensions, lowercase, without the leading dot.
pub const EXTENSION_MIME_TYPES: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("mp4", "video/mp4"),
    ("webm", "video/webm"),
    ("mov", "video/quicktime"),
    ("mp3", "audio/mpeg"),
    ("wav", "audio/wav"),
    ("ogg", "audio/ogg"),
    ("pdf", "application/pdf"),
    ("txt", "text/plain"),
];

/// Look up the MIME type for a file path by its extension.
pub fn mime_for_path(path: &str) -> Option<&'static str> {
    let ext = path.rsplit('.').next()?.to_lowercase();
    EXTENSION_MIME_TYPES
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, mime)| *mime)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_extensions_resolve() {
        assert_eq!(mime_for_path("user_7/photo.jpg"), Some("image/jpeg"));
        assert_eq!(mime_for_path("clip.WebM"), Some("video/webm"));
        assert_eq!(mime_for_path("avatars/avatar_3.png"), Some("image/png"));
        assert_eq!(mime_for_path("notes.pdf"), Some("application/pdf"));
    }

    #[test]
    fn unknown_extension_is_none() {
        assert_eq!(mime_for_path("archive.xyz"), None);
        assert_eq!(mime_for_path("no_extension"), None);
    }

    #[test]
    fn table_has_no_duplicate_extensions() {
        let mut seen = std::collections::HashSet::new();
        for (ext, _) in EXTENSION_MIME_TYPES {
            assert!(seen.insert(*ext), "duplicate extension {ext}");
        }
    }
}
