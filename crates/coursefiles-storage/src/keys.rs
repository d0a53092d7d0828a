//! Shared key derivation for storage backends.
//!
//! Key format: `{user_id}-{course_id}-{file_name}`.

use std::path::Path;

/// Derive the storage key for a file owned by `user_id` in `course_id`.
///
/// The key is a pure function of its inputs; two uploads with the same
/// triple map to the same blob.
pub fn blob_key(user_id: i32, course_id: i32, file_name: &str) -> String {
    format!("{}-{}-{}", user_id, course_id, file_name)
}

/// `Content-Disposition` value that makes browsers save the blob as `file_name`.
pub fn content_disposition(file_name: &str) -> String {
    let escaped = file_name.replace('\\', "\\\\").replace('"', "\\\"");
    format!("attachment; filename=\"{}\"", escaped)
}

/// Best-effort MIME type from the file extension.
pub fn content_type_for(file_name: &str) -> &'static str {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("txt") => "text/plain; charset=utf-8",
        Some("md") => "text/markdown; charset=utf-8",
        Some("csv") => "text/csv; charset=utf-8",
        Some("json") => "application/json",
        Some("pdf") => "application/pdf",
        Some("docx") => {
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        }
        _ => "application/octet-stream",
    }
}

/// Reject keys that could escape a storage root.
pub(crate) fn is_safe_key(storage_key: &str) -> bool {
    !storage_key.is_empty()
        && !storage_key.contains("..")
        && !storage_key.starts_with('/')
        && !storage_key.contains('\\')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blob_key_is_deterministic() {
        assert_eq!(blob_key(1, 2, "notes.pdf"), "1-2-notes.pdf");
        assert_eq!(blob_key(1, 2, "notes.pdf"), blob_key(1, 2, "notes.pdf"));
        assert_ne!(blob_key(1, 2, "notes.pdf"), blob_key(2, 1, "notes.pdf"));
    }

    #[test]
    fn test_content_disposition_escapes_quotes() {
        assert_eq!(
            content_disposition("notes.pdf"),
            "attachment; filename=\"notes.pdf\""
        );
        assert_eq!(
            content_disposition("a\"b.txt"),
            "attachment; filename=\"a\\\"b.txt\""
        );
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("Report.PDF"), "application/pdf");
        assert_eq!(content_type_for("data.csv"), "text/csv; charset=utf-8");
        assert_eq!(content_type_for("unknown"), "application/octet-stream");
    }

    #[test]
    fn test_is_safe_key() {
        assert!(is_safe_key("1-2-notes.pdf"));
        assert!(!is_safe_key("../etc/passwd"));
        assert!(!is_safe_key("/etc/passwd"));
        assert!(!is_safe_key(""));
    }
}
