//! Uploaded file validation

use crate::{AppError, AppResult};

pub const ALLOWED_CONTENT_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/jpg"];

/// File part of a multipart upload
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    /// Media type without parameters, lowercased
    pub fn media_type(&self) -> Option<String> {
        self.content_type.as_deref().map(|ct| {
            ct.split(';')
                .next()
                .unwrap_or_default()
                .trim()
                .to_ascii_lowercase()
        })
    }

    /// Reject uploads that are empty or not a JPEG/PNG.
    pub fn validate(&self) -> AppResult<()> {
        let media_type = self.media_type().unwrap_or_default();
        if !ALLOWED_CONTENT_TYPES.contains(&media_type.as_str()) {
            let shown = self.content_type.clone().unwrap_or_else(|| "none".to_string());
            return Err(AppError::InvalidFileType(shown));
        }

        if self.bytes.is_empty() {
            return Err(AppError::NoFile);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(content_type: Option<&str>, bytes: &[u8]) -> UploadedFile {
        UploadedFile {
            file_name: Some("panel.jpg".to_string()),
            content_type: content_type.map(str::to_string),
            bytes: bytes.to_vec(),
        }
    }

    #[test]
    fn test_accepts_allowed_types() {
        for ct in ["image/jpeg", "image/png", "image/jpg", "IMAGE/PNG", "image/jpeg; charset=binary"] {
            assert!(upload(Some(ct), b"data").validate().is_ok(), "{ct} should be accepted");
        }
    }

    #[test]
    fn test_rejects_other_types() {
        for ct in [Some("image/gif"), Some("text/plain"), Some("application/octet-stream"), None] {
            let err = upload(ct, b"data").validate().unwrap_err();
            assert!(matches!(err, AppError::InvalidFileType(_)));
        }
    }

    #[test]
    fn test_rejects_empty_file() {
        let err = upload(Some("image/png"), b"").validate().unwrap_err();
        assert!(matches!(err, AppError::NoFile));
    }
}
