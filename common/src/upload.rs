//! 画像アップロードの受付条件
//!
//! 受け付けるのは JPEG / PNG のみ。判定はコアに渡す前に行い、
//! 不正な入力ではセッションを一切変更しない。

use thiserror::Error;

pub const ACCEPTED_MIME_TYPES: &[&str] = &["image/jpeg", "image/png", "image/jpg"];

/// アップロード時のエラー（表示文言はそのままユーザーに見せる）
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    #[error("Please upload a valid image file (JPEG or PNG)")]
    UnsupportedType(String),

    #[error("Failed to read the file. Please try again.")]
    Unreadable(String),
}

/// 受け付け済みの画像
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Result<Self, UploadError> {
        let mime_type = mime_type.into();
        validate_mime(&mime_type)?;
        Ok(Self {
            file_name: file_name.into(),
            mime_type,
            bytes,
        })
    }
}

pub fn is_accepted_mime(mime: &str) -> bool {
    ACCEPTED_MIME_TYPES.contains(&mime)
}

pub fn validate_mime(mime: &str) -> Result<(), UploadError> {
    if is_accepted_mime(mime) {
        Ok(())
    } else {
        Err(UploadError::UnsupportedType(mime.to_string()))
    }
}

/// 拡張子からMIMEタイプを推定（大文字小文字は区別しない）
pub fn mime_for_extension(ext: &str) -> Option<&'static str> {
    match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepted_mime_types() {
        assert!(is_accepted_mime("image/jpeg"));
        assert!(is_accepted_mime("image/png"));
        assert!(is_accepted_mime("image/jpg"));
        assert!(!is_accepted_mime("image/gif"));
        assert!(!is_accepted_mime("image/webp"));
        assert!(!is_accepted_mime("application/pdf"));
    }

    #[test]
    fn test_rejected_upload_message() {
        let err = ImageUpload::new("scan.gif", "image/gif", vec![1, 2, 3]).unwrap_err();
        assert_eq!(err, UploadError::UnsupportedType("image/gif".into()));
        assert_eq!(err.to_string(), "Please upload a valid image file (JPEG or PNG)");
    }

    #[test]
    fn test_unreadable_message() {
        let err = UploadError::Unreadable("permission denied".into());
        assert_eq!(err.to_string(), "Failed to read the file. Please try again.");
    }

    #[test]
    fn test_mime_for_extension() {
        assert_eq!(mime_for_extension("JPG"), Some("image/jpeg"));
        assert_eq!(mime_for_extension("jpeg"), Some("image/jpeg"));
        assert_eq!(mime_for_extension("Png"), Some("image/png"));
        assert_eq!(mime_for_extension("gif"), None);
    }
}
