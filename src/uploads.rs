//! Product image upload handling.
//!
//! Multipart parsing and static serving are the framework's job
//! (actix-multipart / actix-files); this module enforces the upload policy —
//! at most [`MAX_IMAGES`] files of [`MAX_IMAGE_BYTES`] each, image types
//! only — and lands accepted files in the upload directory under a
//! timestamp-prefixed name.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use actix_multipart::Multipart;
use actix_web::web;
use chrono::Utc;
use futures_util::StreamExt;

use crate::errors::AppError;

pub const MAX_IMAGES: usize = 5;
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

const ALLOWED_IMAGE_TYPES: [&str; 4] = ["jpeg", "jpg", "png", "gif"];

/// A parsed `multipart/form-data` submission: plain text fields plus the
/// `/uploads/...` URLs of the stored images.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub fields: HashMap<String, String>,
    pub image_urls: Vec<String>,
}

/// Both the file extension and the declared content type must look like one
/// of the allowed image formats.
pub fn is_allowed_image(filename: &str, content_type: Option<&str>) -> bool {
    let ext_ok = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let lower = e.to_ascii_lowercase();
            ALLOWED_IMAGE_TYPES.contains(&lower.as_str())
        })
        .unwrap_or(false);

    let mime_ok = content_type
        .map(|ct| ALLOWED_IMAGE_TYPES.iter().any(|t| ct.contains(t)))
        .unwrap_or(false);

    ext_ok && mime_ok
}

/// Millisecond-timestamp prefix plus a sanitized original name, so repeated
/// uploads of the same file never collide on disk.
pub fn storage_filename(original: &str) -> String {
    let safe: String = original
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{}_{}", Utc::now().timestamp_millis(), safe)
}

/// Drain a multipart payload, storing image parts and collecting text parts.
///
/// Fails without touching the catalog when a part is oversized, of a
/// non-image type, or when more than [`MAX_IMAGES`] files are sent.
pub async fn read_form(mut payload: Multipart, upload_dir: PathBuf) -> Result<UploadForm, AppError> {
    let mut form = UploadForm::default();

    while let Some(item) = payload.next().await {
        let mut field = item
            .map_err(|e| AppError::InvalidArgument(format!("Malformed multipart payload: {e}")))?;

        let name = field.name().unwrap_or_default().to_string();
        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_string);
        let content_type = field.content_type().map(|m| m.to_string());

        let mut data: Vec<u8> = Vec::new();
        let is_file = filename.is_some();
        let limit = if is_file { MAX_IMAGE_BYTES } else { 64 * 1024 };

        while let Some(chunk) = field.next().await {
            let chunk = chunk
                .map_err(|e| AppError::InvalidArgument(format!("Failed to read part: {e}")))?;
            if data.len() + chunk.len() > limit {
                return Err(AppError::InvalidArgument(format!(
                    "Part '{name}' exceeds the {limit} byte limit"
                )));
            }
            data.extend_from_slice(&chunk);
        }

        match filename {
            Some(filename) => {
                if form.image_urls.len() >= MAX_IMAGES {
                    return Err(AppError::InvalidArgument(format!(
                        "At most {MAX_IMAGES} images are allowed"
                    )));
                }
                if !is_allowed_image(&filename, content_type.as_deref()) {
                    return Err(AppError::InvalidArgument(
                        "Only image files are allowed".to_string(),
                    ));
                }

                let stored = storage_filename(&filename);
                let path = upload_dir.join(&stored);
                web::block(move || std::fs::write(path, data))
                    .await
                    .map_err(|e| AppError::Internal(e.to_string()))?
                    .map_err(|e| AppError::Internal(format!("Failed to store image: {e}")))?;

                form.image_urls.push(format!("/uploads/{stored}"));
            }
            None => {
                let value = String::from_utf8(data).map_err(|_| {
                    AppError::InvalidArgument(format!("Field '{name}' is not valid UTF-8"))
                })?;
                form.fields.insert(name, value);
            }
        }
    }

    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_the_four_image_types() {
        for (file, mime) in [
            ("a.jpeg", "image/jpeg"),
            ("b.jpg", "image/jpeg"),
            ("c.png", "image/png"),
            ("d.gif", "image/gif"),
        ] {
            assert!(is_allowed_image(file, Some(mime)), "{file} should pass");
        }
    }

    #[test]
    fn extension_check_is_case_insensitive() {
        assert!(is_allowed_image("photo.PNG", Some("image/png")));
    }

    #[test]
    fn rejects_non_image_extensions() {
        assert!(!is_allowed_image("script.sh", Some("image/png")));
        assert!(!is_allowed_image("archive.pdf", Some("application/pdf")));
        assert!(!is_allowed_image("noextension", Some("image/png")));
    }

    #[test]
    fn rejects_mismatched_content_type() {
        assert!(!is_allowed_image("photo.png", Some("text/html")));
        assert!(!is_allowed_image("photo.png", None));
    }

    #[test]
    fn storage_filename_sanitizes_and_prefixes() {
        let stored = storage_filename("my photo (1).png");
        let (prefix, rest) = stored.split_once('_').expect("timestamp prefix");
        assert!(prefix.parse::<i64>().is_ok(), "prefix is a timestamp");
        assert_eq!(rest, "my_photo__1_.png");
    }
}
