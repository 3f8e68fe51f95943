//! Blob storage abstraction for post images.

use async_trait::async_trait;
use thiserror::Error;

/// Image extensions accepted for post attachments.
pub const ALLOWED_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Errors raised by a [`BlobStore`].
#[derive(Debug, Error)]
pub enum BlobError {
    #[error("invalid blob storage configuration: {0}")]
    Config(String),

    #[error("blob request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("blob service answered {status} for {name}")]
    Status { status: u16, name: String },
}

/// Async store for named binary objects inside a single container.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Upload `data` under `name`, replacing any existing blob.
    async fn put(&self, name: &str, content_type: &str, data: Vec<u8>) -> Result<(), BlobError>;

    /// Delete the blob called `name`. Deleting a missing blob is not an error.
    async fn delete(&self, name: &str) -> Result<(), BlobError>;

    /// Public URL prefix under which blobs can be fetched by browsers.
    /// Always ends with `/`.
    fn public_base_url(&self) -> String;
}

/// Lower-cased extension of `filename` if it is an accepted image type.
pub fn image_extension(filename: &str) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    ALLOWED_IMAGE_EXTENSIONS
        .contains(&ext.as_str())
        .then_some(ext)
}

/// Fresh random blob name keeping `ext`, e.g. `3f2c...e1.png`.
pub fn random_blob_name(ext: &str) -> String {
    format!("{}.{}", uuid::Uuid::new_v4().simple(), ext)
}

/// MIME type for an accepted image extension.
pub fn content_type_for(ext: &str) -> &'static str {
    match ext {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_extension() {
        assert_eq!(image_extension("cat.PNG"), Some("png".to_string()));
        assert_eq!(image_extension("holiday.photo.jpeg"), Some("jpeg".to_string()));
        assert_eq!(image_extension("script.sh"), None);
        assert_eq!(image_extension("no_extension"), None);
    }

    #[test]
    fn test_random_blob_name_keeps_extension() {
        let first = random_blob_name("jpg");
        let second = random_blob_name("jpg");

        assert!(first.ends_with(".jpg"));
        assert_ne!(first, second);
        // 32 hex chars + ".jpg"
        assert_eq!(first.len(), 36);
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("png"), "image/png");
        assert_eq!(content_type_for("jpeg"), "image/jpeg");
        assert_eq!(content_type_for("gif"), "application/octet-stream");
    }
}
