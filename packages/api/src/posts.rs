//! # Saving posts
//!
//! [`save_post`] writes a validated [`PostInput`] to the [`PostStore`], uploading an
//! attached image to the [`BlobStore`] first. Images are stored under a fresh random name
//! that keeps the original extension. The previous image of an edited post is deleted
//! only after the new one is uploaded; a failed upload keeps the previous image and is
//! reported through [`SavedPost::image_failed`] instead of failing the save.

use store::{content_type_for, image_extension, random_blob_name, BlobStore};

use crate::db::PostStore;
use crate::error::Result;
use crate::models::{FieldError, Post, PostInput};

/// An image file submitted with the post form.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: String,
    pub data: Vec<u8>,
}

impl ImageUpload {
    /// `None` for the empty part browsers send when no file was chosen.
    pub fn from_part(filename: Option<&str>, data: Vec<u8>) -> Option<Self> {
        let filename = filename.unwrap_or_default().trim();
        if filename.is_empty() && data.is_empty() {
            return None;
        }
        Some(Self {
            filename: filename.to_string(),
            data,
        })
    }

    /// Accepted lower-cased extension, or the form error to show.
    pub fn extension(&self) -> std::result::Result<String, FieldError> {
        image_extension(&self.filename).ok_or_else(|| FieldError {
            field: "image_path",
            message: "Images only!".to_string(),
        })
    }
}

/// Result of [`save_post`].
#[derive(Debug, Clone)]
pub struct SavedPost {
    pub post: Post,
    /// An image was attached but could not be uploaded.
    pub image_failed: bool,
}

/// Create a post (`existing == None`) or overwrite `existing` with `input`.
pub async fn save_post(
    posts: &dyn PostStore,
    blobs: &dyn BlobStore,
    existing: Option<&Post>,
    input: &PostInput,
    image: Option<ImageUpload>,
    user_id: i64,
) -> Result<SavedPost> {
    let previous_image = existing.and_then(|post| post.image_path.clone());
    let mut image_path = previous_image.clone();
    let mut image_failed = false;

    if let Some(image) = image {
        let ext = image.extension().map_err(|e| crate::error::Error::BadRequest(e.message))?;
        let name = random_blob_name(&ext);

        match blobs.put(&name, content_type_for(&ext), image.data).await {
            Ok(()) => {
                if let Some(old) = previous_image.as_deref() {
                    if let Err(e) = blobs.delete(old).await {
                        tracing::warn!(blob = old, "failed to delete replaced image: {}", e);
                    }
                }
                image_path = Some(name);
            }
            Err(e) => {
                tracing::warn!(filename = %image.filename, "image upload failed: {}", e);
                image_failed = true;
            }
        }
    }

    let post = match existing {
        Some(post) => {
            posts
                .update_post(post.id, input, image_path.as_deref(), user_id)
                .await?
        }
        None => posts.insert_post(input, image_path.as_deref(), user_id).await?,
    };

    tracing::info!(post_id = post.id, "saved post");
    Ok(SavedPost { post, image_failed })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use async_trait::async_trait;
    use store::{BlobError, MemoryBlobStore};

    struct FailingBlobStore;

    #[async_trait]
    impl BlobStore for FailingBlobStore {
        async fn put(&self, name: &str, _: &str, _: Vec<u8>) -> std::result::Result<(), BlobError> {
            Err(BlobError::Status {
                status: 503,
                name: name.to_string(),
            })
        }

        async fn delete(&self, _: &str) -> std::result::Result<(), BlobError> {
            panic!("nothing may be deleted after a failed upload");
        }

        fn public_base_url(&self) -> String {
            "/blobs/".to_string()
        }
    }

    fn input(title: &str) -> PostInput {
        PostInput {
            title: title.into(),
            author: "Ada".into(),
            body: "Body".into(),
        }
    }

    fn png(filename: &str) -> Option<ImageUpload> {
        ImageUpload::from_part(Some(filename), vec![0x89, b'P', b'N', b'G'])
    }

    #[test]
    fn test_empty_part_is_no_upload() {
        assert!(ImageUpload::from_part(Some(""), Vec::new()).is_none());
        assert!(ImageUpload::from_part(None, Vec::new()).is_none());
        assert!(ImageUpload::from_part(Some("a.png"), Vec::new()).is_some());
    }

    #[test]
    fn test_extension_check() {
        assert_eq!(png("Cat.JPG").unwrap().extension().unwrap(), "jpg");
        assert_eq!(png("cat.gif").unwrap().extension().unwrap_err().field, "image_path");
    }

    #[tokio::test]
    async fn test_create_without_image() {
        let posts = MemoryStore::new();
        let blobs = MemoryBlobStore::new();

        let saved = save_post(&posts, &blobs, None, &input("First"), None, 1).await.unwrap();

        assert_eq!(saved.post.title, "First");
        assert_eq!(saved.post.image_path, None);
        assert_eq!(saved.post.user_id, 1);
        assert!(!saved.image_failed);
        assert!(blobs.names().is_empty());
    }

    #[tokio::test]
    async fn test_replacing_image_deletes_old_blob() {
        let posts = MemoryStore::new();
        let blobs = MemoryBlobStore::new();

        let created = save_post(&posts, &blobs, None, &input("First"), png("a.png"), 1)
            .await
            .unwrap()
            .post;
        let old_name = created.image_path.clone().unwrap();
        assert!(old_name.ends_with(".png"));
        assert_eq!(blobs.get(&old_name).unwrap().content_type, "image/png");

        let edited = save_post(&posts, &blobs, Some(&created), &input("Edited"), png("b.PNG"), 2)
            .await
            .unwrap()
            .post;

        let new_name = edited.image_path.clone().unwrap();
        assert_ne!(new_name, old_name);
        assert_eq!(blobs.names(), vec![new_name]);
        assert_eq!(edited.title, "Edited");
        assert_eq!(edited.user_id, 2);
        assert_eq!(edited.id, created.id);
    }

    #[tokio::test]
    async fn test_edit_without_image_keeps_existing() {
        let posts = MemoryStore::new();
        let blobs = MemoryBlobStore::new();
        let created = save_post(&posts, &blobs, None, &input("First"), png("a.png"), 1)
            .await
            .unwrap()
            .post;

        let edited = save_post(&posts, &blobs, Some(&created), &input("Edited"), None, 1)
            .await
            .unwrap()
            .post;

        assert_eq!(edited.image_path, created.image_path);
    }

    #[tokio::test]
    async fn test_failed_upload_keeps_previous_image() {
        let posts = MemoryStore::new();
        let created = save_post(&posts, &MemoryBlobStore::new(), None, &input("First"), png("a.png"), 1)
            .await
            .unwrap()
            .post;

        let saved = save_post(&posts, &FailingBlobStore, Some(&created), &input("Edited"), png("b.png"), 1)
            .await
            .unwrap();

        assert!(saved.image_failed);
        assert_eq!(saved.post.image_path, created.image_path);
        assert_eq!(saved.post.title, "Edited");
    }

    #[tokio::test]
    async fn test_disallowed_extension_is_rejected() {
        let posts = MemoryStore::new();
        let err = save_post(&posts, &MemoryBlobStore::new(), None, &input("x"), png("x.exe"), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, crate::error::Error::BadRequest(_)));
        assert!(posts.list_posts().await.unwrap().is_empty());
    }
}
