use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::blob::{BlobError, BlobStore};

/// A blob held by [`MemoryBlobStore`].
#[derive(Clone, Debug, PartialEq)]
pub struct StoredBlob {
    pub content_type: String,
    pub data: Vec<u8>,
}

/// In-memory BlobStore for testing and local development.
#[derive(Clone, Debug, Default)]
pub struct MemoryBlobStore {
    blobs: Arc<Mutex<HashMap<String, StoredBlob>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<StoredBlob> {
        self.blobs.lock().unwrap().get(name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.blobs.lock().unwrap().keys().cloned().collect();
        names.sort();
        names
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, name: &str, content_type: &str, data: Vec<u8>) -> Result<(), BlobError> {
        self.blobs.lock().unwrap().insert(
            name.to_string(),
            StoredBlob {
                content_type: content_type.to_string(),
                data,
            },
        );
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<(), BlobError> {
        self.blobs.lock().unwrap().remove(name);
        Ok(())
    }

    fn public_base_url(&self) -> String {
        "/blobs/".to_string()
    }
}
