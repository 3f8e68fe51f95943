//! # Store crate — blob storage for post images
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`blob`] | The [`BlobStore`] trait, [`BlobError`] and image naming helpers |
//! | [`config`] | [`BlobConfig`]: account, key, container, endpoint; connection-string parsing |
//! | `azure` | [`AzureBlobStore`], Shared Key signed calls to the Azure Blob REST API |
//! | `memory` | [`MemoryBlobStore`], used by tests and local development |

pub mod blob;
pub mod config;

mod azure;
mod memory;

pub use azure::AzureBlobStore;
pub use blob::{content_type_for, image_extension, random_blob_name, BlobError, BlobStore, ALLOWED_IMAGE_EXTENSIONS};
pub use config::BlobConfig;
pub use memory::{MemoryBlobStore, StoredBlob};
