//! Object storage backends for uploaded attachment bytes.

mod memory;
mod r2;

use std::future::Future;

pub use memory::{MemoryBlobStore, StoredObject};
pub use r2::{R2Config, R2Storage};

use crate::Result;

/// Content-addressable blob store with public URL retrieval.
pub trait BlobStore: Send + Sync {
    /// Write `bytes` at `object_key`.
    fn upload(
        &self,
        object_key: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Resolve a durable retrievable URL for an uploaded object.
    fn resolve_url(&self, object_key: &str) -> impl Future<Output = Result<String>> + Send;
}
