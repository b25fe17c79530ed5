//! Storage trait definitions.

use super::types::{BlobStoreError, BlobUpload};
use std::future::Future;

/// Stores bytes under a generated key and hands back the public URL.
///
/// See [module documentation](super) for the available backends.
pub trait BlobStore: Send + Sync + 'static {
    fn store(
        &self,
        upload: BlobUpload,
    ) -> impl Future<Output = Result<String, BlobStoreError>> + Send;
}

impl<S: BlobStore> BlobStore for std::sync::Arc<S> {
    fn store(
        &self,
        upload: BlobUpload,
    ) -> impl Future<Output = Result<String, BlobStoreError>> + Send {
        (**self).store(upload)
    }
}
