//! Media type correction applied in front of any store.

use super::traits::BlobStore;
use super::types::{BlobStoreError, BlobUpload};

/// Decorator that repairs the declared media type of image uploads.
///
/// Pasted files frequently arrive with an empty type, and some platforms report
/// `image/jpg`, which browsers refuse to render when served back.
#[derive(Clone)]
pub struct ImageTypeFixingStore<S> {
    inner: S,
}

impl<S> ImageTypeFixingStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

/// Returns the media type an image upload should be stored with.
pub fn fixed_image_type(name: &str, declared: &str) -> String {
    let declared = declared.trim();
    if declared.eq_ignore_ascii_case("image/jpg") {
        return "image/jpeg".to_owned();
    }
    if declared.starts_with("image/") {
        return declared.to_owned();
    }

    match mime_guess::from_path(name).first() {
        Some(guess) if guess.type_() == mime_guess::mime::IMAGE => guess.essence_str().to_owned(),
        _ => declared.to_owned(),
    }
}

impl<S: BlobStore> BlobStore for ImageTypeFixingStore<S> {
    async fn store(&self, mut upload: BlobUpload) -> Result<String, BlobStoreError> {
        let fixed = fixed_image_type(&upload.name, &upload.content_type);
        if fixed != upload.content_type {
            tracing::debug!(
                name = %upload.name,
                declared = %upload.content_type,
                fixed = %fixed,
                "Correcting declared media type"
            );
            upload.content_type = fixed;
        }
        self.inner.store(upload).await
    }
}
