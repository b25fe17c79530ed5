//! Remote object storage for uploaded images, using OpenDAL.
//!
//! The core only needs one operation from a backend: store bytes and return a
//! public URL ([`BlobStore`]). Backends:
//!
//! - [`S3BlobStore`]: any S3-compatible bucket (AWS, R2, MinIO...), path-style.
//! - [`MockBlobStore`]: in-memory, scriptable, for tests.
//!
//! [`ImageTypeFixingStore`] wraps any backend and corrects the declared media type
//! of images before they are stored.

mod fixing;
pub mod mock;
mod naming;
mod s3;
mod traits;
mod types;

pub use fixing::{ImageTypeFixingStore, fixed_image_type};
pub use mock::MockBlobStore;
pub use naming::{RANDOM_ID_LEN, extension_for, object_key_for, random_id};
pub use s3::{S3BlobStore, S3Config};
pub use traits::BlobStore;
pub use types::{BlobStoreError, BlobUpload};
