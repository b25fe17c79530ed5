//! S3-compatible storage over OpenDAL.

use tracing::{debug, warn};

use super::naming::object_key_for;
use super::traits::BlobStore;
use super::types::{BlobStoreError, BlobUpload};

/// Connection settings for an S3-compatible bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Config {
    pub endpoint: String,
    pub region: String,
    pub bucket: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    /// Public base URL objects are served from. Blank means "serve from the endpoint".
    pub public_url_prefix: String,
}

impl S3Config {
    /// Public URL of an object key.
    ///
    /// Uses the public prefix when one is set, otherwise the path-style
    /// `<endpoint>/<bucket>/<key>` address.
    pub fn public_url_for(&self, key: &str) -> String {
        let prefix = self.public_url_prefix.trim();
        if !prefix.is_empty() {
            return format!("{}/{key}", prefix.trim_end_matches('/'));
        }

        let endpoint = self.endpoint.trim_end_matches('/');
        format!("{endpoint}/{}/{key}", self.bucket)
    }
}

/// Blob store writing to an S3-compatible bucket.
#[derive(Clone)]
pub struct S3BlobStore {
    config: S3Config,
    operator: opendal::Operator,
}

impl S3BlobStore {
    pub fn new(config: S3Config) -> Result<Self, BlobStoreError> {
        let builder = opendal::services::S3::default()
            .endpoint(&config.endpoint)
            .region(&config.region)
            .bucket(&config.bucket)
            .access_key_id(&config.access_key_id)
            .secret_access_key(&config.secret_access_key);

        let operator = opendal::Operator::new(builder)
            .map(|op| op.finish())
            .map_err(|e| BlobStoreError::transport(e.to_string()))?;

        Ok(Self { config, operator })
    }

    pub fn config(&self) -> &S3Config {
        &self.config
    }
}

impl BlobStore for S3BlobStore {
    async fn store(&self, upload: BlobUpload) -> Result<String, BlobStoreError> {
        let key = object_key_for(&upload.name, &upload.content_type);
        let size = upload.size();

        debug!(
            key = %key,
            bucket = %self.config.bucket,
            size,
            content_type = %upload.content_type,
            "Storing object"
        );

        let mut write = self.operator.write_with(&key, upload.bytes);
        if !upload.content_type.is_empty() {
            write = write.content_type(&upload.content_type);
        }

        if let Err(e) = write.await {
            warn!(key = %key, error = %e, "Object store write failed");
            return Err(BlobStoreError::from(e));
        }

        Ok(self.config.public_url_for(&key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(prefix: &str) -> S3Config {
        S3Config {
            endpoint: "https://s3.example.com/".to_owned(),
            region: "auto".to_owned(),
            bucket: "attachments".to_owned(),
            access_key_id: "key".to_owned(),
            secret_access_key: "secret".to_owned(),
            public_url_prefix: prefix.to_owned(),
        }
    }

    #[test]
    fn test_public_url_uses_prefix() {
        let cfg = config("  https://cdn.example/  ");
        assert_eq!(cfg.public_url_for("abc.png"), "https://cdn.example/abc.png");
    }

    #[test]
    fn test_public_url_falls_back_to_endpoint_and_bucket() {
        let cfg = config("   ");
        assert_eq!(
            cfg.public_url_for("abc.png"),
            "https://s3.example.com/attachments/abc.png"
        );
    }

    #[test]
    fn test_store_builds_from_config() {
        let store = S3BlobStore::new(config("")).expect("operator should build");
        assert_eq!(store.config().bucket, "attachments");
    }
}
