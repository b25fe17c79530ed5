//! Uploader settings and their persistence.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use imgdrop_storage::{ImageTypeFixingStore, S3BlobStore, S3Config};
use serde::{Deserialize, Serialize};

/// Persisted settings.
///
/// Keys are camelCase so existing data files load unchanged. Missing keys
/// take their default value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub s3_endpoint: String,
    pub s3_region: String,
    pub s3_bucket: String,
    pub s3_access_key_id: String,
    pub s3_secret_access_key: String,
    pub public_url_prefix: String,
    /// Ask before uploading. Cleared by "always upload".
    pub show_remote_upload_confirmation: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            s3_endpoint: String::new(),
            s3_region: "auto".to_owned(),
            s3_bucket: String::new(),
            s3_access_key_id: String::new(),
            s3_secret_access_key: String::new(),
            public_url_prefix: String::new(),
            show_remote_upload_confirmation: true,
        }
    }
}

impl Settings {
    /// Store configuration, if every required field is filled in.
    pub fn s3_config(&self) -> Option<S3Config> {
        let required = [
            &self.s3_endpoint,
            &self.s3_region,
            &self.s3_bucket,
            &self.s3_access_key_id,
            &self.s3_secret_access_key,
        ];
        if required.iter().any(|value| value.trim().is_empty()) {
            return None;
        }

        Some(S3Config {
            endpoint: self.s3_endpoint.trim().to_owned(),
            region: self.s3_region.trim().to_owned(),
            bucket: self.s3_bucket.trim().to_owned(),
            access_key_id: self.s3_access_key_id.trim().to_owned(),
            secret_access_key: self.s3_secret_access_key.trim().to_owned(),
            public_url_prefix: self.public_url_prefix.trim().to_owned(),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.s3_config().is_some()
    }
}

/// The store uploads go to, or `None` while the settings are incomplete.
pub fn build_uploader_from(settings: &Settings) -> Option<ImageTypeFixingStore<S3BlobStore>> {
    let config = settings.s3_config()?;
    match S3BlobStore::new(config) {
        Ok(store) => Some(ImageTypeFixingStore::new(store)),
        Err(err) => {
            log::warn!(target: "imgdrop_business::settings", "uploader_unavailable error={err}");
            None
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Failed to read settings: {0}")]
    Read(String),
    #[error("Failed to write settings: {0}")]
    Write(String),
    #[error("Invalid settings: {0}")]
    Parse(String),
}

/// Where settings live between sessions.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Saved settings, or `None` when nothing was saved yet.
    async fn load(&self) -> Result<Option<Settings>, SettingsError>;

    async fn save(&self, settings: &Settings) -> Result<(), SettingsError>;
}

/// Settings shared by every orchestrator, with the store they persist to.
#[derive(Clone)]
pub struct SharedSettings {
    current: Arc<RwLock<Settings>>,
    store: Arc<dyn SettingsStore>,
}

impl SharedSettings {
    pub fn new(settings: Settings, store: Arc<dyn SettingsStore>) -> Self {
        Self {
            current: Arc::new(RwLock::new(settings)),
            store,
        }
    }

    /// Loads from `store`, falling back to defaults when nothing was saved.
    pub async fn load(store: Arc<dyn SettingsStore>) -> Result<Self, SettingsError> {
        let settings = store.load().await?.unwrap_or_default();
        Ok(Self::new(settings, store))
    }

    fn read(&self) -> RwLockReadGuard<'_, Settings> {
        self.current.read().expect("lock poisoned")
    }

    fn write(&self) -> RwLockWriteGuard<'_, Settings> {
        self.current.write().expect("lock poisoned")
    }

    pub fn snapshot(&self) -> Settings {
        self.read().clone()
    }

    pub fn confirmation_required(&self) -> bool {
        self.read().show_remote_upload_confirmation
    }

    /// Applies `change` and saves the result.
    pub async fn update(
        &self,
        change: impl FnOnce(&mut Settings) + Send,
    ) -> Result<(), SettingsError> {
        let snapshot = {
            let mut settings = self.write();
            change(&mut settings);
            settings.clone()
        };
        self.store.save(&snapshot).await
    }

    /// Stops asking before uploads, now and in later sessions.
    pub async fn set_always_upload(&self) -> Result<(), SettingsError> {
        self.update(|settings| settings.show_remote_upload_confirmation = false)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MemorySettingsStore;

    fn configured() -> Settings {
        Settings {
            s3_endpoint: "https://s3.example.com".to_owned(),
            s3_bucket: "images".to_owned(),
            s3_access_key_id: "key".to_owned(),
            s3_secret_access_key: "secret".to_owned(),
            ..Settings::default()
        }
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.s3_region, "auto");
        assert!(settings.show_remote_upload_confirmation);
        assert!(!settings.is_configured());
    }

    #[test]
    fn test_missing_keys_merge_over_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{"s3Bucket":"pics","showRemoteUploadConfirmation":false}"#)
                .unwrap();

        assert_eq!(settings.s3_bucket, "pics");
        assert_eq!(settings.s3_region, "auto");
        assert!(!settings.show_remote_upload_confirmation);
    }

    #[test]
    fn test_serialized_keys_are_camel_case() {
        let json = serde_json::to_value(Settings::default()).unwrap();
        assert!(json.get("s3AccessKeyId").is_some());
        assert!(json.get("publicUrlPrefix").is_some());
        assert!(json.get("showRemoteUploadConfirmation").is_some());
    }

    #[test]
    fn test_s3_config_requires_every_field() {
        assert!(configured().s3_config().is_some());

        let mut missing_secret = configured();
        missing_secret.s3_secret_access_key = "  ".to_owned();
        assert!(missing_secret.s3_config().is_none());

        let mut blank_region = configured();
        blank_region.s3_region.clear();
        assert!(blank_region.s3_config().is_none());
    }

    #[test]
    fn test_public_prefix_is_optional() {
        let config = configured().s3_config().unwrap();
        assert_eq!(config.public_url_prefix, "");
        assert_eq!(config.region, "auto");
    }

    #[test]
    fn test_build_uploader_needs_configuration() {
        assert!(build_uploader_from(&Settings::default()).is_none());
        assert!(build_uploader_from(&configured()).is_some());
    }

    #[tokio::test]
    async fn test_load_without_saved_data_uses_defaults() {
        let store = Arc::new(MemorySettingsStore::default());
        let shared = SharedSettings::load(store).await.unwrap();
        assert_eq!(shared.snapshot(), Settings::default());
    }

    #[tokio::test]
    async fn test_set_always_upload_persists() {
        let store = Arc::new(MemorySettingsStore::default());
        let shared = SharedSettings::new(Settings::default(), store.clone());

        shared.set_always_upload().await.unwrap();

        assert!(!shared.confirmation_required());
        let saved = store.saved().expect("settings saved");
        assert!(!saved.show_remote_upload_confirmation);
    }
}
