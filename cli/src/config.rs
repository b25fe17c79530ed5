//! Settings file handling for the CLI.
//!
//! Settings live in `$XDG_CONFIG_HOME/imgdrop/config.toml` following the XDG
//! Base Directory Specification, with the same camelCase keys as the plugin's
//! data file.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result, bail};
use async_trait::async_trait;
use directories::ProjectDirs;
use imgdrop_business::{Settings, SettingsError, SettingsStore};

/// Get the settings file path.
///
/// Returns `$XDG_CONFIG_HOME/imgdrop/config.toml` on Linux,
/// appropriate paths on other platforms.
pub fn config_path() -> Result<PathBuf> {
    let project_dirs = ProjectDirs::from("com", "imgdrop", "imgdrop")
        .context("Failed to determine config directory")?;

    Ok(project_dirs.config_dir().join("config.toml"))
}

/// [`SettingsStore`] backed by a TOML file.
#[derive(Debug, Clone)]
pub struct TomlSettingsStore {
    path: PathBuf,
}

impl TomlSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the default location.
    pub fn default_location() -> Result<Self> {
        Ok(Self::new(config_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load settings from disk. Returns `None` if the file doesn't exist.
    pub fn read(&self) -> Result<Option<Settings>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read config file: {}", self.path.display()))?;

        let settings = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", self.path.display()))?;

        Ok(Some(settings))
    }

    /// Save settings to disk, creating the config directory if needed.
    pub fn write(&self, settings: &Settings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = toml::to_string_pretty(settings).context("Failed to serialize settings")?;

        fs::write(&self.path, content)
            .with_context(|| format!("Failed to write config file: {}", self.path.display()))?;

        Ok(())
    }
}

#[async_trait]
impl SettingsStore for TomlSettingsStore {
    async fn load(&self) -> Result<Option<Settings>, SettingsError> {
        self.read().map_err(|e| SettingsError::Read(format!("{e:#}")))
    }

    async fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        self.write(settings)
            .map_err(|e| SettingsError::Write(format!("{e:#}")))
    }
}

const SECRET_KEYS: [&str; 2] = ["s3AccessKeyId", "s3SecretAccessKey"];

/// Setting keys as written in the file, with their current value.
///
/// Secrets are masked.
pub fn display_entries(settings: &Settings) -> Result<Vec<(String, String)>> {
    let value = serde_json::to_value(settings).context("Failed to serialize settings")?;
    let Some(map) = value.as_object() else {
        bail!("Settings did not serialize to a table");
    };

    Ok(map
        .iter()
        .map(|(key, value)| {
            let shown = match value {
                serde_json::Value::String(s) if SECRET_KEYS.contains(&key.as_str()) => mask(s),
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (key.clone(), shown)
        })
        .collect())
}

fn mask(secret: &str) -> String {
    if secret.is_empty() {
        return String::new();
    }
    let visible: String = secret.chars().take(4).collect();
    format!("{visible}****")
}

/// Returns `settings` with `key` set to `value`.
pub fn with_setting(settings: &Settings, key: &str, value: &str) -> Result<Settings> {
    let mut json = serde_json::to_value(settings).context("Failed to serialize settings")?;
    let Some(slot) = json.get_mut(key) else {
        bail!("Unknown setting: {key}");
    };

    let updated = match slot {
        serde_json::Value::Bool(_) => {
            let parsed: bool = value
                .parse()
                .with_context(|| format!("{key} expects true or false, got {value:?}"))?;
            serde_json::Value::Bool(parsed)
        }
        _ => serde_json::Value::String(value.to_owned()),
    };
    *slot = updated;

    serde_json::from_value(json).context("Failed to apply setting")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_loads_nothing() {
        let dir = tempfile::tempdir().expect("Should create temp dir");
        let store = TomlSettingsStore::new(dir.path().join("config.toml"));
        assert!(store.read().expect("Should read").is_none());
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().expect("Should create temp dir");
        let store = TomlSettingsStore::new(dir.path().join("nested/config.toml"));
        let settings = Settings {
            s3_bucket: "images".to_owned(),
            show_remote_upload_confirmation: false,
            ..Settings::default()
        };

        store.write(&settings).expect("Should write");
        let content = fs::read_to_string(store.path()).expect("Should read file");
        assert!(content.contains("s3Bucket = \"images\""));

        assert_eq!(store.read().expect("Should read"), Some(settings));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().expect("Should create temp dir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "s3Endpoint = \"https://s3.example\"\n").expect("Should write");

        let settings = TomlSettingsStore::new(path)
            .read()
            .expect("Should read")
            .expect("Should exist");
        assert_eq!(settings.s3_endpoint, "https://s3.example");
        assert_eq!(settings.s3_region, "auto");
        assert!(settings.show_remote_upload_confirmation);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().expect("Should create temp dir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "s3Bucket = [").expect("Should write");
        assert!(TomlSettingsStore::new(path).read().is_err());
    }

    #[test]
    fn test_with_setting() {
        let settings = with_setting(&Settings::default(), "s3Bucket", "pics").expect("Should set");
        assert_eq!(settings.s3_bucket, "pics");

        let settings = with_setting(&settings, "showRemoteUploadConfirmation", "false")
            .expect("Should set");
        assert!(!settings.show_remote_upload_confirmation);

        assert!(with_setting(&settings, "showRemoteUploadConfirmation", "nope").is_err());
        assert!(with_setting(&settings, "unknownKey", "x").is_err());
    }

    #[test]
    fn test_display_masks_secrets() {
        let settings = Settings {
            s3_secret_access_key: "supersecret".to_owned(),
            ..Settings::default()
        };
        let entries = display_entries(&settings).expect("Should list");

        let secret = entries
            .iter()
            .find(|(key, _)| key == "s3SecretAccessKey")
            .expect("Should list secret");
        assert_eq!(secret.1, "supe****");

        let region = entries.iter().find(|(key, _)| key == "s3Region").expect("Should list region");
        assert_eq!(region.1, "auto");
    }
}
