//! Files as the host hands them over in paste and drop payloads.

use std::path::Path;
use std::time::UNIX_EPOCH;

/// A file carried by a paste or drop event.
///
/// Mirrors what an editor host knows about a transferred file: its name, its
/// bytes, the media type it declares and its last-modified time in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostFile {
    pub name: String,
    pub bytes: Vec<u8>,
    /// Declared media type. May be empty when the host could not tell.
    pub mime_type: String,
    /// Milliseconds since the Unix epoch.
    pub last_modified: i64,
}

impl HostFile {
    pub fn new(
        name: impl Into<String>,
        bytes: Vec<u8>,
        mime_type: impl Into<String>,
        last_modified: i64,
    ) -> Self {
        Self {
            name: name.into(),
            bytes,
            mime_type: mime_type.into(),
            last_modified,
        }
    }

    /// Reads a file from disk, guessing its media type from the extension.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let metadata = std::fs::metadata(path)?;
        let last_modified = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
            .unwrap_or_default();

        let name = path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();

        let mime_type = mime_guess::from_path(path)
            .first()
            .map(|m| m.essence_str().to_owned())
            .unwrap_or_default();

        log::trace!(
            target: "imgdrop_input::file",
            "host_file_loaded name={name} size={} type={mime_type}",
            bytes.len()
        );

        Ok(Self {
            name,
            bytes,
            mime_type,
            last_modified,
        })
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Whether the file declares an image media type.
pub fn is_image(file: &HostFile) -> bool {
    file.mime_type.starts_with("image/")
}

/// Whether the payload is non-empty and made of images only.
pub fn all_files_are_images(files: &[HostFile]) -> bool {
    !files.is_empty() && files.iter().all(is_image)
}
