//! Clipboard access for paste events.
//!
//! Turns whatever the system clipboard holds into the file list a paste event
//! carries.
//!
//! # Architecture
//!
//! - [`ClipboardProvider`]: generic interface for clipboard access
//! - [`SystemClipboard`]: production implementation using the arboard crate (native only)
//!
//! # File URI Support
//!
//! On Linux file managers (like Dolphin, Nautilus), copying an image file
//! places a `file://` URI in the clipboard rather than the image data. Such URIs
//! are preferred: the original file bytes, name and mtime are kept, one file per
//! URI. Only when there are none is the clipboard bitmap encoded as a PNG.

use crate::file::HostFile;

/// Error types for clipboard operations.
#[derive(Debug, thiserror::Error)]
pub enum ClipboardError {
    /// Failed to access the clipboard.
    #[error("Clipboard access error: {0}")]
    AccessError(String),
    /// Image encoding failed.
    #[error("Image processing error: {0}")]
    ImageError(String),
}

/// Trait for clipboard access, enabling mock implementations for testing.
pub trait ClipboardProvider {
    /// Files currently on the clipboard.
    ///
    /// # Returns
    /// - `Ok(files)`, empty when the clipboard holds no file or image
    /// - `Err(...)` if clipboard access failed
    fn get_files(&self) -> Result<Vec<HostFile>, ClipboardError>;
}

/// System clipboard implementation using the `arboard` crate.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Default, Clone, Copy)]
pub struct SystemClipboard;

#[cfg(not(target_arch = "wasm32"))]
impl ClipboardProvider for SystemClipboard {
    fn get_files(&self) -> Result<Vec<HostFile>, ClipboardError> {
        use arboard::Clipboard;

        let mut clipboard =
            Clipboard::new().map_err(|e| ClipboardError::AccessError(e.to_string()))?;

        if let Ok(text) = clipboard.get_text() {
            let files = files_from_uri_list(&text);
            if !files.is_empty() {
                return Ok(files);
            }
        }

        match clipboard.get_image() {
            Ok(image_data) => {
                let png_data =
                    encode_rgba_to_png(image_data.width, image_data.height, &image_data.bytes)?;

                let now = chrono::Utc::now();
                let filename = format!("clipboard_{}.png", now.format("%Y%m%d_%H%M%S"));

                Ok(vec![HostFile::new(
                    filename,
                    png_data,
                    "image/png",
                    now.timestamp_millis(),
                )])
            }
            Err(arboard::Error::ContentNotAvailable) => Ok(Vec::new()),
            Err(e) => Err(ClipboardError::AccessError(e.to_string())),
        }
    }
}

/// Encodes RGBA pixel data to PNG format.
#[cfg(not(target_arch = "wasm32"))]
fn encode_rgba_to_png(
    width: usize,
    height: usize,
    rgba_data: &[u8],
) -> Result<Vec<u8>, ClipboardError> {
    use image::{ImageBuffer, Rgba};

    let width = u32::try_from(width)
        .map_err(|_err| ClipboardError::ImageError("Image too wide".to_owned()))?;
    let height = u32::try_from(height)
        .map_err(|_err| ClipboardError::ImageError("Image too tall".to_owned()))?;

    let img: ImageBuffer<Rgba<u8>, Vec<u8>> =
        ImageBuffer::from_raw(width, height, rgba_data.to_vec())
            .ok_or_else(|| ClipboardError::ImageError("Invalid image dimensions".to_owned()))?;

    let mut cursor = std::io::Cursor::new(Vec::new());
    img.write_to(&mut cursor, image::ImageFormat::Png)
        .map_err(|e| ClipboardError::ImageError(format!("Failed to encode PNG: {e}")))?;

    Ok(cursor.into_inner())
}

/// Loads every readable file named by a `file://` URI in clipboard text.
///
/// Clipboard text may list several files, one URI per line.
pub fn files_from_uri_list(text: &str) -> Vec<HostFile> {
    text.lines()
        .filter_map(extract_file_path_from_uri)
        .filter_map(|path| match HostFile::from_path(&path) {
            Ok(file) => Some(file),
            Err(e) => {
                log::trace!(
                    target: "imgdrop_input::clipboard",
                    "file_uri_unreadable path={path:?} error={e}",
                );
                None
            }
        })
        .collect()
}

/// Extracts a filesystem path from a file:// URI.
///
/// Handles URL decoding for paths with special characters (spaces, unicode, etc.)
fn extract_file_path_from_uri(uri: &str) -> Option<std::path::PathBuf> {
    let uri = uri.trim();

    if !uri.to_lowercase().starts_with("file://") {
        return None;
    }

    let path_str = &uri[7..];
    let decoded = urlencoding::decode(path_str).ok()?;
    let path = std::path::PathBuf::from(decoded.as_ref());

    if path.is_file() {
        Some(path)
    } else {
        log::trace!(
            target: "imgdrop_input::clipboard",
            "file_uri_not_found path={path:?}",
        );
        None
    }
}

/// Stub implementation for WASM (clipboard not yet supported).
#[cfg(target_arch = "wasm32")]
#[derive(Default, Clone, Copy)]
pub struct SystemClipboard;

#[cfg(target_arch = "wasm32")]
impl ClipboardProvider for SystemClipboard {
    fn get_files(&self) -> Result<Vec<HostFile>, ClipboardError> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockClipboardEmpty;

    impl ClipboardProvider for MockClipboardEmpty {
        fn get_files(&self) -> Result<Vec<HostFile>, ClipboardError> {
            Ok(Vec::new())
        }
    }

    struct MockClipboardError;

    impl ClipboardProvider for MockClipboardError {
        fn get_files(&self) -> Result<Vec<HostFile>, ClipboardError> {
            Err(ClipboardError::AccessError("Mock error".to_owned()))
        }
    }

    #[test]
    fn test_mock_clipboard_empty() {
        let files = MockClipboardEmpty.get_files().expect("should succeed");
        assert!(files.is_empty());
    }

    #[test]
    fn test_mock_clipboard_error() {
        assert!(MockClipboardError.get_files().is_err());
    }

    #[test]
    fn test_uri_list_loads_each_file() {
        let dir = tempfile::tempdir().expect("Should create temp dir");
        let first = dir.path().join("first image.png");
        let second = dir.path().join("second.jpg");
        std::fs::write(&first, b"one").expect("Should write");
        std::fs::write(&second, b"two").expect("Should write");

        let text = format!(
            "file://{}\nfile://{}\n",
            first.display().to_string().replace(' ', "%20"),
            second.display()
        );

        let files = files_from_uri_list(&text);
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].name, "first image.png");
        assert_eq!(files[0].mime_type, "image/png");
        assert_eq!(files[1].mime_type, "image/jpeg");
    }

    #[test]
    fn test_uri_list_skips_missing_and_plain_text() {
        let files = files_from_uri_list("hello\nfile:///definitely/not/here.png");
        assert!(files.is_empty());
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn test_encode_rgba_to_png() {
        let rgba = vec![255u8; 2 * 2 * 4];
        let png = encode_rgba_to_png(2, 2, &rgba).expect("Should encode");
        assert!(png.starts_with(&[0x89, 0x50, 0x4E, 0x47]));
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn test_encode_rejects_short_buffer() {
        assert!(encode_rgba_to_png(4, 4, &[0u8; 3]).is_err());
    }
}
