//! Input sources for imgdrop: the files carried by paste and drop events.
//!
//! # Modules
//!
//! - [`file`]: the [`HostFile`] payload type and image detection
//! - [`clipboard`]: system clipboard access for paste events
//!
//! Input sources use trait-based abstractions for testability:
//! production implementations work with real system resources, mock
//! implementations enable unit testing without side effects.

pub mod clipboard;
pub mod file;

pub use clipboard::{ClipboardError, ClipboardProvider, SystemClipboard, files_from_uri_list};
pub use file::{HostFile, all_files_are_images, is_image};
