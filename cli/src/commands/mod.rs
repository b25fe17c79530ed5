//! Command implementations for the imgdrop CLI.
//!
//! Each subcommand is implemented in its own module.

pub mod completions;
pub mod config;
pub mod drop;
pub mod paste;
pub mod upload;

use std::path::Path;

use anyhow::Result;
use imgdrop_business::{Position, StringBuffer};

use crate::vault::FsVault;

pub use completions::generate_completions;
pub use config::run_config;
pub use drop::run_drop;
pub use paste::{run_paste, run_paste_with_clipboard};
pub use upload::run_upload;

/// Vault path of `note`, given relative to the vault, the working directory,
/// or absolute.
pub(crate) fn locate_note(vault: &FsVault, note: &Path) -> Result<String> {
    if note.is_relative() && vault.root().join(note).is_file() {
        return vault.vault_path(&vault.root().join(note));
    }
    vault.vault_path(note)
}

/// Moves the cursor of `buffer` past its last character.
pub(crate) fn cursor_to_end(buffer: &StringBuffer) {
    buffer.set_cursor(Position::default().advance(&buffer.text()));
}
