//! Drop files into a note.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use imgdrop_business::{Disposition, DropEvent, HostEvent};
use imgdrop_input::HostFile;
use imgdrop_storage::BlobStore;
use tracing::instrument;

use super::{cursor_to_end, locate_note};
use crate::output::{Output, format_size};
use crate::session::Session;

/// Run the drop command: `files` land at the end of `note`.
///
/// Drops the engine leaves alone are attached to the vault instead.
#[instrument(skip_all, name = "drop_files", fields(file_count = files.len()))]
pub async fn run_drop<S: BlobStore>(
    session: &Session<S>,
    note: &Path,
    files: &[PathBuf],
) -> Result<()> {
    let out = Output::new();

    let note_path = locate_note(&session.vault, note)?;
    let buffer = session.vault.open_note(&note_path)?;
    cursor_to_end(&buffer);

    let files = files
        .iter()
        .map(|path| {
            HostFile::from_path(path)
                .with_context(|| format!("Failed to read file: {}", path.display()))
        })
        .collect::<Result<Vec<_>>>()?;
    for file in &files {
        out.file_item(&file.name, &file.mime_type, format_size(file.size()));
    }

    let event = DropEvent::of_files(files.clone(), buffer.clone());
    if session.dispatch(HostEvent::EditorDrop(event)).await == Disposition::Ignored {
        session.default_handler.attach(&files, buffer.as_ref());
    }

    session.finish()?;
    out.success(format!("Updated {note_path}"));
    Ok(())
}
