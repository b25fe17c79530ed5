//! Paste the clipboard's files into a note.

use std::path::Path;

use anyhow::{Context as _, Result};
use imgdrop_business::{Disposition, HostEvent, PasteEvent};
use imgdrop_input::{ClipboardProvider, SystemClipboard};
use imgdrop_storage::BlobStore;
use tracing::instrument;

use super::{cursor_to_end, locate_note};
use crate::output::{Output, format_size};
use crate::session::Session;

/// Run the paste command with the system clipboard.
pub async fn run_paste<S: BlobStore>(session: &Session<S>, note: &Path) -> Result<()> {
    run_paste_with_clipboard(session, note, &SystemClipboard).await
}

/// Run the paste command with a custom clipboard.
#[instrument(skip_all, name = "paste_clipboard")]
pub async fn run_paste_with_clipboard<S: BlobStore, C: ClipboardProvider>(
    session: &Session<S>,
    note: &Path,
    clipboard: &C,
) -> Result<()> {
    let out = Output::new();

    let note_path = locate_note(&session.vault, note)?;
    let files = clipboard.get_files().context("Failed to read the clipboard")?;
    if files.is_empty() {
        out.warning("Clipboard holds no file or image");
        return Ok(());
    }
    for file in &files {
        out.file_item(&file.name, &file.mime_type, format_size(file.size()));
    }

    let buffer = session.vault.open_note(&note_path)?;
    cursor_to_end(&buffer);

    let event = PasteEvent::new(files.clone(), buffer.clone());
    if session.dispatch(HostEvent::EditorPaste(event)).await == Disposition::Ignored {
        session.default_handler.attach(&files, buffer.as_ref());
    }

    session.finish()?;
    out.success(format!("Updated {note_path}"));
    Ok(())
}
