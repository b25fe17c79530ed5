//! Upload the local image linked in a note.

use std::path::Path;

use anyhow::{Context as _, Result, bail};
use imgdrop_business::{
    Disposition, HostEvent, LocalUploadEvent, Position, TextBuffer as _, links_in_line,
};
use imgdrop_storage::BlobStore;
use tracing::instrument;

use super::locate_note;
use crate::output::Output;
use crate::session::Session;

/// Run the upload command for the link at `line` (1-based) of `note`.
///
/// Without `ch`, the first local link on the line is used.
#[instrument(skip(session), name = "upload_local")]
pub async fn run_upload<S: BlobStore>(
    session: &Session<S>,
    note: &Path,
    line: usize,
    ch: Option<usize>,
) -> Result<()> {
    let out = Output::new();

    let note_path = locate_note(&session.vault, note)?;
    let buffer = session.vault.open_note(&note_path)?;

    if line == 0 {
        bail!("Lines are numbered from 1");
    }
    let Some(text) = buffer.line(line - 1) else {
        bail!("{note_path} has no line {line}");
    };

    let ch = match ch {
        Some(ch) => ch.saturating_sub(1),
        None => links_in_line(&text)
            .iter()
            .find(|link| !link.is_remote())
            .map(|link| link.start)
            .with_context(|| format!("No local link on line {line} of {note_path}"))?,
    };
    buffer.set_cursor(Position::new(line - 1, ch));

    let event = LocalUploadEvent {
        note_path: note_path.clone(),
        buffer: buffer.clone(),
    };
    if !session.orchestrator.can_upload_local(&event) {
        out.warning(format!(
            "No local image link at {note_path}:{line}:{}",
            ch + 1
        ));
        return Ok(());
    }

    let revision = buffer.revision();
    if session.dispatch(HostEvent::UploadLocal(event)).await == Disposition::Ignored {
        out.warning("Upload not applicable here");
    }

    session.finish()?;
    if buffer.revision() != revision {
        out.success(format!("Updated {note_path}"));
    }
    Ok(())
}
