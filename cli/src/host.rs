//! Terminal implementations of the host collaborators.

use std::io::IsTerminal as _;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use imgdrop_business::{
    CanvasPasteEvent, DefaultHandler, DropEvent, Notifier, PasteEvent, ProgressIndicator,
    PromptResponse, RewritePrompt, RewriteStats, TextBuffer, UploadPrompt,
};
use imgdrop_input::HostFile;
use inquire::{Confirm, InquireError, Select};
use tracing::{debug, warn};

use crate::output::Output;
use crate::vault::FsVault;

pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notice(&self, message: &str) {
        Output::new().info(message);
    }

    fn error_dialog(&self, title: &str, body: &str) {
        Output::new().error(format!("{title}: {body}"));
    }
}

const UPLOAD: &str = "Upload";
const ALWAYS_UPLOAD: &str = "Upload and always upload";
const PASTE_LOCALLY: &str = "Paste locally";

fn interactive() -> bool {
    std::io::stdin().is_terminal()
}

/// Upload confirmation as a terminal select.
///
/// Without a terminal on stdin the prompt counts as dismissed.
pub struct InquireUploadPrompt;

fn ask_upload() -> Result<PromptResponse, InquireError> {
    let choice = Select::new(
        "Upload to the remote store?",
        vec![UPLOAD, ALWAYS_UPLOAD, PASTE_LOCALLY],
    )
    .with_help_message("Esc to cancel")
    .prompt_skippable()?;

    Ok(match choice {
        Some(UPLOAD) => PromptResponse::UPLOAD,
        Some(ALWAYS_UPLOAD) => PromptResponse::ALWAYS_UPLOAD,
        Some(_) => PromptResponse::DECLINE,
        None => PromptResponse::DISMISSED,
    })
}

#[async_trait]
impl UploadPrompt for InquireUploadPrompt {
    async fn ask(&self) -> PromptResponse {
        if !interactive() {
            debug!("no terminal, upload prompt dismissed");
            return PromptResponse::DISMISSED;
        }

        match tokio::task::spawn_blocking(ask_upload).await {
            Ok(Ok(response)) => response,
            Ok(Err(err)) => {
                debug!(error = %err, "upload prompt closed");
                PromptResponse::DISMISSED
            }
            Err(err) => {
                warn!(error = %err, "upload prompt task failed");
                PromptResponse::DISMISSED
            }
        }
    }
}

/// Rewrite confirmation. Declines without a terminal.
pub struct InquireRewritePrompt;

#[async_trait]
impl RewritePrompt for InquireRewritePrompt {
    async fn confirm_rewrite(&self, resource: &str, stats: RewriteStats) -> bool {
        if !interactive() {
            return false;
        }

        let message = format!(
            "Replace {} other link(s) to {resource} in {} file(s) with the uploaded URL?",
            stats.links, stats.files
        );
        let answer = tokio::task::spawn_blocking(move || {
            Confirm::new(&message).with_default(false).prompt_skippable()
        })
        .await;

        match answer {
            Ok(Ok(choice)) => choice.unwrap_or(false),
            Ok(Err(err)) => {
                debug!(error = %err, "rewrite prompt closed");
                false
            }
            Err(err) => {
                warn!(error = %err, "rewrite prompt task failed");
                false
            }
        }
    }
}

#[derive(Default)]
pub struct TerminalProgress {
    open: AtomicBool,
}

impl ProgressIndicator for TerminalProgress {
    fn open(&self) {
        self.open.store(true, Ordering::SeqCst);
        Output::new().dim("Uploading...");
    }

    fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}

/// What the host does by itself with files it is given: store them as
/// attachments at the vault root and embed them at the cursor.
pub struct FsDefaultHandler {
    vault: Arc<FsVault>,
}

impl FsDefaultHandler {
    pub fn new(vault: Arc<FsVault>) -> Self {
        Self { vault }
    }

    /// Saves `files` into the vault and embeds them at the cursor.
    pub fn attach(&self, files: &[HostFile], buffer: &dyn TextBuffer) {
        let mut embeds = Vec::new();
        for file in files {
            let path = match self.vault.add_attachment(&file.name, &file.bytes) {
                Ok(path) => path,
                Err(err) => {
                    Output::new().error(format!("{err:#}"));
                    continue;
                }
            };
            debug!(attachment = %path, size = file.size(), "attachment saved");
            embeds.push(format!("![[{path}]]"));
        }

        if !embeds.is_empty() {
            buffer.replace_selection(&embeds.join("\n"));
        }
    }
}

#[async_trait]
impl DefaultHandler for FsDefaultHandler {
    async fn handle_paste(&self, event: PasteEvent) {
        self.attach(&event.files, event.buffer.as_ref());
    }

    async fn handle_drop(&self, event: DropEvent) {
        self.attach(&event.files, event.buffer.as_ref());
    }

    async fn handle_canvas_paste(&self, event: CanvasPasteEvent) {
        warn!(files = event.files.len(), "canvas paste is not supported in the terminal");
    }
}
