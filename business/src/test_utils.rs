//! Recording host collaborators for orchestrator tests.
//!
//! # Example
//!
//! ```ignore
//! let host = TestHost::new();
//! host.store.respond_with_url("https://cdn.example/abc.png");
//! let orchestrator = host.orchestrator(false);
//!
//! let buffer = Arc::new(StringBuffer::with_cursor_at_end(""));
//! orchestrator.on_paste(PasteEvent::new(vec![png("a.png")], buffer.clone())).await;
//! assert_eq!(buffer.text(), "![](https://cdn.example/abc.png)\n");
//! ```

#![cfg(test)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use imgdrop_input::HostFile;
use imgdrop_storage::MockBlobStore;

use crate::events::{CanvasPasteEvent, DropEvent, PasteEvent};
use crate::gate::{PromptResponse, UploadPrompt};
use crate::host::{CanvasSurface, DefaultHandler, Notifier, ProgressIndicator, RewritePrompt};
use crate::orchestrator::{HostServices, Orchestrator};
use crate::references::RewriteStats;
use crate::settings::{Settings, SettingsError, SettingsStore, SharedSettings};
use crate::vault::MemoryVault;

pub fn png(name: &str) -> HostFile {
    HostFile::new(name, name.as_bytes().to_vec(), "image/png", 1_700_000_000_000)
}

#[derive(Default)]
pub struct MemorySettingsStore {
    saved: Mutex<Option<Settings>>,
    fail_saves: Mutex<bool>,
}

impl MemorySettingsStore {
    pub fn saved(&self) -> Option<Settings> {
        self.saved.lock().unwrap().clone()
    }

    pub fn fail_saves(&self) {
        *self.fail_saves.lock().unwrap() = true;
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn load(&self) -> Result<Option<Settings>, SettingsError> {
        Ok(self.saved())
    }

    async fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        if *self.fail_saves.lock().unwrap() {
            return Err(SettingsError::Write("disk full".to_owned()));
        }
        *self.saved.lock().unwrap() = Some(settings.clone());
        Ok(())
    }
}

/// Answers prompts from a script; dismisses once the script runs out.
#[derive(Default)]
pub struct ScriptedUploadPrompt {
    responses: Mutex<VecDeque<PromptResponse>>,
    asked: Mutex<usize>,
}

impl ScriptedUploadPrompt {
    pub fn new(responses: impl IntoIterator<Item = PromptResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
            asked: Mutex::new(0),
        }
    }

    pub fn push(&self, response: PromptResponse) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn asked(&self) -> usize {
        *self.asked.lock().unwrap()
    }
}

#[async_trait]
impl UploadPrompt for ScriptedUploadPrompt {
    async fn ask(&self) -> PromptResponse {
        *self.asked.lock().unwrap() += 1;
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(PromptResponse::DISMISSED)
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<String>>,
    dialogs: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn notices(&self) -> Vec<String> {
        self.notices.lock().unwrap().clone()
    }

    pub fn dialogs(&self) -> Vec<(String, String)> {
        self.dialogs.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notice(&self, message: &str) {
        self.notices.lock().unwrap().push(message.to_owned());
    }

    fn error_dialog(&self, title: &str, body: &str) {
        self.dialogs
            .lock()
            .unwrap()
            .push((title.to_owned(), body.to_owned()));
    }
}

/// Confirms or refuses every rewrite, recording what it was shown.
#[derive(Default)]
pub struct ScriptedRewritePrompt {
    accept: Mutex<bool>,
    asked: Mutex<Vec<(String, RewriteStats)>>,
}

impl ScriptedRewritePrompt {
    pub fn accept(&self, accept: bool) {
        *self.accept.lock().unwrap() = accept;
    }

    pub fn asked(&self) -> Vec<(String, RewriteStats)> {
        self.asked.lock().unwrap().clone()
    }
}

#[async_trait]
impl RewritePrompt for ScriptedRewritePrompt {
    async fn confirm_rewrite(&self, resource: &str, stats: RewriteStats) -> bool {
        self.asked.lock().unwrap().push((resource.to_owned(), stats));
        *self.accept.lock().unwrap()
    }
}

#[derive(Default)]
pub struct RecordingDefaultHandler {
    pastes: Mutex<Vec<PasteEvent>>,
    drops: Mutex<Vec<DropEvent>>,
    canvas_pastes: Mutex<Vec<CanvasPasteEvent>>,
}

impl RecordingDefaultHandler {
    pub fn pastes(&self) -> Vec<PasteEvent> {
        self.pastes.lock().unwrap().clone()
    }

    pub fn drops(&self) -> Vec<DropEvent> {
        self.drops.lock().unwrap().clone()
    }

    pub fn canvas_pastes(&self) -> Vec<CanvasPasteEvent> {
        self.canvas_pastes.lock().unwrap().clone()
    }
}

#[async_trait]
impl DefaultHandler for RecordingDefaultHandler {
    async fn handle_paste(&self, event: PasteEvent) {
        self.pastes.lock().unwrap().push(event);
    }

    async fn handle_drop(&self, event: DropEvent) {
        self.drops.lock().unwrap().push(event);
    }

    async fn handle_canvas_paste(&self, event: CanvasPasteEvent) {
        self.canvas_pastes.lock().unwrap().push(event);
    }
}

#[derive(Default)]
pub struct RecordingCanvas {
    nodes: Mutex<Vec<String>>,
}

impl RecordingCanvas {
    pub fn nodes(&self) -> Vec<String> {
        self.nodes.lock().unwrap().clone()
    }
}

impl CanvasSurface for RecordingCanvas {
    fn create_text_node_at_center(&self, text: &str) {
        self.nodes.lock().unwrap().push(text.to_owned());
    }
}

#[derive(Default)]
pub struct FakeProgress {
    open: Mutex<bool>,
    opened: Mutex<usize>,
}

impl FakeProgress {
    /// Simulates the user closing the modal.
    pub fn dismiss(&self) {
        *self.open.lock().unwrap() = false;
    }

    pub fn opened(&self) -> usize {
        *self.opened.lock().unwrap()
    }
}

impl ProgressIndicator for FakeProgress {
    fn open(&self) {
        *self.open.lock().unwrap() = true;
        *self.opened.lock().unwrap() += 1;
    }

    fn close(&self) {
        *self.open.lock().unwrap() = false;
    }

    fn is_open(&self) -> bool {
        *self.open.lock().unwrap()
    }
}

/// A full set of recording collaborators around a [`MockBlobStore`].
#[derive(Default)]
pub struct TestHost {
    pub store: MockBlobStore,
    pub notifier: Arc<RecordingNotifier>,
    pub upload_prompt: Arc<ScriptedUploadPrompt>,
    pub rewrite_prompt: Arc<ScriptedRewritePrompt>,
    pub default_handler: Arc<RecordingDefaultHandler>,
    pub progress: Arc<FakeProgress>,
    pub vault: Arc<MemoryVault>,
    pub settings_store: Arc<MemorySettingsStore>,
}

impl TestHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn services(&self) -> HostServices {
        HostServices {
            notifier: self.notifier.clone(),
            upload_prompt: self.upload_prompt.clone(),
            rewrite_prompt: self.rewrite_prompt.clone(),
            default_handler: self.default_handler.clone(),
            progress: self.progress.clone(),
            vault: self.vault.clone(),
            index: self.vault.clone(),
        }
    }

    pub fn shared_settings(&self, ask: bool) -> SharedSettings {
        let settings = Settings {
            show_remote_upload_confirmation: ask,
            ..Settings::default()
        };
        SharedSettings::new(settings, self.settings_store.clone())
    }

    /// Orchestrator uploading to the mock store.
    pub fn orchestrator(&self, ask: bool) -> Orchestrator<MockBlobStore> {
        Orchestrator::new(self.services(), self.shared_settings(ask), Some(self.store.clone()))
    }

    /// Orchestrator with no store configured.
    pub fn unconfigured_orchestrator(&self) -> Orchestrator<MockBlobStore> {
        Orchestrator::new(self.services(), self.shared_settings(false), None)
    }
}
