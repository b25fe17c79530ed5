//! Event orchestrators: paste, drop, local upload and canvas paste.
//!
//! Each one intercepts a host event, checks it is an image payload of the
//! expected shape, runs the confirmation gate and drives the upload
//! coordinator. Events the engine does not want go back to the host's
//! default handling untouched.

mod canvas;
mod drop;
mod local;
mod paste;

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use futures::future::join_all;
use imgdrop_input::HostFile;
use imgdrop_storage::BlobStore;

use crate::buffer::TextBuffer;
use crate::coordinator::{UploadCoordinator, UploadOutcome, UploadRequest};
use crate::events::{Disposition, EventHandler, EventKind, HostEvent};
use crate::gate::UploadPrompt;
use crate::host::{DefaultHandler, Notifier, ProgressIndicator, RewritePrompt};
use crate::in_flight::InFlightSet;
use crate::messages;
use crate::references::ReferenceIndex;
use crate::settings::SharedSettings;
use crate::vault::Vault;

pub use local::LocalImage;

/// Everything the host provides to the orchestrators.
#[derive(Clone)]
pub struct HostServices {
    pub notifier: Arc<dyn Notifier>,
    pub upload_prompt: Arc<dyn UploadPrompt>,
    pub rewrite_prompt: Arc<dyn RewritePrompt>,
    pub default_handler: Arc<dyn DefaultHandler>,
    pub progress: Arc<dyn ProgressIndicator>,
    pub vault: Arc<dyn Vault>,
    pub index: Arc<dyn ReferenceIndex>,
}

/// Handles the host events that can trigger uploads.
pub struct Orchestrator<S> {
    host: HostServices,
    settings: SharedSettings,
    in_flight: InFlightSet,
    coordinator: RwLock<Option<Arc<UploadCoordinator<S>>>>,
}

impl<S: BlobStore> Orchestrator<S> {
    /// `store` is `None` while the settings are incomplete.
    pub fn new(host: HostServices, settings: SharedSettings, store: Option<S>) -> Self {
        let in_flight = InFlightSet::new();
        let coordinator =
            store.map(|s| Arc::new(UploadCoordinator::with_in_flight(s, in_flight.clone())));
        Self {
            host,
            settings,
            in_flight,
            coordinator: RwLock::new(coordinator),
        }
    }

    /// Swaps the store after a settings change.
    pub fn reconfigure(&self, store: Option<S>) {
        let coordinator =
            store.map(|s| Arc::new(UploadCoordinator::with_in_flight(s, self.in_flight.clone())));
        *self.coordinator.write().expect("lock poisoned") = coordinator;
    }

    pub fn settings(&self) -> &SharedSettings {
        &self.settings
    }

    pub fn in_flight(&self) -> &InFlightSet {
        &self.in_flight
    }

    fn coordinator(&self) -> Option<Arc<UploadCoordinator<S>>> {
        self.coordinator.read().expect("lock poisoned").clone()
    }

    /// The coordinator, or a notice asking the user to configure the store.
    fn configured_coordinator(&self) -> Option<Arc<UploadCoordinator<S>>> {
        let coordinator = self.coordinator();
        if coordinator.is_none() {
            log::warn!(target: "imgdrop_business::orchestrator", "upload_without_store");
            self.host.notifier.notice(messages::NOT_CONFIGURED);
        }
        coordinator
    }

    /// Uploads every file concurrently at the cursor and waits for all of them.
    async fn upload_batch(
        &self,
        coordinator: &UploadCoordinator<S>,
        files: Vec<HostFile>,
        buffer: &dyn TextBuffer,
    ) -> Vec<UploadOutcome> {
        let uploads = files
            .into_iter()
            .map(|file| coordinator.upload(UploadRequest::from_file(file), buffer, None));
        let outcomes = join_all(uploads).await;

        let failed = outcomes.iter().filter(|o| o.is_failure()).count();
        if failed > 0 {
            log::warn!(
                target: "imgdrop_business::orchestrator",
                "batch_failed failed={failed} total={}",
                outcomes.len()
            );
            self.host.notifier.notice(messages::BATCH_UPLOAD_FAILED);
        }
        outcomes
    }
}

/// Event kinds an [`Orchestrator`] should be registered for.
pub const HANDLED_EVENTS: [EventKind; 4] = [
    EventKind::EditorPaste,
    EventKind::EditorDrop,
    EventKind::UploadLocal,
    EventKind::CanvasPaste,
];

#[async_trait]
impl<S: BlobStore> EventHandler for Orchestrator<S> {
    async fn handle(&self, event: HostEvent) -> Disposition {
        match event {
            HostEvent::EditorPaste(event) => self.on_paste(event).await,
            HostEvent::EditorDrop(event) => self.on_drop(event).await,
            HostEvent::UploadLocal(event) => self.on_local_upload(event).await,
            HostEvent::CanvasPaste(event) => self.on_canvas_paste(event).await,
        }
    }
}
