//! Wiring of one CLI invocation: vault, settings, orchestrator and event bus.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use imgdrop_business::{
    Disposition, EventBus, HANDLED_EVENTS, HostEvent, HostServices, Notifier, Orchestrator,
    RewritePrompt, SharedSettings, UploadPrompt, build_uploader_from,
};
use imgdrop_storage::{BlobStore, ImageTypeFixingStore, S3BlobStore};
use tracing::{debug, instrument};

use crate::config::TomlSettingsStore;
use crate::host::{
    FsDefaultHandler, InquireRewritePrompt, InquireUploadPrompt, TerminalNotifier,
    TerminalProgress,
};
use crate::vault::FsVault;

pub type Uploader = ImageTypeFixingStore<S3BlobStore>;

pub struct Session<S = Uploader> {
    pub vault: Arc<FsVault>,
    pub default_handler: Arc<FsDefaultHandler>,
    pub orchestrator: Arc<Orchestrator<S>>,
    bus: EventBus,
}

impl Session<Uploader> {
    /// Opens `vault_dir` with the S3 store described by the saved settings.
    #[instrument(skip_all, name = "open_session")]
    pub async fn open(vault_dir: &Path, settings_store: TomlSettingsStore) -> Result<Self> {
        let settings = SharedSettings::load(Arc::new(settings_store)).await?;
        let store = build_uploader_from(&settings.snapshot());
        debug!(configured = store.is_some(), "settings loaded");
        let vault_dir = vault_dir.to_path_buf();
        let vault = tokio::task::spawn_blocking(move || FsVault::new(vault_dir)).await??;
        Ok(Self::with_store(vault, settings, store, HostPrompts::terminal()))
    }
}

/// The interactive pieces of the host.
pub struct HostPrompts {
    pub upload: Arc<dyn UploadPrompt>,
    pub rewrite: Arc<dyn RewritePrompt>,
    pub notifier: Arc<dyn Notifier>,
}

impl HostPrompts {
    pub fn terminal() -> Self {
        Self {
            upload: Arc::new(InquireUploadPrompt),
            rewrite: Arc::new(InquireRewritePrompt),
            notifier: Arc::new(TerminalNotifier),
        }
    }
}

impl<S: BlobStore> Session<S> {
    pub fn with_store(
        vault: FsVault,
        settings: SharedSettings,
        store: Option<S>,
        prompts: HostPrompts,
    ) -> Self {
        let vault = Arc::new(vault);
        let default_handler = Arc::new(FsDefaultHandler::new(vault.clone()));

        let host = HostServices {
            notifier: prompts.notifier,
            upload_prompt: prompts.upload,
            rewrite_prompt: prompts.rewrite,
            default_handler: default_handler.clone(),
            progress: Arc::new(TerminalProgress::default()),
            vault: vault.clone(),
            index: vault.clone(),
        };
        let orchestrator = Arc::new(Orchestrator::new(host, settings, store));

        let mut bus = EventBus::new();
        for kind in HANDLED_EVENTS {
            bus.register(kind, orchestrator.clone());
        }

        Self {
            vault,
            default_handler,
            orchestrator,
            bus,
        }
    }

    pub async fn dispatch(&self, event: HostEvent) -> Disposition {
        self.bus.dispatch(event).await
    }

    /// Saves every note the session changed.
    pub fn finish(&self) -> Result<()> {
        self.vault.save_open_notes()
    }
}
