//! Upload orchestration and cross-reference rewriting.
//!
//! Hosts deliver paste, drop, canvas paste and "upload local image" events
//! through an [`EventBus`]. The [`Orchestrator`] checks each event, asks for
//! confirmation through the [`gate`], uploads through an
//! [`UploadCoordinator`] that keeps a placeholder in the live buffer meanwhile,
//! and for local images offers to rewrite every other note referencing the
//! uploaded file ([`rewriter`]).

pub mod buffer;
pub mod coordinator;
pub mod events;
pub mod gate;
pub mod host;
pub mod in_flight;
pub mod links;
pub mod messages;
pub mod orchestrator;
pub mod placeholder;
pub mod references;
pub mod rewriter;
pub mod settings;
mod test_utils;
pub mod vault;

pub use buffer::{Position, StringBuffer, TextBuffer};
pub use coordinator::{FailureKind, UploadCoordinator, UploadFailure, UploadOutcome, UploadRequest};
pub use events::{
    CanvasPasteEvent, Disposition, DropEvent, EventBus, EventHandler, EventKind, HandlerId,
    HostEvent, LocalUploadEvent, PasteEvent,
};
pub use gate::{GateDecision, GateOutcome, PromptResponse, UploadPrompt};
pub use host::{CanvasSurface, DefaultHandler, Notifier, ProgressIndicator, RewritePrompt};
pub use in_flight::{FileIdentity, InFlightGuard, InFlightSet};
pub use links::{Link, LinkStyle, link_at, links_in_line, parse_link};
pub use orchestrator::{HANDLED_EVENTS, HostServices, LocalImage, Orchestrator};
pub use placeholder::{PlaceholderId, Resolution};
pub use references::{
    OriginatingReference, Reference, ReferenceGroup, ReferenceIndex, RewriteStats,
    find_references, references_in_document,
};
pub use rewriter::{RewriteError, RewritePlan, RewriteReport, apply_rewrite, propose_rewrite};
pub use settings::{Settings, SettingsError, SettingsStore, SharedSettings, build_uploader_from};
pub use vault::{
    FileStat, MemoryVault, Vault, VaultError, VaultFiles, is_note, resolve_among,
};
