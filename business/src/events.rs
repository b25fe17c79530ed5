//! Host events and the bus they are delivered through.

use std::sync::Arc;

use async_trait::async_trait;
use imgdrop_input::HostFile;

use crate::buffer::TextBuffer;
use crate::host::CanvasSurface;

/// Transfer type of a drop carrying files.
pub const FILES_TRANSFER_TYPE: &str = "Files";

#[derive(Clone)]
pub struct PasteEvent {
    pub files: Vec<HostFile>,
    pub buffer: Arc<dyn TextBuffer>,
    /// Set on copies handed back to the host's default handler.
    pub redelivered: bool,
}

impl PasteEvent {
    pub fn new(files: Vec<HostFile>, buffer: Arc<dyn TextBuffer>) -> Self {
        Self {
            files,
            buffer,
            redelivered: false,
        }
    }

    pub fn redelivery(&self) -> Self {
        Self {
            redelivered: true,
            ..self.clone()
        }
    }
}

#[derive(Clone)]
pub struct DropEvent {
    /// Kinds of payload in the transfer, e.g. `Files` or `text/plain`.
    pub transfer_types: Vec<String>,
    pub files: Vec<HostFile>,
    pub buffer: Arc<dyn TextBuffer>,
    pub redelivered: bool,
}

impl DropEvent {
    /// A drop carrying only files.
    pub fn of_files(files: Vec<HostFile>, buffer: Arc<dyn TextBuffer>) -> Self {
        Self {
            transfer_types: vec![FILES_TRANSFER_TYPE.to_owned()],
            files,
            buffer,
            redelivered: false,
        }
    }

    pub fn redelivery(&self) -> Self {
        Self {
            redelivered: true,
            ..self.clone()
        }
    }

    /// Whether files are the transfer's only kind of payload.
    pub fn carries_only_files(&self) -> bool {
        matches!(self.transfer_types.as_slice(), [only] if only == FILES_TRANSFER_TYPE)
    }
}

/// The "upload local image" command, run on the active note.
#[derive(Clone)]
pub struct LocalUploadEvent {
    pub note_path: String,
    pub buffer: Arc<dyn TextBuffer>,
}

#[derive(Clone)]
pub struct CanvasPasteEvent {
    pub files: Vec<HostFile>,
    pub canvas: Arc<dyn CanvasSurface>,
    pub redelivered: bool,
}

impl CanvasPasteEvent {
    pub fn new(files: Vec<HostFile>, canvas: Arc<dyn CanvasSurface>) -> Self {
        Self {
            files,
            canvas,
            redelivered: false,
        }
    }

    pub fn redelivery(&self) -> Self {
        Self {
            redelivered: true,
            ..self.clone()
        }
    }
}

#[derive(Clone)]
pub enum HostEvent {
    EditorPaste(PasteEvent),
    EditorDrop(DropEvent),
    UploadLocal(LocalUploadEvent),
    CanvasPaste(CanvasPasteEvent),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    EditorPaste,
    EditorDrop,
    UploadLocal,
    CanvasPaste,
}

impl HostEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::EditorPaste(_) => EventKind::EditorPaste,
            Self::EditorDrop(_) => EventKind::EditorDrop,
            Self::UploadLocal(_) => EventKind::UploadLocal,
            Self::CanvasPaste(_) => EventKind::CanvasPaste,
        }
    }
}

/// Whether a handler took the event over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// The host should run its own handling.
    Ignored,
    Consumed,
}

#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: HostEvent) -> Disposition;
}

/// Handle returned by [`EventBus::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

/// Routes host events to registered handlers.
#[derive(Default)]
pub struct EventBus {
    handlers: Vec<(HandlerId, EventKind, Arc<dyn EventHandler>)>,
    next_id: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, kind: EventKind, handler: Arc<dyn EventHandler>) -> HandlerId {
        let id = HandlerId(self.next_id);
        self.next_id += 1;
        self.handlers.push((id, kind, handler));
        id
    }

    pub fn unregister(&mut self, id: HandlerId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(handler_id, _, _)| *handler_id != id);
        self.handlers.len() != before
    }

    /// Offers `event` to each handler of its kind, in registration order,
    /// until one consumes it.
    pub async fn dispatch(&self, event: HostEvent) -> Disposition {
        let kind = event.kind();
        for (id, _, handler) in self.handlers.iter().filter(|(_, k, _)| *k == kind) {
            if handler.handle(event.clone()).await == Disposition::Consumed {
                log::trace!(
                    target: "imgdrop_business::events",
                    "consumed kind={kind:?} handler={id:?}"
                );
                return Disposition::Consumed;
            }
        }
        Disposition::Ignored
    }
}
