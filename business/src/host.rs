//! Host UI collaborators.

use async_trait::async_trait;

use crate::events::{CanvasPasteEvent, DropEvent, PasteEvent};
use crate::references::RewriteStats;

pub trait Notifier: Send + Sync {
    /// Transient notice.
    fn notice(&self, message: &str);

    fn error_dialog(&self, title: &str, body: &str);
}

/// Asks whether to rewrite the other references to an uploaded resource.
#[async_trait]
pub trait RewritePrompt: Send + Sync {
    async fn confirm_rewrite(&self, resource: &str, stats: RewriteStats) -> bool;
}

/// The host's own handling of events the engine hands back.
#[async_trait]
pub trait DefaultHandler: Send + Sync {
    async fn handle_paste(&self, event: PasteEvent);

    async fn handle_drop(&self, event: DropEvent);

    async fn handle_canvas_paste(&self, event: CanvasPasteEvent);
}

pub trait CanvasSurface: Send + Sync {
    fn create_text_node_at_center(&self, text: &str);
}

/// Blocking modal shown while a canvas upload runs. The user may close it.
pub trait ProgressIndicator: Send + Sync {
    fn open(&self);

    fn close(&self);

    fn is_open(&self) -> bool;
}
