use imgdrop_input::all_files_are_images;
use imgdrop_storage::BlobStore;

use super::Orchestrator;
use crate::coordinator::{UploadOutcome, UploadRequest};
use crate::events::{CanvasPasteEvent, Disposition};
use crate::gate::{self, GateOutcome};
use crate::placeholder::embed_markup;

impl<S: BlobStore> Orchestrator<S> {
    /// Canvas paste: a single image becomes a text node embedding its URL.
    pub async fn on_canvas_paste(&self, event: CanvasPasteEvent) -> Disposition {
        if event.redelivered || event.files.len() != 1 || !all_files_are_images(&event.files) {
            return Disposition::Ignored;
        }
        let Some(coordinator) = self.configured_coordinator() else {
            return Disposition::Consumed;
        };

        match gate::pass(&self.settings, self.host.upload_prompt.as_ref()).await {
            GateOutcome::Upload => {}
            GateOutcome::FallBackToDefault => {
                self.host
                    .default_handler
                    .handle_canvas_paste(event.redelivery())
                    .await;
                return Disposition::Consumed;
            }
            GateOutcome::Abandon => return Disposition::Consumed,
        }

        let Some(file) = event.files.first().cloned() else {
            return Disposition::Ignored;
        };
        let progress = self.host.progress.as_ref();
        progress.open();

        match coordinator.upload_detached(UploadRequest::from_file(file)).await {
            UploadOutcome::Uploaded { url } => {
                if progress.is_open() {
                    progress.close();
                    event.canvas.create_text_node_at_center(&embed_markup(&url));
                } else {
                    log::debug!(
                        target: "imgdrop_business::orchestrator",
                        "canvas_upload_dismissed url={url}"
                    );
                }
            }
            UploadOutcome::Failed(failure) => {
                progress.close();
                log::warn!(
                    target: "imgdrop_business::orchestrator",
                    "canvas_upload_failed error={failure}"
                );
                self.host
                    .default_handler
                    .handle_canvas_paste(event.redelivery())
                    .await;
            }
            UploadOutcome::DedupSkipped => progress.close(),
        }
        Disposition::Consumed
    }
}
