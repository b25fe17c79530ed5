use imgdrop_input::all_files_are_images;
use imgdrop_storage::BlobStore;

use super::Orchestrator;
use crate::events::{Disposition, PasteEvent};
use crate::gate::{self, GateOutcome};

impl<S: BlobStore> Orchestrator<S> {
    /// Editor paste: uploads pasted images in place of the host's paste.
    pub async fn on_paste(&self, event: PasteEvent) -> Disposition {
        if event.redelivered || !all_files_are_images(&event.files) {
            return Disposition::Ignored;
        }
        let Some(coordinator) = self.configured_coordinator() else {
            return Disposition::Consumed;
        };

        match gate::pass(&self.settings, self.host.upload_prompt.as_ref()).await {
            GateOutcome::Upload => {}
            GateOutcome::FallBackToDefault => {
                self.host.default_handler.handle_paste(event.redelivery()).await;
                return Disposition::Consumed;
            }
            GateOutcome::Abandon => return Disposition::Consumed,
        }

        log::debug!(
            target: "imgdrop_business::orchestrator",
            "paste_upload files={}",
            event.files.len()
        );
        self.upload_batch(&coordinator, event.files, event.buffer.as_ref())
            .await;
        Disposition::Consumed
    }
}
